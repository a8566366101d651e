use crate::cli::args::ExtractArgs;
use crate::exit_codes;
use anyhow::Context;
use patchbench_core::extract::extract_code;
use std::io::Read;

pub fn run(args: &ExtractArgs) -> anyhow::Result<i32> {
    let raw = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    print!("{}", extract_code(&raw));
    Ok(exit_codes::SUCCESS)
}
