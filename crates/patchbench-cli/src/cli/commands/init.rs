use crate::cli::args::InitArgs;
use crate::exit_codes;
use patchbench_core::config::write_sample_config;

pub fn run(args: &InitArgs) -> anyhow::Result<i32> {
    if args.config.exists() && !args.force {
        eprintln!(
            "{} already exists; pass --force to overwrite",
            args.config.display()
        );
        return Ok(exit_codes::CONFIG_ERROR);
    }
    write_sample_config(&args.config)?;
    println!("Created {}", args.config.display());
    println!("Set the API key named in provider.api_key_env, then run `patchbench run`.");
    Ok(exit_codes::SUCCESS)
}
