use super::args::*;
use crate::exit_codes::SUCCESS;

pub mod extract;
pub mod init;
pub(crate) mod run;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => run::run(args).await,
        Command::Init(args) => init::run(&args),
        Command::Extract(args) => extract::run(&args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}
