use clap::Parser;
use log::error;
use std::process::ExitCode;

use fabric_deploy::commands::{deploy_command, list_items_command, preflight_command, validate_command};
use fabric_deploy::config::{load_dotenv, repo_root};
use fabric_deploy::logging::init_logging;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();
    init_logging();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Deploy(args) => deploy_command(&args.vars()).await,
        Commands::Preflight(args) => preflight_command(&args.vars()).await,
        Commands::Validate(args) => validate_command(&repo_root(&args.vars())),
        Commands::ListItems(args) => list_items_command(&args.vars()).await,
    };

    match outcome {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
