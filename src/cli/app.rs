use super::commands::{DeployArgs, ListItemsArgs, PreflightArgs, ValidateArgs};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fabric-deploy")]
#[command(about = "Deploy, check and validate Microsoft Fabric workspace content")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish repository items to the target workspace
    Deploy(DeployArgs),
    /// Check credentials and workspace access without changing anything
    Preflight(PreflightArgs),
    /// Validate the repository structure before deploying
    Validate(ValidateArgs),
    /// List the items currently in the target workspace
    ListItems(ListItemsArgs),
}
