use clap::Args;
use fabric_deploy::config::{Layered, ProcessEnv};

#[derive(Args)]
pub struct ListItemsArgs {
    /// Fabric workspace GUID to list [env: TARGET_WORKSPACE_ID]
    #[arg(long)]
    pub workspace_id: Option<String>,
}

impl ListItemsArgs {
    pub fn vars(self) -> Layered<ProcessEnv> {
        Layered::new(ProcessEnv).with("TARGET_WORKSPACE_ID", self.workspace_id)
    }
}
