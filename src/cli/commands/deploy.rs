use clap::Args;
use fabric_deploy::config::{Layered, ProcessEnv};

#[derive(Args)]
pub struct DeployArgs {
    /// Target Fabric workspace GUID [env: TARGET_WORKSPACE_ID]
    #[arg(long)]
    pub workspace_id: Option<String>,
    /// DEV, QA or PROD [env: TARGET_ENVIRONMENT]
    #[arg(short, long)]
    pub environment: Option<String>,
    /// Directory holding the item folders [env: REPO_DIR]
    #[arg(long)]
    pub repo_dir: Option<String>,
    /// Comma-separated item types to publish [env: ITEMS_IN_SCOPE]
    #[arg(long)]
    pub items_in_scope: Option<String>,
    /// Remove workspace items missing from the repository [env: CLEAN_ORPHANS]
    #[arg(long)]
    pub clean_orphans: bool,
}

impl DeployArgs {
    pub fn vars(self) -> Layered<ProcessEnv> {
        Layered::new(ProcessEnv)
            .with("TARGET_WORKSPACE_ID", self.workspace_id)
            .with("TARGET_ENVIRONMENT", self.environment)
            .with("REPO_DIR", self.repo_dir)
            .with("ITEMS_IN_SCOPE", self.items_in_scope)
            .with("CLEAN_ORPHANS", self.clean_orphans.then(|| "true".to_string()))
    }
}
