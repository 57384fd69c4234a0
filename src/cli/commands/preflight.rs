use clap::Args;
use fabric_deploy::config::{Layered, ProcessEnv};

#[derive(Args)]
pub struct PreflightArgs {
    /// Target Fabric workspace GUID [env: TARGET_WORKSPACE_ID]
    #[arg(long)]
    pub workspace_id: Option<String>,
    /// DEV, QA or PROD [env: TARGET_ENVIRONMENT]
    #[arg(short, long)]
    pub environment: Option<String>,
}

impl PreflightArgs {
    pub fn vars(self) -> Layered<ProcessEnv> {
        Layered::new(ProcessEnv)
            .with("TARGET_WORKSPACE_ID", self.workspace_id)
            .with("TARGET_ENVIRONMENT", self.environment)
    }
}
