use clap::Args;
use fabric_deploy::config::{Layered, ProcessEnv};

#[derive(Args)]
pub struct ValidateArgs {
    /// Repository root to validate [env: REPO_ROOT, default: .]
    #[arg(long)]
    pub repo_root: Option<String>,
}

impl ValidateArgs {
    pub fn vars(self) -> Layered<ProcessEnv> {
        Layered::new(ProcessEnv).with("REPO_ROOT", self.repo_root)
    }
}
