//! Configuration: environment variables, target environments and credentials

pub mod environment;
pub mod settings;
pub mod vars;

pub use environment::{resolve_credentials, CredentialField, CredentialTriple, TargetEnvironment};
pub use settings::{
    parse_items_in_scope, repo_root, DeployConfig, Endpoints, ListItemsConfig, PreflightConfig,
    DEFAULT_ITEM_TYPES, DEFAULT_REPO_DIR,
};
pub use vars::{load_dotenv, parse_bool, Layered, ProcessEnv, VarSource};
