//! Command-line arguments. Every flag shadows the environment variable of
//! the same meaning; unset flags fall through to the environment.

mod deploy;
mod list_items;
mod preflight;
mod validate;

pub use deploy::DeployArgs;
pub use list_items::ListItemsArgs;
pub use preflight::PreflightArgs;
pub use validate::ValidateArgs;
