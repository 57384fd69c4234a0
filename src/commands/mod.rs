//! Command handlers. Each returns the process exit code.

pub mod deploy;
pub mod list_items;
pub mod preflight;
pub mod validate;

pub use deploy::deploy_command;
pub use list_items::list_items_command;
pub use preflight::preflight_command;
pub use validate::validate_command;
