//! CLI command handlers, one file per command.

mod config_path;
mod create_session;
mod probe;
mod upload;

pub use config_path::run_config_path;
pub use create_session::run_create_session;
pub use probe::run_probe;
pub use upload::{run_upload, UploadArgs};
