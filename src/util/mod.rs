//! Shared utilities

pub mod config;
pub mod context;
pub mod errors;
pub mod fs;
pub mod process;
pub mod shell;

pub use config::Config;
pub use context::ContribsContext;
pub use errors::{ConfigurationError, ContribsError};
pub use shell::Shell;
