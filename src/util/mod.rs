//! Shared utilities

pub mod config;
pub mod fs;
pub mod process;
pub mod shell;
pub mod template;

pub use config::{ProjectConfig, RunConfig};
pub use shell::Shell;
