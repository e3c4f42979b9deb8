//! CLI command implementations

pub mod generate;
pub mod init;
pub mod serve;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flux_core::FluxContext;

/// Data directory from the flag / FLUX_DIR, or the current directory
pub fn get_data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| PathBuf::from("."))
}

/// Open the configured store and build the service context
pub fn get_context(data_dir: &Path) -> Result<FluxContext> {
    FluxContext::new(data_dir).context("Failed to initialize Flux context")
}
