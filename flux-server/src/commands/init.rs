//! Init command - create the local workbook and settings

use std::path::Path;

use anyhow::{Context, Result};
use flux_core::adapters::xlsx::XlsxStore;
use flux_core::config::{Config, SETTINGS_FILE};

use crate::output;

pub fn run(data_dir: &Path, force: bool) -> Result<()> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

    let config = Config::load(data_dir)?;
    let existed = config.db_file.exists();
    if existed && !force {
        output::warning(&format!(
            "{} already exists. Use --force to replace it.",
            config.db_file.display()
        ));
        return Ok(());
    }

    XlsxStore::create(&config.db_file, force)?;
    if !data_dir.join(SETTINGS_FILE).exists() {
        config.save()?;
    }

    if existed {
        output::success(&format!("Reset workbook {}", config.db_file.display()));
    } else {
        output::success(&format!("Created workbook {}", config.db_file.display()));
    }
    if config.google_sheet_id.is_some() {
        output::info("A Google Sheet is configured and will be preferred when reachable");
    }
    Ok(())
}
