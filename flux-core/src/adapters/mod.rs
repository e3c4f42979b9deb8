//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Excel workbook on local disk (calamine + rust_xlsxwriter)
//! - Google Sheets over its REST API
//! - In-memory sheets for tests and throwaway servers
//!
//! `SheetRepository` sits on top of any of them and provides typed,
//! serialized read-modify-write operations.

pub mod google_sheets;
pub mod memory;
pub mod repository;
pub mod xlsx;

use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::ports::SheetStore;
use google_sheets::{GoogleSheetsStore, ServiceAccountKey};
use xlsx::XlsxStore;

/// Pick the storage backend for `config`
///
/// The Google Sheet is used when it is configured and reachable; otherwise
/// the local workbook, which must already exist.
pub fn open_store(config: &Config) -> Result<Arc<dyn SheetStore>> {
    if config.has_cloud_credentials() {
        match connect_cloud(config) {
            Ok(store) => return Ok(Arc::new(store)),
            Err(e) => {
                log::warn!("Google Sheets unavailable ({:#}); falling back to local workbook", e);
            }
        }
    }

    let store = XlsxStore::open(&config.db_file)?;
    log::info!("Using local workbook {}", config.db_file.display());
    Ok(Arc::new(store))
}

fn connect_cloud(config: &Config) -> Result<GoogleSheetsStore> {
    let sheet_id = config
        .google_sheet_id
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("No Google Sheet ID configured"))?;
    let key = match &config.google_credentials_json {
        Some(json) => ServiceAccountKey::from_json(json)?,
        None => ServiceAccountKey::from_file(&config.credentials_file)?,
    };
    GoogleSheetsStore::connect(sheet_id, key, &config.spreadsheet_title)
}
