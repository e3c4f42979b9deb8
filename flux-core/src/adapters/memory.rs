//! In-memory sheet store
//!
//! Keeps every sheet in a map. Used by tests and by `flux serve --memory`
//! for trying the API without a workbook.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::result::{Error, Result};
use crate::domain::SheetName;
use crate::ports::{SheetData, SheetStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    sheets: Mutex<HashMap<SheetName, SheetData>>,
}

impl MemoryStore {
    /// Empty store: every sheet loads as an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with every sheet created and carrying its header row
    pub fn with_schema() -> Self {
        let sheets = SheetName::ALL
            .into_iter()
            .map(|sheet| (sheet, SheetData::with_columns(sheet.columns())))
            .collect();
        Self {
            sheets: Mutex::new(sheets),
        }
    }
}

impl SheetStore for MemoryStore {
    fn backend(&self) -> &str {
        "memory"
    }

    fn load(&self, sheet: SheetName) -> Result<SheetData> {
        let sheets = self
            .sheets
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))?;
        Ok(sheets.get(&sheet).cloned().unwrap_or_default())
    }

    fn save(&self, sheet: SheetName, data: &SheetData) -> Result<()> {
        let mut sheets = self
            .sheets
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))?;
        sheets.insert(sheet, data.clone());
        Ok(())
    }
}
