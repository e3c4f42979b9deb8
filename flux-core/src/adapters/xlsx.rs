//! Local Excel workbook store
//!
//! The whole workbook is rewritten on every save: read every sheet, swap in
//! the new one, write to a temp file next to the workbook and rename it into
//! place. A sidecar `.lock` file serializes readers and writers across
//! processes.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use calamine::{open_workbook, Data, Reader, Xlsx};
use fs2::FileExt;
use rust_xlsxwriter::Workbook;

use crate::domain::format;
use crate::domain::result::{Error, Result};
use crate::domain::SheetName;
use crate::ports::{SheetData, SheetStore};

/// Columns always written as text, even when they look numeric
const TEXT_COLUMNS: &[&str] = &[
    "AccountNumber",
    "Password",
    "Phone",
    "Username",
    "DocumentNumber",
    "IFSC",
];

/// Workbook file on local disk
#[derive(Debug)]
pub struct XlsxStore {
    path: PathBuf,
    lock_path: PathBuf,
}

/// Holds an advisory lock until dropped
struct LockGuard(File);

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}

impl XlsxStore {
    /// Open an existing workbook
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::config(format!(
                "Database file {} not found. Run `flux init` first.",
                path.display()
            )));
        }
        Ok(Self::at(path))
    }

    /// Create a fresh workbook holding every sheet with its header row
    ///
    /// Refuses to overwrite an existing file unless `overwrite` is set.
    pub fn create(path: &Path, overwrite: bool) -> Result<Self> {
        if path.exists() && !overwrite {
            return Err(Error::config(format!(
                "Database file {} already exists",
                path.display()
            )));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let store = Self::at(path);
        let sheets: Vec<(String, Vec<Vec<String>>)> = SheetName::ALL
            .iter()
            .map(|sheet| {
                let header = sheet.columns().iter().map(|c| c.to_string()).collect();
                (sheet.as_str().to_string(), vec![header])
            })
            .collect();

        let _lock = store.lock(true)?;
        store.write_all(&sheets)?;
        log::info!("Created workbook {}", path.display());
        Ok(store)
    }

    fn at(path: &Path) -> Self {
        let mut lock_name = path.as_os_str().to_owned();
        lock_name.push(".lock");
        Self {
            path: path.to_path_buf(),
            lock_path: PathBuf::from(lock_name),
        }
    }

    fn lock(&self, exclusive: bool) -> Result<LockGuard> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        if exclusive {
            file.lock_exclusive()?;
        } else {
            file.lock_shared()?;
        }
        Ok(LockGuard(file))
    }

    /// Every sheet in workbook order, as raw text grids
    fn read_all(&self) -> anyhow::Result<Vec<(String, Vec<Vec<String>>)>> {
        let mut workbook: Xlsx<_> = open_workbook(&self.path)
            .with_context(|| format!("Failed to open workbook {}", self.path.display()))?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&name)
                .with_context(|| format!("Failed to read sheet {}", name))?;
            let grid = range
                .rows()
                .map(|row| row.iter().map(cell_to_string).collect())
                .collect();
            sheets.push((name, grid));
        }
        Ok(sheets)
    }

    fn write_all(&self, sheets: &[(String, Vec<Vec<String>>)]) -> anyhow::Result<()> {
        let mut workbook = Workbook::new();

        for (name, grid) in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(name.as_str())?;

            let header: &[String] = grid.first().map(Vec::as_slice).unwrap_or(&[]);
            for (r, row) in grid.iter().enumerate() {
                for (c, value) in row.iter().enumerate() {
                    if value.is_empty() {
                        continue;
                    }
                    let (r, c) = (r as u32, c as u16);
                    let text_column = header
                        .get(c as usize)
                        .is_some_and(|h| TEXT_COLUMNS.contains(&h.as_str()));
                    match numeric_value(value) {
                        Some(n) if r > 0 && !text_column => {
                            worksheet.write_number(r, c, n)?;
                        }
                        _ => {
                            worksheet.write_string(r, c, value.as_str())?;
                        }
                    }
                }
            }
        }

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let tmp = tempfile::NamedTempFile::new_in(dir)
            .context("Failed to create temporary workbook")?;
        workbook
            .save(tmp.path())
            .context("Failed to write workbook")?;
        tmp.persist(&self.path)
            .map_err(|e| anyhow!("Failed to replace {}: {}", self.path.display(), e))?;
        Ok(())
    }
}

impl SheetStore for XlsxStore {
    fn backend(&self) -> &str {
        "xlsx"
    }

    fn load(&self, sheet: SheetName) -> Result<SheetData> {
        let _lock = self.lock(false)?;
        let grid = self
            .read_all()?
            .into_iter()
            .find(|(name, _)| name == sheet.as_str())
            .map(|(_, grid)| grid);
        Ok(grid.map(SheetData::from_grid).unwrap_or_default())
    }

    fn save(&self, sheet: SheetName, data: &SheetData) -> Result<()> {
        let _lock = self.lock(true)?;
        let mut sheets = self.read_all()?;
        let grid = data.to_grid();

        match sheets.iter_mut().find(|(name, _)| name == sheet.as_str()) {
            Some((_, existing)) => *existing = grid,
            None => sheets.push((sheet.as_str().to_string(), grid)),
        }

        self.write_all(&sheets)
            .with_context(|| format!("Failed to save sheet {}", sheet))?;
        log::debug!("Saved {} rows to {}", data.len(), sheet);
        Ok(())
    }
}

/// Render a cell as text; integral floats lose their ".0"
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|ts| format::format_timestamp(&ts))
            .unwrap_or_else(|| format_float(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// Numbers are written as numbers only when reading the cell back yields
/// the same text; anything else stays a string
fn numeric_value(s: &str) -> Option<f64> {
    let digits = s.trim_start_matches('-');
    if digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.") {
        return None;
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && f.abs() < 1e15)
        .filter(|f| format_float(*f) == s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::CellMap;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tempfile::tempdir;

    #[test]
    fn test_open_missing_workbook_is_config_error() {
        let dir = tempdir().unwrap();
        let err = XlsxStore::open(&dir.path().join("missing.xlsx")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("flux init"));
    }

    #[test]
    fn test_create_writes_headers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flux.xlsx");
        let store = XlsxStore::create(&path, false).unwrap();

        for sheet in SheetName::ALL {
            let data = store.load(sheet).unwrap();
            assert_eq!(data.columns(), sheet.columns());
            assert!(data.is_empty());
        }
        assert!(XlsxStore::create(&path, false).is_err());
    }

    #[test]
    fn test_save_preserves_other_sheets_and_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flux.xlsx");
        let store = XlsxStore::create(&path, false).unwrap();

        let mut users = store.load(SheetName::Users).unwrap();
        let mut cells = CellMap::new();
        cells.insert("AccountID".into(), "AC1001".into());
        cells.insert("AccountNumber".into(), "01234567890".into());
        cells.insert("AccountBalance".into(), "1500.5".into());
        cells.insert("Phone".into(), "5550100".into());
        users.push_row(&cells, "");
        store.save(SheetName::Users, &users).unwrap();

        let reopened = XlsxStore::open(&path).unwrap();
        let users = reopened.load(SheetName::Users).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users.row(0).text("AccountNumber"), "01234567890");
        assert_eq!(users.row(0).text("AccountBalance"), "1500.5");
        assert_eq!(users.row(0).text("Phone"), "5550100");

        let kyc = reopened.load(SheetName::KycRequests).unwrap();
        assert_eq!(kyc.columns(), SheetName::KycRequests.columns());
    }

    #[test]
    fn test_float_cells_render_without_fraction() {
        assert_eq!(cell_to_string(&Data::Float(12345678901.0)), "12345678901");
        assert_eq!(cell_to_string(&Data::Float(10.25)), "10.25");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn test_numeric_value_keeps_leading_zeros_as_text() {
        assert_eq!(numeric_value("42"), Some(42.0));
        assert_eq!(numeric_value("0.5"), Some(0.5));
        assert_eq!(numeric_value("007"), None);
        assert_eq!(numeric_value("AC1001"), None);
    }

    #[test]
    fn test_numeric_value_keeps_lossy_numbers_as_text() {
        assert_eq!(numeric_value("1500.5"), Some(1500.5));
        assert_eq!(numeric_value("-40"), Some(-40.0));
        assert_eq!(numeric_value("0.6666666666666666667"), None);
        assert_eq!(numeric_value("12345678901234.56789"), None);
        assert_eq!(numeric_value("85.0"), None);
    }

    #[test]
    fn test_reopened_balances_keep_full_precision() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flux.xlsx");
        let store = XlsxStore::create(&path, false).unwrap();

        let third = Decimal::from_str("0.3333333333333333333").unwrap();
        let mut users = store.load(SheetName::Users).unwrap();
        for (id, balance) in [("AC1001", Decimal::ONE - third), ("AC1002", third)] {
            let mut cells = CellMap::new();
            cells.insert("AccountID".into(), id.into());
            cells.insert("AccountBalance".into(), format::format_decimal(balance));
            users.push_row(&cells, "");
        }
        store.save(SheetName::Users, &users).unwrap();

        let users = XlsxStore::open(&path).unwrap().load(SheetName::Users).unwrap();
        let total: Decimal = users
            .rows()
            .filter_map(|row| format::parse_decimal(row.text("AccountBalance")))
            .sum();
        assert_eq!(users.row(0).text("AccountBalance"), "0.6666666666666666667");
        assert_eq!(total, Decimal::ONE);
    }
}
