//! Sheet store port - whole-sheet spreadsheet abstraction

use std::collections::BTreeMap;

use crate::domain::result::Result;
use crate::domain::SheetName;

/// A storage backend holding one tabular sheet per entity type
///
/// Every operation works on a whole sheet: callers load it, mutate it in
/// memory and save it back. Backends never see partial updates.
pub trait SheetStore: Send + Sync {
    /// Backend label (e.g., "xlsx", "google-sheets", "memory")
    fn backend(&self) -> &str;

    /// Read an entire sheet. A sheet that does not exist yields an empty table.
    fn load(&self, sheet: SheetName) -> Result<SheetData>;

    /// Replace an entire sheet, creating it if needed. Other sheets are untouched.
    fn save(&self, sheet: SheetName, data: &SheetData) -> Result<()>;
}

/// In-memory contents of one sheet: a header row plus text cells
///
/// Rows are always kept as wide as the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetData {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl SheetData {
    /// Create an empty sheet with the given header
    pub fn with_columns<S: AsRef<str>>(columns: &[S]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a sheet from a raw grid whose first row is the header
    ///
    /// Trailing empty header cells are dropped, short rows are padded and
    /// completely empty rows are skipped.
    pub fn from_grid(grid: Vec<Vec<String>>) -> Self {
        let mut iter = grid.into_iter();
        let Some(mut header) = iter.next() else {
            return Self::default();
        };
        while header.last().is_some_and(|h| h.trim().is_empty()) {
            header.pop();
        }

        let width = header.len();
        let rows = iter
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        Self {
            columns: header.into_iter().map(|h| h.trim().to_string()).collect(),
            rows,
        }
    }

    /// Header followed by every row, as written to a backend
    pub fn to_grid(&self) -> Vec<Vec<String>> {
        let mut grid = Vec::with_capacity(self.rows.len() + 1);
        grid.push(self.columns.clone());
        grid.extend(self.rows.iter().cloned());
        grid
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Add a column if it is missing, padding existing rows with empty cells
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.columns.len() - 1
    }

    /// Read-only view of one row
    pub fn row(&self, index: usize) -> RowView<'_> {
        RowView { sheet: self, index }
    }

    /// Iterate over all rows in sheet order
    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> + '_ {
        (0..self.rows.len()).map(move |index| RowView { sheet: self, index })
    }

    /// Set one cell, adding the column if necessary
    pub fn set(&mut self, index: usize, column: &str, value: impl Into<String>) {
        let col = self.ensure_column(column);
        self.rows[index][col] = value.into();
    }

    /// Overwrite the given cells of an existing row
    pub fn update_row(&mut self, index: usize, cells: &CellMap) {
        for (column, value) in cells {
            self.set(index, column, value.clone());
        }
    }

    /// Append a row. Columns the row does not mention are set to `fill`;
    /// columns the sheet does not have yet are added.
    pub fn push_row(&mut self, cells: &CellMap, fill: &str) {
        for column in cells.keys() {
            self.ensure_column(column);
        }
        let row = self
            .columns
            .iter()
            .map(|c| cells.get(c).cloned().unwrap_or_else(|| fill.to_string()))
            .collect();
        self.rows.push(row);
    }
}

/// Column name to cell value, as produced by the domain entities
pub type CellMap = BTreeMap<String, String>;

/// Borrowed view of a single sheet row
#[derive(Clone, Copy)]
pub struct RowView<'a> {
    sheet: &'a SheetData,
    index: usize,
}

impl<'a> RowView<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Trimmed cell text, empty when the column is missing
    pub fn text(&self, column: &str) -> &'a str {
        self.sheet
            .column_index(column)
            .map(|c| self.sheet.rows[self.index][c].trim())
            .unwrap_or("")
    }

    /// Cell text, `None` when the column is missing or the cell is blank
    pub fn opt(&self, column: &str) -> Option<&'a str> {
        Some(self.text(column)).filter(|s| !s.is_empty())
    }

    /// Every cell of the row keyed by column name
    pub fn to_cells(&self) -> CellMap {
        self.sheet
            .columns
            .iter()
            .zip(&self.sheet.rows[self.index])
            .map(|(c, v)| (c.clone(), v.clone()))
            .collect()
    }
}
