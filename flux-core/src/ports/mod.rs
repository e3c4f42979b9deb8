//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod sheet_store;

pub use sheet_store::{CellMap, RowView, SheetData, SheetStore};
