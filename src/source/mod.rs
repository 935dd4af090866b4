//! Tabular source access: cell values, rows, and the workbook reader.

/// Cell values and rows.
pub mod cell;
/// `calamine`-backed workbook reader.
pub mod workbook;
