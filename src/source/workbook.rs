use std::path::Path;

use calamine::{Data, Range, Reader};

use crate::foundation::error::{TaxcompError, TaxcompResult};
use crate::source::cell::{Cell, SourceRow};

/// Read every row of one worksheet.
///
/// `sheet` selects a worksheet by name; when `None` the first sheet is used. Rows and columns are
/// addressed from the sheet origin (`A1`), so a sheet whose used range starts further in is padded
/// with empty cells. The workbook handle is released before returning, on success or failure.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn read_workbook(path: &Path, sheet: Option<&str>) -> TaxcompResult<Vec<SourceRow>> {
    if !path.is_file() {
        return Err(TaxcompError::source_unreadable(format!(
            "workbook '{}' not found",
            path.display()
        )));
    }

    let mut wb = calamine::open_workbook_auto(path).map_err(|e| {
        TaxcompError::source_unreadable(format!("open workbook '{}': {e}", path.display()))
    })?;

    let names = wb.sheet_names();
    let sheet_name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.as_str() == wanted)
            .ok_or_else(|| {
                TaxcompError::source_unreadable(format!(
                    "workbook '{}' has no sheet '{wanted}' (sheets: {})",
                    path.display(),
                    names.join(", ")
                ))
            })?,
        None => names.first().ok_or_else(|| {
            TaxcompError::source_unreadable(format!(
                "workbook '{}' has no sheets",
                path.display()
            ))
        })?,
    }
    .clone();

    let range = wb.worksheet_range(&sheet_name).map_err(|e| {
        TaxcompError::source_unreadable(format!("read sheet '{sheet_name}': {e}"))
    })?;

    let (height, width) = range.get_size();
    tracing::info!(sheet = %sheet_name, height, width, "read worksheet");
    Ok(rows_from_range(&range))
}

/// Convert a calamine range into origin-addressed rows.
pub fn rows_from_range(range: &Range<Data>) -> Vec<SourceRow> {
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut out: Vec<SourceRow> = (0..row_offset)
        .map(|index| SourceRow::new(index, Vec::new()))
        .collect();

    for (i, row) in range.rows().enumerate() {
        let mut cells = Vec::with_capacity(col_offset + row.len());
        cells.resize(col_offset, Cell::Empty);
        cells.extend(row.iter().map(cell_from_data));
        out.push(SourceRow::new(row_offset + i, cells));
    }
    out
}

fn cell_from_data(d: &Data) -> Cell {
    match d {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Bool(*b),
        // Dates, durations and error values (`#N/A`) never carry revenue data.
        _ => Cell::Empty,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/workbook.rs"]
mod tests;
