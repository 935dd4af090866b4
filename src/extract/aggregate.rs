use crate::model::YearRecord;
use crate::source::cell::SourceRow;
use crate::taxonomy::{CategorySpec, Taxonomy};

/// Signed sum of one category over the year window beginning at column `start`.
///
/// A non-negative offset adds the cell at `start + offset`; a negative offset subtracts the cell at
/// `start + |offset|`. Cells without content, or without a numeric reading, contribute nothing.
pub fn aggregate_category(row: &SourceRow, start: usize, spec: &CategorySpec) -> f64 {
    let mut total = 0.0;
    for &offset in &spec.offsets {
        let cell = row.cell(start + offset.unsigned_abs() as usize);
        if !cell.has_content() {
            continue;
        }
        let Some(value) = cell.number() else {
            tracing::warn!(
                row = row.index,
                column = start + offset.unsigned_abs() as usize,
                value = %cell,
                "non-numeric cell ignored"
            );
            continue;
        };
        if offset >= 0 {
            total += value;
        } else {
            total -= value;
        }
    }
    total
}

/// Compute every category for the year window beginning at `start`.
pub fn aggregate_year(row: &SourceRow, start: usize, taxonomy: &Taxonomy) -> YearRecord {
    let mut rec = YearRecord::zeroed();
    for spec in taxonomy.specs() {
        rec.set(spec.category, aggregate_category(row, start, spec));
    }
    rec
}

#[cfg(test)]
#[path = "../../tests/unit/extract/aggregate.rs"]
mod tests;
