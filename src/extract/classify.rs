use crate::source::cell::SourceRow;

/// Country identity carried by a source row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowIdentity {
    /// Trimmed country name.
    pub name: String,
    /// Whether the name came from the reference-group column.
    pub reference_member: bool,
}

/// Decide whether `row` names a country and which population it belongs to.
///
/// Column 0 holds reference-group members and column 1 everyone else; column 0 wins when both
/// are populated. Rows with neither are not country records and yield `None`.
pub fn classify_row(row: &SourceRow) -> Option<RowIdentity> {
    if let Some(name) = row.cell(0).trimmed_text() {
        return Some(RowIdentity {
            name: name.to_string(),
            reference_member: true,
        });
    }
    row.cell(1).trimmed_text().map(|name| RowIdentity {
        name: name.to_string(),
        reference_member: false,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/extract/classify.rs"]
mod tests;
