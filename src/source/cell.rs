use std::fmt;

/// One source cell value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Cell {
    /// No value.
    #[default]
    Empty,
    /// Numeric value (integers widen to `f64`).
    Number(f64),
    /// Text value, untrimmed.
    Text(String),
    /// Boolean value.
    Bool(bool),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    /// Whether the cell carries any value. Only empty cells and empty strings lack content.
    pub fn has_content(&self) -> bool {
        match self {
            Self::Empty => false,
            Self::Text(s) => !s.is_empty(),
            Self::Number(_) | Self::Bool(_) => true,
        }
    }

    /// Numeric reading of the cell. Text is parsed after trimming; booleans, unparsable text and
    /// non-finite values (`"NaN"`, `"inf"`) have no numeric value.
    pub fn number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            Self::Empty | Self::Bool(_) => None,
        }
        .filter(|v| v.is_finite())
    }

    /// Trimmed text, if this is a text cell with non-whitespace content.
    pub fn trimmed_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.trim()).filter(|t| !t.is_empty()),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// One source row with its position in the sheet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceRow {
    /// Zero-based row index in the sheet.
    pub index: usize,
    /// Cells in column order.
    pub cells: Vec<Cell>,
}

impl SourceRow {
    /// Build a row.
    pub fn new(index: usize, cells: Vec<Cell>) -> Self {
        Self { index, cells }
    }

    /// Cell at `column`; columns past the end of the row read as empty.
    pub fn cell(&self, column: usize) -> &Cell {
        self.cells.get(column).unwrap_or(&EMPTY)
    }

    /// Number of stored cells.
    pub fn width(&self) -> usize {
        self.cells.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/cell.rs"]
mod tests;
