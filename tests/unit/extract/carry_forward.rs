use super::*;
use crate::model::Year;
use crate::source::cell::Cell;

fn cfg() -> PipelineConfig {
    PipelineConfig {
        start_year: 2000,
        end_year: 2004,
        ..PipelineConfig::default()
    }
}

/// Row builder addressing cells by `(year, relative column)`.
struct RowBuilder {
    cells: Vec<Cell>,
}

impl RowBuilder {
    fn member(name: &str) -> Self {
        let mut cells = vec![Cell::Empty; cfg().required_row_width()];
        cells[0] = Cell::from(name);
        Self { cells }
    }

    fn non_member(name: &str) -> Self {
        let mut cells = vec![Cell::Empty; cfg().required_row_width()];
        cells[1] = Cell::from(name);
        Self { cells }
    }

    fn set(mut self, year: Year, column: usize, cell: Cell) -> Self {
        let idx = cfg().window_start(year) + column;
        self.cells[idx] = cell;
        self
    }

    /// Populate a year with a total and an income tax figure.
    fn year(self, year: Year, total: f64, income: f64) -> Self {
        self.set(year, 0, Cell::Number(total))
            .set(year, 2, Cell::Number(income))
    }

    fn build(self, index: usize) -> SourceRow {
        SourceRow::new(index, self.cells)
    }
}

fn identity(row: &SourceRow) -> RowIdentity {
    classify_row(row).unwrap()
}

#[test]
fn populated_years_are_aggregated() {
    let row = RowBuilder::member("Austria")
        .year(2000, 40.0, 9.0)
        .year(2001, 41.0, 9.5)
        .build(11);
    let mut stats = ExtractStats::default();
    let c = extract_country(&row, identity(&row), &cfg(), &mut stats);

    assert_eq!(c.value(2000, Category::TotalRevenue), Some(40.0));
    assert_eq!(c.value(2001, Category::IncomeTax), Some(9.5));
    assert_eq!(stats.years_computed, 2);
}

#[test]
fn carry_forward_chains_across_missing_years() {
    let row = RowBuilder::member("Belgium")
        .year(2000, 44.0, 12.0)
        .year(2001, 45.0, 12.5)
        .set(2002, 0, Cell::Number(0.0))
        .set(2002, 2, Cell::Number(99.0))
        .set(2003, 0, Cell::Text(String::new()))
        .build(11);
    let mut stats = ExtractStats::default();
    let c = extract_country(&row, identity(&row), &cfg(), &mut stats);

    let y2001 = *c.year(2001).unwrap();
    assert_eq!(c.year(2002), Some(&y2001));
    assert_eq!(c.year(2003), Some(&y2001));
    assert_eq!(c.year(2004), Some(&y2001));
    assert_eq!(stats.years_computed, 2);
    assert_eq!(stats.years_carried, 3);
}

#[test]
fn placeholder_text_total_is_carried_over() {
    let row = RowBuilder::member("Chile")
        .year(2000, 20.0, 1.5)
        .set(2001, 0, Cell::from(".."))
        .set(2001, 2, Cell::Number(7.0))
        .set(2002, 0, Cell::from("NaN"))
        .year(2003, 21.0, 1.75)
        .build(11);
    let mut stats = ExtractStats::default();
    let c = extract_country(&row, identity(&row), &cfg(), &mut stats);

    assert_eq!(c.year(2001), c.year(2000));
    assert_eq!(c.year(2002), c.year(2000));
    assert_eq!(c.value(2003, Category::IncomeTax), Some(1.75));
}

#[test]
fn carried_record_is_replaced_once_data_resumes() {
    let row = RowBuilder::member("Canada")
        .year(2000, 33.0, 11.0)
        .year(2002, 34.0, 12.0)
        .build(11);
    let mut stats = ExtractStats::default();
    let c = extract_country(&row, identity(&row), &cfg(), &mut stats);

    assert_eq!(c.year(2001), c.year(2000));
    assert_eq!(c.value(2002, Category::IncomeTax), Some(12.0));
    assert_eq!(c.year(2003), c.year(2002));
}

#[test]
fn no_retroactive_fill_before_first_populated_year() {
    let row = RowBuilder::non_member("Brazil")
        .set(2000, 0, Cell::Number(0.0))
        .year(2002, 32.0, 2.5)
        .build(12);
    let mut stats = ExtractStats::default();
    let c = extract_country(&row, identity(&row), &cfg(), &mut stats);

    assert!(!c.reference_member);
    assert!(c.year(2000).is_none());
    assert!(c.year(2001).is_none());
    assert_eq!(c.years.keys().copied().collect::<Vec<_>>(), vec![2002, 2003, 2004]);
}

#[test]
fn country_without_any_data_has_no_years() {
    let row = RowBuilder::non_member("Nowhere").build(13);
    let mut stats = ExtractStats::default();
    let c = extract_country(&row, identity(&row), &cfg(), &mut stats);
    assert!(c.years.is_empty());
}

#[test]
fn extract_dataset_skips_headers_and_blank_rows() {
    let mut rows: Vec<SourceRow> = (0..11)
        .map(|i| SourceRow::new(i, vec![Cell::from("header"), Cell::from("header")]))
        .collect();
    rows.push(RowBuilder::member("Austria").year(2000, 40.0, 9.0).build(11));
    rows.push(SourceRow::new(12, vec![Cell::Empty, Cell::from("  ")]));
    rows.push(RowBuilder::non_member("Argentina").year(2001, 29.0, 2.0).build(13));

    let (ds, stats) = extract_dataset(&rows, &cfg());
    assert_eq!(ds.len(), 2);
    assert!(ds.get("header").is_none());
    assert!(ds.get("Austria").unwrap().reference_member);
    assert!(!ds.get("Argentina").unwrap().reference_member);
    assert_eq!(stats.rows_seen, 3);
    assert_eq!(stats.rows_skipped, 1);
    assert_eq!(stats.countries, 2);
    assert_eq!(stats.reference_members, 1);
}

#[test]
fn duplicate_country_rows_keep_the_last() {
    let mut rows: Vec<SourceRow> = (0..11).map(|i| SourceRow::new(i, Vec::new())).collect();
    rows.push(RowBuilder::member("Chile").year(2000, 20.0, 1.0).build(11));
    rows.push(RowBuilder::non_member(" Chile ").year(2000, 21.0, 1.5).build(12));

    let (ds, stats) = extract_dataset(&rows, &cfg());
    assert_eq!(ds.len(), 1);
    let chile = ds.get("Chile").unwrap();
    assert!(!chile.reference_member);
    assert_eq!(chile.value(2000, Category::TotalRevenue), Some(21.0));
    assert_eq!(stats.duplicate_names, 1);
}

#[test]
fn short_rows_extract_available_years() {
    let cfg = cfg();
    let mut cells = vec![Cell::Empty; cfg.window_start(2001) + 1];
    cells[0] = Cell::from("Denmark");
    cells[cfg.window_start(2000)] = Cell::Number(46.0);
    cells[cfg.window_start(2001)] = Cell::Number(47.0);
    let mut rows: Vec<SourceRow> = (0..11).map(|i| SourceRow::new(i, Vec::new())).collect();
    rows.push(SourceRow::new(11, cells));

    let (ds, _) = extract_dataset(&rows, &cfg);
    let dk = ds.get("Denmark").unwrap();
    assert_eq!(dk.value(2001, Category::TotalRevenue), Some(47.0));
    assert_eq!(dk.value(2001, Category::Vat), Some(0.0));
    assert_eq!(dk.year(2004), dk.year(2001));
}
