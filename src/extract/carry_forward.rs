use serde::Serialize;

use crate::extract::aggregate::aggregate_year;
use crate::extract::classify::{RowIdentity, classify_row};
use crate::foundation::config::PipelineConfig;
use crate::model::{CountryRecord, Dataset};
use crate::source::cell::SourceRow;
use crate::taxonomy::{Category, Taxonomy};

/// Counters gathered while building a [`Dataset`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExtractStats {
    /// Rows past the header block.
    pub rows_seen: usize,
    /// Rows without a country identity.
    pub rows_skipped: usize,
    /// Countries in the final dataset.
    pub countries: usize,
    /// Countries flagged as reference-group members.
    pub reference_members: usize,
    /// Year records computed from source cells.
    pub years_computed: usize,
    /// Year records copied from the preceding year.
    pub years_carried: usize,
    /// Rows whose country name replaced an earlier row.
    pub duplicate_names: usize,
}

/// Build the year series for one classified row.
///
/// Years are visited in increasing order. A year whose primary indicator (the `total_revenue`
/// offset-0 cell) is populated is aggregated from the row. Once any year has been aggregated, a year
/// whose primary indicator is absent or exactly zero copies the preceding year's record. Years
/// before the first populated one get no record.
pub fn extract_country(
    row: &SourceRow,
    identity: RowIdentity,
    cfg: &PipelineConfig,
    stats: &mut ExtractStats,
) -> CountryRecord {
    let mut country = CountryRecord::new(identity.name, identity.reference_member);
    let primary = primary_offset(&cfg.taxonomy);
    let mut has_data = false;

    for year in cfg.years() {
        let start = cfg.window_start(year);
        // Text placeholders such as ".." have no numeric value and count as unpopulated.
        let populated = row
            .cell(start + primary)
            .number()
            .is_some_and(|v| v != 0.0);

        if !populated {
            if has_data && let Some(prev) = country.years.get(&(year - 1)).copied() {
                country.years.insert(year, prev);
                stats.years_carried += 1;
            }
            continue;
        }

        has_data = true;
        country
            .years
            .insert(year, aggregate_year(row, start, &cfg.taxonomy));
        stats.years_computed += 1;
    }

    country
}

/// Classify and extract every data row (rows before `header_rows` are skipped).
#[tracing::instrument(skip_all, fields(rows = rows.len()))]
pub fn extract_dataset(rows: &[SourceRow], cfg: &PipelineConfig) -> (Dataset, ExtractStats) {
    let mut stats = ExtractStats::default();
    let mut dataset = Dataset::new();
    let required = cfg.required_row_width();

    for row in rows.iter().skip(cfg.header_rows) {
        stats.rows_seen += 1;
        let Some(identity) = classify_row(row) else {
            stats.rows_skipped += 1;
            continue;
        };
        if row.width() < required {
            tracing::debug!(
                row = row.index,
                width = row.width(),
                required,
                "short row; trailing cells read as empty"
            );
        }

        let country = extract_country(row, identity, cfg, &mut stats);
        tracing::debug!(
            row = row.index,
            country = %country.name,
            reference_member = country.reference_member,
            years = country.years.len(),
            "extracted country"
        );
        if let Some(prev) = dataset.insert(country) {
            stats.duplicate_names += 1;
            tracing::warn!(country = %prev.name, "duplicate country row replaces earlier one");
        }
    }

    stats.countries = dataset.len();
    stats.reference_members = dataset.countries().filter(|c| c.reference_member).count();
    tracing::info!(
        countries = stats.countries,
        reference_members = stats.reference_members,
        computed = stats.years_computed,
        carried = stats.years_carried,
        skipped = stats.rows_skipped,
        "extraction complete"
    );
    (dataset, stats)
}

fn primary_offset(taxonomy: &Taxonomy) -> usize {
    // First total_revenue column; offset 0 with the default table.
    taxonomy
        .spec(Category::TotalRevenue)
        .and_then(|s| s.offsets.first())
        .map(|o| o.unsigned_abs() as usize)
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "../../tests/unit/extract/carry_forward.rs"]
mod tests;
