use crate::foundation::error::{TaxcompError, TaxcompResult};
use crate::model::{CountryRecord, Dataset, Year};

/// Blend each country's `year` record toward `year + 1` by `weight`.
///
/// The result holds, per eligible country, a single record keyed `year` with
/// `value(year) * (1 - weight) + value(year + 1) * weight` for every category, plus the unchanged
/// membership flag. Countries missing either year are left out, so a country whose series ends
/// early disappears from late frames.
pub fn interpolate(dataset: &Dataset, year: Year, weight: f64) -> TaxcompResult<Dataset> {
    if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
        return Err(TaxcompError::validation(format!(
            "interpolation weight must be within [0, 1], got {weight}"
        )));
    }

    let mut out = Dataset::new();
    for country in dataset.countries() {
        let (Some(cur), Some(next)) = (country.year(year), country.year(year + 1)) else {
            continue;
        };
        let mut blended = CountryRecord::new(country.name.clone(), country.reference_member);
        blended.years.insert(year, cur.lerp(next, weight));
        out.insert(blended);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../tests/unit/interpolate.rs"]
mod tests;
