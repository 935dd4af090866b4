use super::*;
use crate::model::YearRecord;
use crate::taxonomy::Category;

fn rec(total: f64, income: f64, ni: f64) -> YearRecord {
    YearRecord::from_pairs([
        (Category::TotalRevenue, total),
        (Category::IncomeTax, income),
        (Category::NationalInsurance, ni),
        (Category::Vat, 0.1 + income / 7.0),
    ])
}

fn dataset() -> Dataset {
    let mut a = CountryRecord::new("A", true);
    a.years.insert(2000, rec(30.0, 10.0, 5.0));
    a.years.insert(2001, rec(33.0, 12.0, 5.0));
    let mut b = CountryRecord::new("B", false);
    b.years.insert(2000, rec(20.3, 3.3, 1.7));
    b.years.insert(2001, rec(21.9, 4.1, 1.1));
    let mut ends_early = CountryRecord::new("C", false);
    ends_early.years.insert(2000, rec(15.0, 2.0, 1.0));
    let mut starts_late = CountryRecord::new("D", true);
    starts_late.years.insert(2001, rec(25.0, 8.0, 2.0));
    [a, b, ends_early, starts_late].into_iter().collect()
}

#[test]
fn midpoint_blends_linearly() {
    let out = interpolate(&dataset(), 2000, 0.5).unwrap();
    let a = out.get("A").unwrap();
    assert_eq!(a.value(2000, Category::IncomeTax), Some(11.0));
    assert_eq!(a.value(2000, Category::NationalInsurance), Some(5.0));
    assert!(a.reference_member);
    assert_eq!(a.years.len(), 1);
}

#[test]
fn weight_zero_and_one_reproduce_endpoints() {
    let ds = dataset();
    for name in ["A", "B"] {
        let src = ds.get(name).unwrap();
        let at0 = interpolate(&ds, 2000, 0.0).unwrap();
        let at1 = interpolate(&ds, 2000, 1.0).unwrap();
        assert_eq!(at0.get(name).unwrap().year(2000), src.year(2000));
        assert_eq!(at1.get(name).unwrap().year(2000), src.year(2001));
    }
}

#[test]
fn intermediate_weights_follow_the_formula() {
    let ds = dataset();
    let b = ds.get("B").unwrap();
    for w in [0.2, 0.4, 0.6, 0.8] {
        let out = interpolate(&ds, 2000, w).unwrap();
        let got = out.get("B").unwrap().year(2000).unwrap();
        for category in Category::ALL {
            let v0 = b.value(2000, category).unwrap();
            let v1 = b.value(2001, category).unwrap();
            let want = (1.0 - w) * v0 + w * v1;
            assert!((got.get(category) - want).abs() < 1e-12, "{category} at {w}");
        }
    }
}

#[test]
fn countries_missing_either_year_are_dropped() {
    let out = interpolate(&dataset(), 2000, 0.4).unwrap();
    assert!(out.get("C").is_none());
    assert!(out.get("D").is_none());
    assert_eq!(out.len(), 2);
}

#[test]
fn out_of_range_weights_are_rejected() {
    let ds = dataset();
    assert!(interpolate(&ds, 2000, -0.1).is_err());
    assert!(interpolate(&ds, 2000, 1.5).is_err());
    assert!(interpolate(&ds, 2000, f64::NAN).is_err());
}
