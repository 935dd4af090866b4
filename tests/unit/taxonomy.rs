use super::*;

#[test]
fn default_taxonomy_covers_every_category() {
    let taxonomy = Taxonomy::default();
    taxonomy.validate().unwrap();
    for category in Category::ALL {
        assert!(taxonomy.spec(category).is_some(), "missing {category}");
    }
    assert_eq!(taxonomy.max_reach(), 41);
}

#[test]
fn keys_round_trip_through_from_key() {
    for category in Category::ALL {
        assert_eq!(Category::from_key(category.key()), Some(category));
    }
    assert_eq!(Category::from_key("vat"), None);
}

#[test]
fn serde_uses_source_keys() {
    let json = serde_json::to_string(&Category::NationalInsurance).unwrap();
    assert_eq!(json, "\"NI\"");
    let back: Category = serde_json::from_str("\"non_VAT_sales\"").unwrap();
    assert_eq!(back, Category::NonVatSales);
}

#[test]
fn rejects_empty_offsets() {
    let mut specs = Taxonomy::default().specs().to_vec();
    specs[1].offsets.clear();
    let err = Taxonomy::new(specs).unwrap_err();
    assert!(err.to_string().contains("income_tax"));
}

#[test]
fn rejects_duplicates_and_gaps() {
    let mut specs = Taxonomy::default().specs().to_vec();
    specs.push(CategorySpec::new(Category::Vat, [1]));
    assert!(Taxonomy::new(specs).is_err());

    let specs: Vec<_> = Taxonomy::default()
        .specs()
        .iter()
        .filter(|s| s.category != Category::Property)
        .cloned()
        .collect();
    let err = Taxonomy::new(specs).unwrap_err();
    assert!(err.to_string().contains("property"));
}

#[test]
fn palette_and_labels_cover_stacking_order() {
    let palette = default_palette();
    let labels = default_labels();
    for category in default_stacking_order() {
        assert!(palette.contains_key(&category));
        assert!(labels.contains_key(&category));
    }
    assert!(!default_stacking_order().contains(&Category::TotalRevenue));
}
