use super::*;

#[test]
fn rows_keep_sheet_origin_addressing() {
    let mut range: Range<Data> = Range::new((2, 1), (3, 2));
    range.set_value((2, 1), Data::String("Austria".to_string()));
    range.set_value((2, 2), Data::Float(41.5));
    range.set_value((3, 2), Data::Int(7));

    let rows = rows_from_range(&range);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].width(), 0);
    assert_eq!(rows[2].index, 2);
    assert_eq!(rows[2].cell(0), &Cell::Empty);
    assert_eq!(rows[2].cell(1), &Cell::Text("Austria".to_string()));
    assert_eq!(rows[2].cell(2), &Cell::Number(41.5));
    assert_eq!(rows[3].cell(1), &Cell::Empty);
    assert_eq!(rows[3].cell(2), &Cell::Number(7.0));
}

#[test]
fn error_cells_read_as_empty() {
    let mut range: Range<Data> = Range::new((0, 0), (0, 1));
    range.set_value((0, 0), Data::Error(calamine::CellErrorType::NA));
    range.set_value((0, 1), Data::Bool(true));

    let rows = rows_from_range(&range);
    assert_eq!(rows[0].cell(0), &Cell::Empty);
    assert_eq!(rows[0].cell(1), &Cell::Bool(true));
}

#[test]
fn missing_workbook_is_source_unreadable() {
    let err = read_workbook(Path::new("target/no-such-workbook.xlsx"), None).unwrap_err();
    assert!(matches!(err, TaxcompError::SourceUnreadable(_)));
}

#[test]
fn corrupt_workbook_is_source_unreadable() {
    let dir = std::path::PathBuf::from("target").join("workbook_unit");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("corrupt.xlsx");
    std::fs::write(&path, b"definitely not a zip archive").unwrap();

    let err = read_workbook(&path, Some("OECD.Stat export")).unwrap_err();
    assert!(matches!(err, TaxcompError::SourceUnreadable(_)));
}
