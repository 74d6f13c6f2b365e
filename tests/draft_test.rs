//! ファイル下書きとフォームセッションの統合テスト

use fair_form_common::{
    DraftStore, FieldKey, FieldKind, FieldValue, FormSession, HeaderFields, ResultsClassification,
    Snapshot, ToleranceType,
};
use fair_portal::draft_store::FileDraftStore;
use std::path::Path;

fn store(dir: &Path) -> FileDraftStore {
    FileDraftStore::new(dir, "fair-42")
}

fn header(part_number: &str, part_name: &str) -> HeaderFields {
    HeaderFields {
        part_number: part_number.into(),
        part_name: part_name.into(),
        ..Default::default()
    }
}

/// 1x1 の PNG
fn png() -> Vec<u8> {
    let image = image::DynamicImage::ImageRgb8(image::RgbImage::new(1, 1));
    fair_portal::raster::encode_png(&image).unwrap()
}

#[test]
fn test_session_round_trip_through_files() {
    let dir = tempfile::tempdir().unwrap();

    let mut session = FormSession::open(store(dir.path()), Some(&header("PN-1", "Bracket"))).unwrap();
    {
        let grid = session.grid_mut();
        grid.set_field(FieldKey::new(FieldKind::CharNo, 0), FieldValue::plain("10"))
            .unwrap();
        grid.set_results_classification(0, Some(ResultsClassification::Variable))
            .unwrap();
        grid.set_secondary_result(0, Some("4.98".into())).unwrap();
        let i = grid.add_row();
        grid.set_tolerance_type(i, Some(ToleranceType::Symmetrical)).unwrap();
        grid.row_mut(i).unwrap().requirement.tolerance.sym_nominal = "12".into();
        grid.set_snapshot(FieldKey::new(FieldKind::GdtCallout, i), Snapshot::from_png(png()))
            .unwrap();
        // 末尾の空行も残る
        grid.add_row();
    }
    session.save().unwrap();
    let saved = session.grid().clone();

    let reopened = FormSession::open(store(dir.path()), None).unwrap();
    assert_eq!(reopened.grid(), &saved);
    assert_eq!(reopened.grid().len(), 3);
    assert_eq!(reopened.grid().header.part_name, "Bracket");
}

#[test]
fn test_handoff_overrides_saved_header() {
    let dir = tempfile::tempdir().unwrap();

    let mut first = FormSession::open(store(dir.path()), Some(&header("PN-1", "Bracket"))).unwrap();
    first.save().unwrap();

    // 空の項目は保存済みの値を使う
    let second = FormSession::open(store(dir.path()), Some(&header("PN-2", ""))).unwrap();
    assert_eq!(second.grid().header.part_number, "PN-2");
    assert_eq!(second.grid().header.part_name, "Bracket");

    let third = FormSession::open(store(dir.path()), None).unwrap();
    assert_eq!(third.grid().header.part_number, "PN-2");
}

#[test]
fn test_reset_keeps_header_only() {
    let dir = tempfile::tempdir().unwrap();

    let mut session = FormSession::open(store(dir.path()), Some(&header("PN-9", "Shaft"))).unwrap();
    session
        .grid_mut()
        .set_field(FieldKey::new(FieldKind::Comments, 0), FieldValue::plain("check burr"))
        .unwrap();
    session.save().unwrap();
    session.reset().unwrap();

    assert_eq!(store(dir.path()).keys().unwrap(), vec!["form3Top"]);

    let reopened = FormSession::open(store(dir.path()), None).unwrap();
    assert_eq!(reopened.grid().len(), 1);
    assert!(reopened.grid().row(0).unwrap().is_blank());
    assert_eq!(reopened.grid().header.part_number, "PN-9");
}

#[test]
fn test_delete_row_renumbers_saved_draft() {
    let dir = tempfile::tempdir().unwrap();

    let mut session = FormSession::open(store(dir.path()), None).unwrap();
    for (i, value) in ["10", "20", "30"].iter().enumerate() {
        if i > 0 {
            session.grid_mut().add_row();
        }
        session
            .grid_mut()
            .set_field(FieldKey::new(FieldKind::CharNo, i), FieldValue::plain(*value))
            .unwrap();
    }
    session.grid_mut().delete_row(1).unwrap();
    session.save().unwrap();

    let reopened = FormSession::open(store(dir.path()), None).unwrap();
    let char_nos: Vec<&str> = reopened.grid().rows().iter().map(|r| r.char_no.as_str()).collect();
    assert_eq!(char_nos, vec!["10", "30"]);
}

#[test]
fn test_corrupt_draft_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = store(dir.path());
    s.save("form3Data", &serde_json::json!({})).unwrap();
    std::fs::write(s.dir().join("form3Data.json"), "[oops").unwrap();

    assert!(FormSession::open(store(dir.path()), None).is_err());
}
