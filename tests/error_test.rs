//! エラー表示と変換の統合テスト

use fair_portal::error::{FairError, Result};

fn read_missing() -> Result<Vec<u8>> {
    Ok(std::fs::read("/nonexistent/fair-portal/form.json")?)
}

fn parse_broken() -> Result<serde_json::Value> {
    Ok(serde_json::from_str("{broken")?)
}

fn form_error() -> Result<()> {
    let cropped: fair_form_common::Result<()> = Err(fair_form_common::Error::EmptyCrop);
    cropped?;
    Ok(())
}

#[test]
fn test_io_error_conversion() {
    let err = read_missing().unwrap_err();
    assert!(matches!(err, FairError::Io(_)));
    assert!(err.to_string().starts_with("IOエラー"));
}

#[test]
fn test_json_error_conversion() {
    let err = parse_broken().unwrap_err();
    assert!(matches!(err, FairError::Json(_)));
}

#[test]
fn test_form_error_is_transparent() {
    let err = form_error().unwrap_err();
    assert!(matches!(err, FairError::Form(fair_form_common::Error::EmptyCrop)));
    assert_eq!(err.to_string(), "Select a crop area first");
}

#[test]
fn test_server_error_message() {
    let err = FairError::Server {
        status: 400,
        message: "No file selected".into(),
    };
    assert_eq!(err.to_string(), "Server Error: 400 - No file selected");
}

#[test]
fn test_unsupported_file_type_message() {
    let err = FairError::from(fair_form_common::Error::UnsupportedFileType("notes.txt".into()));
    assert!(err.to_string().contains("notes.txt"));
}

#[test]
fn test_export_error_keeps_detail() {
    assert_eq!(
        FairError::ExcelGeneration("disk full".into()).to_string(),
        "Excel生成エラー: disk full"
    );
}
