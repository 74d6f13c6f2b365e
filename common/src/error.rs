//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Row {index} is out of range (rows: {len})")]
    RowOutOfRange { index: usize, len: usize },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Field {0} does not accept snapshots")]
    SnapshotNotAllowed(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Draft store error: {0}")]
    Store(String),

    #[error("Unsupported file type: {0} (image or PDF only)")]
    UnsupportedFileType(String),

    #[error("Select a crop area first")]
    EmptyCrop,

    #[error("Crop session is not ready: {0}")]
    CropState(&'static str),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error = Error::Json(json_error);
        assert!(format!("{}", error).contains("JSON error"));
    }

    #[test]
    fn test_error_display_row_out_of_range() {
        let error = Error::RowOutOfRange { index: 4, len: 2 };
        assert_eq!(format!("{}", error), "Row 4 is out of range (rows: 2)");
    }

    #[test]
    fn test_error_display_invalid_value() {
        let error = Error::InvalidValue {
            field: "tol-type".to_string(),
            value: "Loose".to_string(),
        };
        assert_eq!(format!("{}", error), "Invalid value for tol-type: Loose");
    }

    #[test]
    fn test_error_display_crop() {
        assert_eq!(
            format!("{}", Error::UnsupportedFileType("notes.docx".to_string())),
            "Unsupported file type: notes.docx (image or PDF only)"
        );
        assert_eq!(format!("{}", Error::EmptyCrop), "Select a crop area first");
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
    }

    #[test]
    fn test_error_debug() {
        let error = Error::Store("書き込み失敗".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("Store"));
        assert!(debug.contains("書き込み失敗"));
    }
}
