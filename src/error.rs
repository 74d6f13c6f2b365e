use thiserror::Error;

#[derive(Error, Debug)]
pub enum FairError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON解析エラー: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Form(#[from] fair_form_common::Error),

    #[error("ファイルを読み込めません: {0}")]
    SourceUnreadable(String),

    #[error("PDF描画エンジンを準備できません（再試行してください）: {0}")]
    RasterEngineUnavailable(String),

    #[error("Server Error: {status} - {message}")]
    Server { status: u16, message: String },

    #[error("Network Error: The backend server is not running or is unreachable.")]
    Unreachable,

    #[error("{0}")]
    Unexpected(String),

    #[error("この環境では音声認識を利用できません")]
    SpeechUnavailable,

    #[error("音声認識エラー: {0}")]
    Speech(String),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("取込エラー: {0}")]
    Import(String),
}

impl FairError {
    /// reqwest のエラーを分類する（接続・タイムアウト・送信失敗は到達不能）
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            FairError::Unreachable
        } else {
            FairError::Unexpected(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, FairError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_display() {
        let error = FairError::Server {
            status: 500,
            message: "OCR failed".into(),
        };
        assert_eq!(format!("{}", error), "Server Error: 500 - OCR failed");
    }

    #[test]
    fn test_unreachable_display() {
        assert_eq!(
            format!("{}", FairError::Unreachable),
            "Network Error: The backend server is not running or is unreachable."
        );
    }

    #[test]
    fn test_form_error_is_transparent() {
        let error: FairError = fair_form_common::Error::EmptyCrop.into();
        assert_eq!(format!("{}", error), "Select a crop area first");
    }

    #[test]
    fn test_io_error_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: FairError = io.into();
        assert!(matches!(error, FairError::Io(_)));
        assert!(format!("{}", error).contains("missing"));
    }
}
