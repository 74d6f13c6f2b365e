//! OCRサーバー連携
//!
//! 切り抜いたJPEGを multipart で `/api/ocr-image` に送り、
//! `extracted_text` を受け取る。

use crate::error::{FairError, Result};
use reqwest::multipart;
use serde::Deserialize;

pub const OCR_ENDPOINT: &str = "/api/ocr-image";
const OCR_PART_NAME: &str = "cropped_image";
const OCR_FILE_NAME: &str = "cropped.jpg";

/// 画像からテキストを得る境界（テストでは差し替える）
#[allow(async_fn_in_trait)]
pub trait TextRecognizer {
    async fn recognize(&self, jpeg: Vec<u8>) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    extracted_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

/// 失敗レスポンスから `error` を取り出す（無ければ "Unknown error"）
pub(crate) async fn server_error(response: reqwest::Response) -> FairError {
    let status = response.status().as_u16();
    let message = response
        .json::<ErrorResponse>()
        .await
        .ok()
        .and_then(|body| body.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| "Unknown error".to_string());
    FairError::Server { status, message }
}

#[derive(Debug, Clone)]
pub struct OcrClient {
    http: reqwest::Client,
    base_url: String,
}

impl OcrClient {
    /// 応答待ちに上限は設けない（サーバーが返すまで待つ）
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| FairError::Config(format!("HTTPクライアント初期化エラー: {}", e)))?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, OCR_ENDPOINT)
    }

    fn request(&self, jpeg: Vec<u8>) -> Result<reqwest::Request> {
        let part = multipart::Part::bytes(jpeg)
            .file_name(OCR_FILE_NAME)
            .mime_str("image/jpeg")
            .map_err(|e| FairError::Unexpected(e.to_string()))?;
        let form = multipart::Form::new().part(OCR_PART_NAME, part);
        self.http
            .post(self.endpoint())
            .multipart(form)
            .build()
            .map_err(|e| FairError::Unexpected(e.to_string()))
    }

    /// JPEGを送信して抽出テキスト（前後空白除去済み）を返す
    pub async fn extract(&self, jpeg: Vec<u8>) -> Result<String> {
        tracing::debug!(bytes = jpeg.len(), url = %self.endpoint(), "OCR送信");
        let request = self.request(jpeg)?;
        let response = self
            .http
            .execute(request)
            .await
            .map_err(FairError::from_transport)?;

        if !response.status().is_success() {
            let error = server_error(response).await;
            tracing::warn!("OCR失敗: {}", error);
            return Err(error);
        }

        let body: OcrResponse = response
            .json()
            .await
            .map_err(|e| FairError::Unexpected(e.to_string()))?;
        Ok(body.extracted_text.unwrap_or_default().trim().to_string())
    }
}

impl TextRecognizer for OcrClient {
    async fn recognize(&self, jpeg: Vec<u8>) -> Result<String> {
        self.extract(jpeg).await
    }
}
