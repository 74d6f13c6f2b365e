//! 検査計画ファイルのストリーム取込
//!
//! ファイルを `/api/extract-text-stream` に送り、返ってくる
//! `{"extracted_data":[{...},{...}]}` を届いた順に行として反映する。

use crate::error::{FairError, Result};
use crate::ocr::server_error;
use fair_form_common::{ExtractedRow, FormGrid, RowIndex, StreamParser};
use futures::StreamExt;
use reqwest::multipart;
use std::path::Path;

pub const EXTRACT_ENDPOINT: &str = "/api/extract-text-stream";

/// 取込結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    /// 反映した行数
    pub rows: usize,
    /// 受信したバイト数
    pub bytes: usize,
}

fn mime_for(name: &str) -> &'static str {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".xlsx") {
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    } else if lower.ends_with(".xls") {
        "application/vnd.ms-excel"
    } else {
        "application/octet-stream"
    }
}

/// 行を1件ずつ反映する
fn commit<F>(grid: &mut FormGrid, rows: Vec<ExtractedRow>, summary: &mut ImportSummary, on_row: &mut F)
where
    F: FnMut(RowIndex, &ExtractedRow),
{
    for row in rows {
        let index = grid.append_extracted(&row);
        summary.rows += 1;
        on_row(index, &row);
    }
}

/// ファイルを送信してストリームを取り込む
///
/// 途中で通信が切れた場合、それまでに反映した行は残したまま Import エラーを返す。
pub async fn import_stream<F>(
    client: &reqwest::Client,
    base_url: &str,
    path: &Path,
    grid: &mut FormGrid,
    mut on_row: F,
) -> Result<ImportSummary>
where
    F: FnMut(RowIndex, &ExtractedRow),
{
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());
    let bytes = std::fs::read(path)?;

    let part = multipart::Part::bytes(bytes)
        .file_name(name.clone())
        .mime_str(mime_for(&name))
        .map_err(|e| FairError::Unexpected(e.to_string()))?;
    let form = multipart::Form::new().part("file", part);

    let url = format!("{}{}", base_url.trim_end_matches('/'), EXTRACT_ENDPOINT);
    tracing::info!(file = %name, url = %url, "取込開始");

    let response = client
        .post(&url)
        .multipart(form)
        .send()
        .await
        .map_err(FairError::from_transport)?;
    if !response.status().is_success() {
        return Err(server_error(response).await);
    }

    let mut parser = StreamParser::new();
    let mut summary = ImportSummary::default();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!(rows = summary.rows, "取込中断: {}", e);
                return Err(FairError::Import(format!(
                    "{}行を取り込んだ後に通信が切断されました: {}",
                    summary.rows, e
                )));
            }
        };
        summary.bytes += chunk.len();
        let rows = parser.feed(&chunk);
        commit(grid, rows, &mut summary, &mut on_row);
    }
    commit(grid, parser.finish(), &mut summary, &mut on_row);

    tracing::info!(rows = summary.rows, bytes = summary.bytes, "取込完了");
    Ok(summary)
}
