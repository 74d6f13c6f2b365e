//! 一括取込ストリームのインクリメンタルパーサ
//!
//! レスポンス本文は全体として `{"extracted_data": [ {...}, {...} ]}` だが、
//! オブジェクト断片が届いた順に1件ずつ行として確定させる。

use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static::lazy_static! {
    static ref DELIMITER_RE: Regex = Regex::new(r"\}\s*,\s*").unwrap();
    static ref WRAPPER_RE: Regex = Regex::new(r#"^\s*\{\s*"extracted_data"\s*:\s*\["#).unwrap();
    static ref CLOSING_RE: Regex = Regex::new(r"\]\s*\}\s*$").unwrap();
}

/// 抽出サービスが返す1件
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedRow {
    pub operation: String,
    pub feature_no: String,
    pub drawing_ref: String,
    pub description: String,
}

#[derive(Debug)]
pub struct StreamParser {
    /// UTF-8として未完結の末尾バイト
    pending: Vec<u8>,
    buffer: String,
    /// 先頭オブジェクトのラッパーをまだ除去していない
    at_start: bool,
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamParser {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            buffer: String::new(),
            at_start: true,
        }
    }

    /// 受信バイトを追加し、確定した行を返す
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ExtractedRow> {
        self.pending.extend_from_slice(chunk);
        self.decode_pending();
        self.drain_complete()
    }

    /// ストリーム終端で最後のオブジェクトを確定させる
    pub fn finish(mut self) -> Vec<ExtractedRow> {
        if !self.pending.is_empty() {
            self.buffer.push_str(&String::from_utf8_lossy(&self.pending));
            self.pending.clear();
        }
        let mut rows = self.drain_complete();

        let mut tail = std::mem::take(&mut self.buffer);
        if self.at_start {
            tail = WRAPPER_RE.replace(&tail, "").into_owned();
        }
        let tail = CLOSING_RE.replace(&tail, "");
        let tail = tail.trim();
        if !tail.is_empty() {
            if let Ok(row) = serde_json::from_str::<ExtractedRow>(tail) {
                rows.push(row);
            }
        }
        rows
    }

    fn decode_pending(&mut self) {
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.pending.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&self.pending[..valid]) {
                        self.buffer.push_str(text);
                    }
                    match e.error_len() {
                        // 不正なバイト列は置換文字にして先へ進む
                        Some(bad) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        // 末尾のマルチバイト文字が途中で切れている
                        None => {
                            self.pending.drain(..valid);
                            return;
                        }
                    }
                }
            }
        }
    }

    fn drain_complete(&mut self) -> Vec<ExtractedRow> {
        let mut rows = Vec::new();
        let mut consumed = 0;

        for delimiter in DELIMITER_RE.find_iter(&self.buffer) {
            let segment = &self.buffer[consumed..delimiter.start()];
            let candidate = if self.at_start {
                format!("{}}}", WRAPPER_RE.replace(segment, ""))
            } else {
                format!("{}}}", segment)
            };
            consumed = delimiter.end();
            self.at_start = false;

            // 解析できない断片は読み捨てる
            if let Ok(row) = serde_json::from_str::<ExtractedRow>(candidate.trim()) {
                rows.push(row);
            }
        }

        if consumed > 0 {
            self.buffer.drain(..consumed);
        }
        rows
    }
}
