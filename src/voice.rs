//! 音声入力
//!
//! 認識エンジンは差し替え可能。CLIでは対話入力（読み上げの書き起こし）を使う。

use crate::error::{FairError, Result};
use fair_form_common::{normalize_spoken_text, FieldKey, FormGrid};

/// 1回分の発話を書き起こす
pub trait SpeechRecognizer {
    fn recognize_once(&mut self) -> Result<String>;
}

/// 事前に用意した書き起こしを返す（1回限り）
#[derive(Debug, Clone, Default)]
pub struct TranscriptRecognizer {
    transcript: Option<String>,
}

impl TranscriptRecognizer {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: Some(transcript.into()),
        }
    }
}

impl SpeechRecognizer for TranscriptRecognizer {
    fn recognize_once(&mut self) -> Result<String> {
        self.transcript
            .take()
            .ok_or_else(|| FairError::Speech("書き起こしは使用済みです".into()))
    }
}

/// 端末から書き起こしを入力してもらう
pub struct PromptRecognizer {
    prompt: String,
}

impl PromptRecognizer {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into() }
    }
}

impl SpeechRecognizer for PromptRecognizer {
    fn recognize_once(&mut self) -> Result<String> {
        dialoguer::Input::<String>::new()
            .with_prompt(&self.prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| FairError::Speech(e.to_string()))
    }
}

/// 1回聞き取り、正規化したテキストを対象フィールドへ追記する
///
/// 認識エンジンが無い環境では SpeechUnavailable を返し、フォームは変えない。
pub fn dictate(
    grid: &mut FormGrid,
    key: FieldKey,
    recognizer: Option<&mut dyn SpeechRecognizer>,
) -> Result<String> {
    let recognizer = recognizer.ok_or(FairError::SpeechUnavailable)?;
    grid.row_mut(key.row)?;

    let heard = recognizer.recognize_once()?;
    let text = normalize_spoken_text(&heard);
    tracing::debug!(heard = %heard, normalized = %text, "音声認識");
    grid.append_text(key, &text)?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fair_form_common::{FieldKind, FieldValue};

    #[test]
    fn test_dictate_appends_normalized() {
        let mut grid = FormGrid::with_blank_row();
        let key = FieldKey::new(FieldKind::ReferenceLocation, 0);
        grid.set_field(key, FieldValue::plain("Sheet")).unwrap();

        let mut recognizer = TranscriptRecognizer::new("hash 4 slash B");
        let text = dictate(&mut grid, key, Some(&mut recognizer)).unwrap();
        assert_eq!(text, "# 4 / B");
        assert_eq!(grid.field(key).text(), "Sheet # 4 / B");
    }

    #[test]
    fn test_dictate_without_engine() {
        let mut grid = FormGrid::with_blank_row();
        let key = FieldKey::new(FieldKind::Comments, 0);
        let result = dictate(&mut grid, key, None);
        assert!(matches!(result, Err(FairError::SpeechUnavailable)));
        assert!(grid.field(key).is_blank());
    }

    #[test]
    fn test_dictate_into_gdt_keeps_snapshot() {
        let mut grid = FormGrid::with_blank_row();
        let key = FieldKey::new(FieldKind::GdtCallout, 0);
        grid.set_snapshot(key, fair_form_common::Snapshot::from_png(vec![1, 2, 3]))
            .unwrap();

        let mut recognizer = TranscriptRecognizer::new("0 dot 05");
        dictate(&mut grid, key, Some(&mut recognizer)).unwrap();
        let value = grid.field(key);
        assert_eq!(value.text(), "0 . 05");
        assert!(value.snapshot().is_some());
    }

    #[test]
    fn test_transcript_used_once() {
        let mut recognizer = TranscriptRecognizer::new("a");
        assert_eq!(recognizer.recognize_once().unwrap(), "a");
        assert!(recognizer.recognize_once().is_err());
    }

    #[test]
    fn test_dictate_row_out_of_range() {
        let mut grid = FormGrid::with_blank_row();
        let key = FieldKey::new(FieldKind::Units, 3);
        let mut recognizer = TranscriptRecognizer::new("mm");
        assert!(dictate(&mut grid, key, Some(&mut recognizer)).is_err());
        // 行が無いときは認識しない
        assert!(recognizer.recognize_once().is_ok());
    }
}
