//! フィールド値モデル
//!
//! 1セルの値は `Plain`（文字列）か `Composite`（文字列 + スナップショット画像）。
//! どちらになるかはフィールド種別の静的設定で決まり、値の中身からは推測しない。

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::tolerance::ToleranceField;

/// 行番号（0始まり）
pub type RowIndex = usize;

// ============================================
// スナップショット
// ============================================

/// 切り抜き画像（フィールドが排他的に所有する）
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot {
    mime: String,
    bytes: Vec<u8>,
}

impl Snapshot {
    pub fn from_png(bytes: Vec<u8>) -> Self {
        Self { mime: "image/png".to_string(), bytes }
    }

    /// "data:image/png;base64,..." 形式から復元
    pub fn from_data_url(data_url: &str) -> Result<Self> {
        let rest = data_url
            .strip_prefix("data:")
            .ok_or_else(|| Error::Parse("data URLではありません".into()))?;
        let (mime, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| Error::Parse("base64 data URLではありません".into()))?;
        if !mime.starts_with("image/") {
            return Err(Error::Parse(format!("画像ではないdata URL: {}", mime)));
        }
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| Error::Parse(format!("base64デコードエラー: {}", e)))?;
        Ok(Self { mime: mime.to_string(), bytes })
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// PNGヘッダ（IHDR）から画素サイズを読む
    pub fn png_dimensions(&self) -> Option<(u32, u32)> {
        const SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
        let b = &self.bytes;
        if b.len() < 24 || &b[..8] != SIGNATURE || &b[12..16] != b"IHDR" {
            return None;
        }
        let width = u32::from_be_bytes([b[16], b[17], b[18], b[19]]);
        let height = u32::from_be_bytes([b[20], b[21], b[22], b[23]]);
        if width == 0 || height == 0 {
            return None;
        }
        Some((width, height))
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("mime", &self.mime)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_data_url())
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Snapshot::from_data_url(&s).map_err(de::Error::custom)
    }
}

// ============================================
// フィールド種別
// ============================================

/// 値の形
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    Plain,
    Composite,
}

/// フォームテンプレートで固定されたフィールド種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKind {
    CharNo,
    BubbleNo,
    ReferenceLocation,
    Designator,
    RequirementDescription,
    ToleranceType,
    Tolerance(ToleranceField),
    Units,
    GdtCallout,
    BonusTolerance,
    ResultsClassification,
    SecondaryResult,
    Tooling,
    NonconformanceNumber,
    Comments,
}

impl FieldKind {
    pub fn all() -> Vec<FieldKind> {
        let mut kinds = vec![
            FieldKind::CharNo,
            FieldKind::BubbleNo,
            FieldKind::ReferenceLocation,
            FieldKind::Designator,
            FieldKind::RequirementDescription,
            FieldKind::ToleranceType,
        ];
        kinds.extend(ToleranceField::ALL.iter().map(|f| FieldKind::Tolerance(*f)));
        kinds.extend([
            FieldKind::Units,
            FieldKind::GdtCallout,
            FieldKind::BonusTolerance,
            FieldKind::ResultsClassification,
            FieldKind::SecondaryResult,
            FieldKind::Tooling,
            FieldKind::NonconformanceNumber,
            FieldKind::Comments,
        ]);
        kinds
    }

    /// 静的設定: スナップショットを持てるのはGD&Tのみ
    pub fn shape(&self) -> FieldShape {
        match self {
            FieldKind::GdtCallout => FieldShape::Composite,
            _ => FieldShape::Plain,
        }
    }

    pub fn allows_snapshot(&self) -> bool {
        self.shape() == FieldShape::Composite
    }

    /// CLI・ログ用の名前
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::CharNo => "char-no",
            FieldKind::BubbleNo => "bubble-no",
            FieldKind::ReferenceLocation => "reference-location",
            FieldKind::Designator => "designator",
            FieldKind::RequirementDescription => "description",
            FieldKind::ToleranceType => "tol-type",
            FieldKind::Tolerance(f) => f.name(),
            FieldKind::Units => "units",
            FieldKind::GdtCallout => "gdt",
            FieldKind::BonusTolerance => "bonus",
            FieldKind::ResultsClassification => "results",
            FieldKind::SecondaryResult => "secondary",
            FieldKind::Tooling => "tooling",
            FieldKind::NonconformanceNumber => "nonconformance",
            FieldKind::Comments => "comments",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        FieldKind::all()
            .into_iter()
            .find(|k| k.name() == name)
            .ok_or_else(|| Error::UnknownField(s.to_string()))
    }
}

/// (種別, 行) の複合キー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey {
    pub kind: FieldKind,
    pub row: RowIndex,
}

impl FieldKey {
    pub fn new(kind: FieldKind, row: RowIndex) -> Self {
        Self { kind, row }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind, self.row)
    }
}

// ============================================
// フィールド値
// ============================================

/// 1セルの値
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Plain(String),
    Composite {
        #[serde(default)]
        text: String,
        #[serde(default)]
        snapshot: Option<Snapshot>,
    },
}

impl FieldValue {
    /// 形ごとの空値
    pub fn empty(shape: FieldShape) -> Self {
        match shape {
            FieldShape::Plain => FieldValue::Plain(String::new()),
            FieldShape::Composite => FieldValue::Composite {
                text: String::new(),
                snapshot: None,
            },
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        FieldValue::Plain(text.into())
    }

    pub fn text(&self) -> &str {
        match self {
            FieldValue::Plain(text) => text,
            FieldValue::Composite { text, .. } => text,
        }
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            FieldValue::Plain(_) => None,
            FieldValue::Composite { snapshot, .. } => snapshot.as_ref(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text().is_empty() && self.snapshot().is_none()
    }

    /// 静的設定の形に合わせる（Composite→Plainではスナップショットを捨てる）
    pub fn into_shape(self, shape: FieldShape) -> Self {
        match (self, shape) {
            (FieldValue::Plain(text), FieldShape::Composite) => FieldValue::Composite {
                text,
                snapshot: None,
            },
            (FieldValue::Composite { text, .. }, FieldShape::Plain) => FieldValue::Plain(text),
            (value, _) => value,
        }
    }

    /// 認識テキストの追記（OCR・音声共通）
    ///
    /// 既存テキストがあれば半角スペース1つで区切る。スナップショットは保持。
    pub fn append_text(&mut self, addition: &str) {
        let addition = addition.trim();
        if addition.is_empty() {
            return;
        }
        let text = match self {
            FieldValue::Plain(text) => text,
            FieldValue::Composite { text, .. } => text,
        };
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(addition);
    }
}

/// GD&T欄などのtext+snapshot値
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositeValue {
    pub text: String,
    pub snapshot: Option<Snapshot>,
}

impl CompositeValue {
    pub fn to_field_value(&self) -> FieldValue {
        FieldValue::Composite {
            text: self.text.clone(),
            snapshot: self.snapshot.clone(),
        }
    }

    pub fn from_field_value(value: FieldValue) -> Self {
        match value.into_shape(FieldShape::Composite) {
            FieldValue::Composite { text, snapshot } => Self { text, snapshot },
            FieldValue::Plain(text) => Self { text, snapshot: None },
        }
    }

    /// 旧形式の保存値を移行する
    ///
    /// 文字列が `data:image` で始まる場合はスナップショットのみとみなす。
    pub fn from_legacy_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) if s.starts_with("data:image") => Self {
                text: String::new(),
                snapshot: Snapshot::from_data_url(s).ok(),
            },
            serde_json::Value::String(s) => Self {
                text: s.clone(),
                snapshot: None,
            },
            serde_json::Value::Object(_) => serde_json::from_value::<FieldValue>(value.clone())
                .map(Self::from_field_value)
                .unwrap_or_default(),
            _ => Self::default(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty() && self.snapshot.is_none()
    }
}
