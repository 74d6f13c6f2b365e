//! 公差（Tolerance）定義
//!
//! 公差タイプごとに入力可能なサブフィールドが決まっている。
//! サブフィールドの値はタイプ変更後も保持されるが、
//! 出力時は現在のタイプに属するものだけを読む。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 公差タイプ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToleranceType {
    #[serde(rename = "Symmetrical")]
    Symmetrical,
    #[serde(rename = "Bilateral")]
    Bilateral,
    #[serde(rename = "Unilateral Upper")]
    UnilateralUpper,
    #[serde(rename = "Unilateral Lower")]
    UnilateralLower,
    #[serde(rename = "Basic Dimension")]
    BasicDimension,
    #[serde(rename = "Range Inclusive")]
    RangeInclusive,
}

impl ToleranceType {
    pub const ALL: [ToleranceType; 6] = [
        ToleranceType::Symmetrical,
        ToleranceType::Bilateral,
        ToleranceType::UnilateralUpper,
        ToleranceType::UnilateralLower,
        ToleranceType::BasicDimension,
        ToleranceType::RangeInclusive,
    ];

    /// 画面・帳票に表示するラベル
    pub fn label(&self) -> &'static str {
        match self {
            ToleranceType::Symmetrical => "Symmetrical",
            ToleranceType::Bilateral => "Bilateral",
            ToleranceType::UnilateralUpper => "Unilateral Upper",
            ToleranceType::UnilateralLower => "Unilateral Lower",
            ToleranceType::BasicDimension => "Basic Dimension",
            ToleranceType::RangeInclusive => "Range Inclusive",
        }
    }

    /// このタイプで有効なサブフィールド（出力順）
    pub fn fields(&self) -> &'static [ToleranceField] {
        use ToleranceField::*;
        match self {
            ToleranceType::Symmetrical => &[SymNominal, SymTol],
            ToleranceType::Bilateral => &[BilatNominal, BilatHigh, BilatLow],
            ToleranceType::UnilateralUpper => &[Upper],
            ToleranceType::UnilateralLower => &[Lower],
            ToleranceType::BasicDimension => &[Basic],
            ToleranceType::RangeInclusive => &[RangeUpper, RangeLower],
        }
    }

    /// 空文字は未選択（None）
    pub fn parse_optional(s: &str) -> Result<Option<Self>, String> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed.parse().map(Some)
    }
}

impl fmt::Display for ToleranceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ToleranceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        ToleranceType::ALL
            .iter()
            .copied()
            .find(|t| t.label().to_ascii_lowercase() == normalized)
            .ok_or_else(|| format!("unknown tolerance type: {}", s))
    }
}

/// 公差サブフィールド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToleranceField {
    SymNominal,
    SymTol,
    BilatNominal,
    BilatHigh,
    BilatLow,
    Upper,
    Lower,
    Basic,
    RangeUpper,
    RangeLower,
}

impl ToleranceField {
    pub const ALL: [ToleranceField; 10] = [
        ToleranceField::SymNominal,
        ToleranceField::SymTol,
        ToleranceField::BilatNominal,
        ToleranceField::BilatHigh,
        ToleranceField::BilatLow,
        ToleranceField::Upper,
        ToleranceField::Lower,
        ToleranceField::Basic,
        ToleranceField::RangeUpper,
        ToleranceField::RangeLower,
    ];

    /// 帳票のラベル
    pub fn label(&self) -> &'static str {
        match self {
            ToleranceField::SymNominal | ToleranceField::BilatNominal => "Nominal",
            ToleranceField::SymTol => "High/Low Tol",
            ToleranceField::BilatHigh => "High Tol",
            ToleranceField::BilatLow => "Low Tol",
            ToleranceField::Upper | ToleranceField::RangeUpper => "Upper Specification",
            ToleranceField::Lower | ToleranceField::RangeLower => "Lower Specification",
            ToleranceField::Basic => "Basic Value",
        }
    }

    /// CLI用の名前
    pub fn name(&self) -> &'static str {
        match self {
            ToleranceField::SymNominal => "sym-nominal",
            ToleranceField::SymTol => "sym-tol",
            ToleranceField::BilatNominal => "bilat-nominal",
            ToleranceField::BilatHigh => "bilat-high",
            ToleranceField::BilatLow => "bilat-low",
            ToleranceField::Upper => "upper",
            ToleranceField::Lower => "lower",
            ToleranceField::Basic => "basic",
            ToleranceField::RangeUpper => "range-upper",
            ToleranceField::RangeLower => "range-lower",
        }
    }

    /// 下書きJSONのキー接頭辞（`req-sym-nom-3` の `req-sym-nom`）
    pub fn key_prefix(&self) -> &'static str {
        match self {
            ToleranceField::SymNominal => "req-sym-nom",
            ToleranceField::SymTol => "req-sym-tol",
            ToleranceField::BilatNominal => "req-bilat-nom",
            ToleranceField::BilatHigh => "req-bilat-high",
            ToleranceField::BilatLow => "req-bilat-low",
            ToleranceField::Upper => "req-upper",
            ToleranceField::Lower => "req-lower",
            ToleranceField::Basic => "req-basic",
            ToleranceField::RangeUpper => "req-range-up",
            ToleranceField::RangeLower => "req-range-low",
        }
    }
}

/// 公差の入力値（全タイプ分を保持）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToleranceValues {
    pub sym_nominal: String,
    pub sym_tol: String,
    pub bilat_nominal: String,
    pub bilat_high: String,
    pub bilat_low: String,
    pub upper: String,
    pub lower: String,
    pub basic: String,
    pub range_upper: String,
    pub range_lower: String,
}

impl ToleranceValues {
    pub fn get(&self, field: ToleranceField) -> &str {
        match field {
            ToleranceField::SymNominal => &self.sym_nominal,
            ToleranceField::SymTol => &self.sym_tol,
            ToleranceField::BilatNominal => &self.bilat_nominal,
            ToleranceField::BilatHigh => &self.bilat_high,
            ToleranceField::BilatLow => &self.bilat_low,
            ToleranceField::Upper => &self.upper,
            ToleranceField::Lower => &self.lower,
            ToleranceField::Basic => &self.basic,
            ToleranceField::RangeUpper => &self.range_upper,
            ToleranceField::RangeLower => &self.range_lower,
        }
    }

    pub fn get_mut(&mut self, field: ToleranceField) -> &mut String {
        match field {
            ToleranceField::SymNominal => &mut self.sym_nominal,
            ToleranceField::SymTol => &mut self.sym_tol,
            ToleranceField::BilatNominal => &mut self.bilat_nominal,
            ToleranceField::BilatHigh => &mut self.bilat_high,
            ToleranceField::BilatLow => &mut self.bilat_low,
            ToleranceField::Upper => &mut self.upper,
            ToleranceField::Lower => &mut self.lower,
            ToleranceField::Basic => &mut self.basic,
            ToleranceField::RangeUpper => &mut self.range_upper,
            ToleranceField::RangeLower => &mut self.range_lower,
        }
    }

    /// 指定タイプのサブフィールドを (ラベル, 値) で返す
    pub fn active_fields(&self, tolerance_type: ToleranceType) -> Vec<(&'static str, &str)> {
        tolerance_type
            .fields()
            .iter()
            .map(|f| (f.label(), self.get(*f)))
            .collect()
    }

    pub fn is_blank(&self) -> bool {
        ToleranceField::ALL.iter().all(|f| self.get(*f).is_empty())
    }
}
