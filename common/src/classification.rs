//! 結果区分・特性区分のドロップダウン定義

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 結果区分（9. Results の主ドロップダウン）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultsClassification {
    #[serde(rename = "Variable")]
    Variable,
    #[serde(rename = "Attribute")]
    Attribute,
    #[serde(rename = "Not Reportable")]
    NotReportable,
}

/// Attribute 時の二次値
pub const ATTRIBUTE_VALUES: [&str; 2] = ["Pass", "Fail"];

impl ResultsClassification {
    pub const ALL: [ResultsClassification; 3] = [
        ResultsClassification::Variable,
        ResultsClassification::Attribute,
        ResultsClassification::NotReportable,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ResultsClassification::Variable => "Variable",
            ResultsClassification::Attribute => "Attribute",
            ResultsClassification::NotReportable => "Not Reportable",
        }
    }

    /// 二次値がこの区分で有効か
    ///
    /// Attribute は Pass/Fail、Variable は自由入力、Not Reportable は値なし。
    pub fn accepts_secondary(&self, value: &str) -> bool {
        match self {
            ResultsClassification::Attribute => ATTRIBUTE_VALUES.contains(&value),
            ResultsClassification::Variable => true,
            ResultsClassification::NotReportable => value.is_empty(),
        }
    }

    pub fn parse_optional(s: &str) -> Result<Option<Self>, String> {
        if s.trim().is_empty() {
            return Ok(None);
        }
        s.parse().map(Some)
    }
}

impl fmt::Display for ResultsClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ResultsClassification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        ResultsClassification::ALL
            .iter()
            .copied()
            .find(|c| c.label().to_ascii_lowercase() == normalized)
            .ok_or_else(|| format!("unknown results classification: {}", s))
    }
}

/// 特性区分（7. Characteristic Designator）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Designator {
    Minor,
    Note,
    Significant,
    Critical,
}

impl Designator {
    pub const ALL: [Designator; 4] = [
        Designator::Minor,
        Designator::Note,
        Designator::Significant,
        Designator::Critical,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Designator::Minor => "Minor",
            Designator::Note => "Note",
            Designator::Significant => "Significant",
            Designator::Critical => "Critical",
        }
    }

    pub fn parse_optional(s: &str) -> Result<Option<Self>, String> {
        if s.trim().is_empty() {
            return Ok(None);
        }
        s.parse().map(Some)
    }
}

impl fmt::Display for Designator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Designator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Designator::ALL
            .iter()
            .copied()
            .find(|d| d.label().to_ascii_lowercase() == normalized)
            .ok_or_else(|| format!("unknown designator: {}", s))
    }
}
