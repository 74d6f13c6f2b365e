//! Form 3 の行グリッド状態
//!
//! 行はレコード（名前付きフィールドの構造体）の配列として保持する。
//! 行を削除すると、その行の全フィールドはレコードごと消え、
//! 後続の行は1つずつ前に詰まる。

use serde::{Deserialize, Serialize};

use crate::classification::{Designator, ResultsClassification};
use crate::error::{Error, Result};
use crate::field::{CompositeValue, FieldKey, FieldKind, FieldValue, RowIndex, Snapshot};
use crate::stream::ExtractedRow;
use crate::tolerance::{ToleranceType, ToleranceValues};

/// フォーム上部の識別フィールド（前工程から引き継ぐ）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeaderFields {
    pub part_number: String,
    pub part_name: String,
    pub serial_number: String,
    pub fair_identifier: String,
}

impl HeaderFields {
    /// 帳票の表示順 (ラベル, 値)
    pub fn labeled(&self) -> [(&'static str, &str); 4] {
        [
            ("Part Number", &self.part_number),
            ("Part Name", &self.part_name),
            ("Serial Number", &self.serial_number),
            ("FAIR Identifier", &self.fair_identifier),
        ]
    }

    /// 項目ごとに、空でない `preferred` を優先して合成する
    pub fn merged_over(&self, fallback: &HeaderFields) -> HeaderFields {
        fn pick(preferred: &str, fallback: &str) -> String {
            if preferred.is_empty() { fallback.to_string() } else { preferred.to_string() }
        }
        HeaderFields {
            part_number: pick(&self.part_number, &fallback.part_number),
            part_name: pick(&self.part_name, &fallback.part_name),
            serial_number: pick(&self.serial_number, &fallback.serial_number),
            fair_identifier: pick(&self.fair_identifier, &fallback.fair_identifier),
        }
    }
}

/// 8. Requirement 欄
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirement {
    pub description: String,
    pub tolerance_type: Option<ToleranceType>,
    pub tolerance: ToleranceValues,
    pub units: String,
    pub gdt: CompositeValue,
}

/// 1行（1特性）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub char_no: String,
    pub bubble_no: String,
    pub reference_location: String,
    pub designator: Option<Designator>,
    pub requirement: Requirement,
    pub bonus_tolerance: String,
    pub classification: Option<ResultsClassification>,
    pub secondary: Option<String>,
    pub tooling: String,
    pub nonconformance_number: String,
    pub comments: String,
}

impl Row {
    pub fn is_blank(&self) -> bool {
        *self == Row::default()
    }

    fn text_slot_mut(&mut self, kind: FieldKind) -> Option<&mut String> {
        match kind {
            FieldKind::CharNo => Some(&mut self.char_no),
            FieldKind::BubbleNo => Some(&mut self.bubble_no),
            FieldKind::ReferenceLocation => Some(&mut self.reference_location),
            FieldKind::RequirementDescription => Some(&mut self.requirement.description),
            FieldKind::Tolerance(f) => Some(self.requirement.tolerance.get_mut(f)),
            FieldKind::Units => Some(&mut self.requirement.units),
            FieldKind::BonusTolerance => Some(&mut self.bonus_tolerance),
            FieldKind::Tooling => Some(&mut self.tooling),
            FieldKind::NonconformanceNumber => Some(&mut self.nonconformance_number),
            FieldKind::Comments => Some(&mut self.comments),
            _ => None,
        }
    }

    /// 種別の値を読む（未入力は空値）
    pub fn get(&self, kind: FieldKind) -> FieldValue {
        let text = match kind {
            FieldKind::CharNo => self.char_no.clone(),
            FieldKind::BubbleNo => self.bubble_no.clone(),
            FieldKind::ReferenceLocation => self.reference_location.clone(),
            FieldKind::Designator => self.designator.map(|d| d.label().to_string()).unwrap_or_default(),
            FieldKind::RequirementDescription => self.requirement.description.clone(),
            FieldKind::ToleranceType => self
                .requirement
                .tolerance_type
                .map(|t| t.label().to_string())
                .unwrap_or_default(),
            FieldKind::Tolerance(f) => self.requirement.tolerance.get(f).to_string(),
            FieldKind::Units => self.requirement.units.clone(),
            FieldKind::GdtCallout => return self.requirement.gdt.to_field_value(),
            FieldKind::BonusTolerance => self.bonus_tolerance.clone(),
            FieldKind::ResultsClassification => self
                .classification
                .map(|c| c.label().to_string())
                .unwrap_or_default(),
            FieldKind::SecondaryResult => self.secondary.clone().unwrap_or_default(),
            FieldKind::Tooling => self.tooling.clone(),
            FieldKind::NonconformanceNumber => self.nonconformance_number.clone(),
            FieldKind::Comments => self.comments.clone(),
        };
        FieldValue::Plain(text)
    }

    /// 種別の値を上書きする
    pub fn set(&mut self, kind: FieldKind, value: FieldValue) -> Result<()> {
        let value = value.into_shape(kind.shape());
        let invalid = |e: String| Error::InvalidValue {
            field: kind.name().to_string(),
            value: e,
        };
        match kind {
            FieldKind::GdtCallout => {
                self.requirement.gdt = CompositeValue::from_field_value(value);
            }
            FieldKind::Designator => {
                self.designator = Designator::parse_optional(value.text()).map_err(invalid)?;
            }
            FieldKind::ToleranceType => {
                self.requirement.tolerance_type =
                    ToleranceType::parse_optional(value.text()).map_err(invalid)?;
            }
            FieldKind::ResultsClassification => {
                let classification =
                    ResultsClassification::parse_optional(value.text()).map_err(invalid)?;
                self.set_classification(classification);
            }
            FieldKind::SecondaryResult => {
                let text = value.text();
                self.secondary = if text.is_empty() { None } else { Some(text.to_string()) };
            }
            _ => {
                if let Some(slot) = self.text_slot_mut(kind) {
                    *slot = value.text().to_string();
                }
            }
        }
        Ok(())
    }

    /// 区分を変更すると二次値は必ず消える（同じ値の再設定でも）
    pub fn set_classification(&mut self, classification: Option<ResultsClassification>) {
        self.classification = classification;
        self.secondary = None;
    }
}

/// Form 3 グリッド全体
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormGrid {
    pub header: HeaderFields,
    rows: Vec<Row>,
}

impl FormGrid {
    /// 行なしで作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 空行1つで作成（フォームを開いた直後の状態）
    pub fn with_blank_row() -> Self {
        Self {
            header: HeaderFields::default(),
            rows: vec![Row::default()],
        }
    }

    pub fn from_rows(header: HeaderFields, rows: Vec<Row>) -> Self {
        Self { header, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: RowIndex) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn row_mut(&mut self, index: RowIndex) -> Result<&mut Row> {
        let len = self.rows.len();
        self.rows
            .get_mut(index)
            .ok_or(Error::RowOutOfRange { index, len })
    }

    /// 末尾に空行を追加し、その行番号を返す
    pub fn add_row(&mut self) -> RowIndex {
        self.rows.push(Row::default());
        self.rows.len() - 1
    }

    /// 行を削除する（後続行は詰まる）
    pub fn delete_row(&mut self, index: RowIndex) -> Result<Row> {
        if index >= self.rows.len() {
            return Err(Error::RowOutOfRange { index, len: self.rows.len() });
        }
        Ok(self.rows.remove(index))
    }

    /// フォーム全体を初期状態（空行1つ）に戻す
    pub fn reset(&mut self) {
        *self = Self::with_blank_row();
    }

    /// 値を読む（範囲外の行は空値）
    pub fn field(&self, key: FieldKey) -> FieldValue {
        match self.rows.get(key.row) {
            Some(row) => row.get(key.kind),
            None => FieldValue::empty(key.kind.shape()),
        }
    }

    pub fn set_field(&mut self, key: FieldKey, value: FieldValue) -> Result<()> {
        self.row_mut(key.row)?.set(key.kind, value)
    }

    /// 認識テキストを追記する（スナップショットは保持）
    pub fn append_text(&mut self, key: FieldKey, text: &str) -> Result<()> {
        let mut value = self.field(key);
        value.append_text(text);
        self.set_field(key, value)
    }

    /// スナップショットを差し替える（テキストは保持）
    pub fn set_snapshot(&mut self, key: FieldKey, snapshot: Snapshot) -> Result<()> {
        if !key.kind.allows_snapshot() {
            return Err(Error::SnapshotNotAllowed(key.kind.name().to_string()));
        }
        let text = self.field(key).text().to_string();
        self.set_field(
            key,
            FieldValue::Composite {
                text,
                snapshot: Some(snapshot),
            },
        )
    }

    pub fn set_results_classification(
        &mut self,
        index: RowIndex,
        classification: Option<ResultsClassification>,
    ) -> Result<()> {
        self.row_mut(index)?.set_classification(classification);
        Ok(())
    }

    /// 二次値を保存する（空文字は未設定。区分との整合は呼び出し側で確認）
    pub fn set_secondary_result(&mut self, index: RowIndex, value: Option<String>) -> Result<()> {
        self.row_mut(index)?.secondary = value.filter(|v| !v.is_empty());
        Ok(())
    }

    pub fn set_tolerance_type(
        &mut self,
        index: RowIndex,
        tolerance_type: Option<ToleranceType>,
    ) -> Result<()> {
        self.row_mut(index)?.requirement.tolerance_type = tolerance_type;
        Ok(())
    }

    pub fn set_designator(&mut self, index: RowIndex, designator: Option<Designator>) -> Result<()> {
        self.row_mut(index)?.designator = designator;
        Ok(())
    }

    /// 一括取込の1件を行として追加する
    ///
    /// 末尾の空行（開いた直後の1行など）があれば先にそれを使う。
    pub fn append_extracted(&mut self, item: &ExtractedRow) -> RowIndex {
        let blank_tail = self
            .rows
            .iter()
            .rposition(|r| !r.is_blank())
            .map(|last| last + 1)
            .unwrap_or(0);
        let index = if blank_tail < self.rows.len() {
            blank_tail
        } else {
            self.add_row()
        };
        let row = &mut self.rows[index];
        row.char_no = item.operation.clone();
        row.bubble_no = item.feature_no.clone();
        row.reference_location = item.drawing_ref.clone();
        row.requirement.description = item.description.clone();
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::tiny_png;
    use crate::tolerance::ToleranceField;

    fn key(kind: FieldKind, row: RowIndex) -> FieldKey {
        FieldKey::new(kind, row)
    }

    #[test]
    fn test_add_row_creates_no_values() {
        let mut grid = FormGrid::new();
        assert_eq!(grid.add_row(), 0);
        assert_eq!(grid.add_row(), 1);
        assert_eq!(grid.len(), 2);
        assert!(grid.rows().iter().all(Row::is_blank));
    }

    #[test]
    fn test_field_defaults() {
        let grid = FormGrid::with_blank_row();
        assert_eq!(grid.field(key(FieldKind::CharNo, 0)), FieldValue::plain(""));
        assert_eq!(
            grid.field(key(FieldKind::GdtCallout, 0)),
            FieldValue::Composite { text: String::new(), snapshot: None }
        );
        // 範囲外も空値
        assert_eq!(grid.field(key(FieldKind::Comments, 9)), FieldValue::plain(""));
    }

    #[test]
    fn test_set_field_out_of_range() {
        let mut grid = FormGrid::with_blank_row();
        let result = grid.set_field(key(FieldKind::CharNo, 3), FieldValue::plain("10"));
        assert!(matches!(result, Err(Error::RowOutOfRange { index: 3, len: 1 })));
    }

    #[test]
    fn test_set_field_plain_into_composite() {
        let mut grid = FormGrid::with_blank_row();
        grid.set_field(key(FieldKind::GdtCallout, 0), FieldValue::plain("⏥ 0.02"))
            .unwrap();
        assert_eq!(
            grid.field(key(FieldKind::GdtCallout, 0)),
            FieldValue::Composite { text: "⏥ 0.02".into(), snapshot: None }
        );
    }

    #[test]
    fn test_delete_row_removes_every_field() {
        let mut grid = FormGrid::new();
        for i in 0..3 {
            grid.add_row();
            grid.set_field(key(FieldKind::CharNo, i), FieldValue::plain(format!("op{}", i)))
                .unwrap();
            grid.set_field(key(FieldKind::Comments, i), FieldValue::plain(format!("c{}", i)))
                .unwrap();
            grid.set_designator(i, Some(Designator::Critical)).unwrap();
        }
        grid.set_results_classification(1, Some(ResultsClassification::Attribute))
            .unwrap();
        grid.set_secondary_result(1, Some("Fail".into())).unwrap();

        let removed = grid.delete_row(1).unwrap();
        assert_eq!(removed.char_no, "op1");
        assert_eq!(grid.len(), 2);
        // 後続行は詰まる
        assert_eq!(grid.field(key(FieldKind::CharNo, 1)).text(), "op2");
        assert_eq!(grid.field(key(FieldKind::Comments, 1)).text(), "c2");
        assert!(grid.rows().iter().all(|r| r.char_no != "op1"));
        assert!(grid.rows().iter().all(|r| r.secondary.is_none()));
    }

    #[test]
    fn test_delete_row_out_of_range() {
        let mut grid = FormGrid::with_blank_row();
        assert!(grid.delete_row(1).is_err());
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_classification_clears_secondary() {
        let mut grid = FormGrid::with_blank_row();
        grid.set_results_classification(0, Some(ResultsClassification::Attribute))
            .unwrap();
        grid.set_secondary_result(0, Some("Pass".into())).unwrap();

        // 同じ値の再設定でも消える
        grid.set_results_classification(0, Some(ResultsClassification::Attribute))
            .unwrap();
        assert_eq!(grid.row(0).unwrap().secondary, None);

        grid.set_secondary_result(0, Some("Fail".into())).unwrap();
        grid.set_field(key(FieldKind::ResultsClassification, 0), FieldValue::plain("Variable"))
            .unwrap();
        assert_eq!(grid.row(0).unwrap().secondary, None);
        assert_eq!(
            grid.row(0).unwrap().classification,
            Some(ResultsClassification::Variable)
        );
    }

    #[test]
    fn test_secondary_stored_verbatim() {
        let mut grid = FormGrid::with_blank_row();
        grid.set_results_classification(0, Some(ResultsClassification::Attribute))
            .unwrap();
        // 整合チェックはしない
        grid.set_secondary_result(0, Some("12.7".into())).unwrap();
        assert_eq!(grid.row(0).unwrap().secondary.as_deref(), Some("12.7"));
    }

    #[test]
    fn test_empty_secondary_is_unset() {
        let mut grid = FormGrid::with_blank_row();
        grid.set_results_classification(0, Some(ResultsClassification::Variable))
            .unwrap();
        grid.set_secondary_result(0, Some(String::new())).unwrap();
        assert_eq!(grid.row(0).unwrap().secondary, None);
    }

    #[test]
    fn test_tolerance_subfield_writes_are_unconditional() {
        let mut grid = FormGrid::with_blank_row();
        grid.set_tolerance_type(0, Some(ToleranceType::Bilateral)).unwrap();
        grid.set_field(
            key(FieldKind::Tolerance(ToleranceField::SymNominal), 0),
            FieldValue::plain("7"),
        )
        .unwrap();
        assert_eq!(grid.row(0).unwrap().requirement.tolerance.sym_nominal, "7");
    }

    #[test]
    fn test_invalid_dropdown_value() {
        let mut grid = FormGrid::with_blank_row();
        let result = grid.set_field(key(FieldKind::ToleranceType, 0), FieldValue::plain("Loose"));
        assert!(matches!(result, Err(Error::InvalidValue { .. })));

        grid.set_field(key(FieldKind::ToleranceType, 0), FieldValue::plain("Basic Dimension"))
            .unwrap();
        assert_eq!(
            grid.field(key(FieldKind::ToleranceType, 0)).text(),
            "Basic Dimension"
        );
    }

    #[test]
    fn test_set_snapshot_only_on_composite() {
        let mut grid = FormGrid::with_blank_row();
        let snapshot = Snapshot::from_png(tiny_png(2, 2));
        assert!(matches!(
            grid.set_snapshot(key(FieldKind::Comments, 0), snapshot.clone()),
            Err(Error::SnapshotNotAllowed(_))
        ));

        grid.set_field(key(FieldKind::GdtCallout, 0), FieldValue::plain("true position"))
            .unwrap();
        grid.set_snapshot(key(FieldKind::GdtCallout, 0), snapshot.clone())
            .unwrap();
        let value = grid.field(key(FieldKind::GdtCallout, 0));
        assert_eq!(value.text(), "true position");
        assert_eq!(value.snapshot(), Some(&snapshot));
    }

    #[test]
    fn test_append_extracted_reuses_blank_tail() {
        let mut grid = FormGrid::with_blank_row();
        let item = ExtractedRow {
            operation: "10".into(),
            feature_no: "3".into(),
            drawing_ref: "B4".into(),
            description: "Ø12 H7".into(),
        };
        assert_eq!(grid.append_extracted(&item), 0);
        assert_eq!(grid.append_extracted(&item), 1);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.row(1).unwrap().requirement.description, "Ø12 H7");
        assert_eq!(grid.row(1).unwrap().bubble_no, "3");
    }

    #[test]
    fn test_header_merge_prefers_non_empty() {
        let handoff = HeaderFields {
            part_number: "PN-1".into(),
            ..Default::default()
        };
        let stored = HeaderFields {
            part_number: "OLD".into(),
            part_name: "Bracket".into(),
            ..Default::default()
        };
        let merged = handoff.merged_over(&stored);
        assert_eq!(merged.part_number, "PN-1");
        assert_eq!(merged.part_name, "Bracket");
        assert_eq!(merged.serial_number, "");
    }
}
