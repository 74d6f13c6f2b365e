//! 下書きのJSONスキーマ
//!
//! 保存形式は従来のフラットなキー（`cell-char-0`, `req-bilat-high-1` など）を維持し、
//! 内部の行レコードとの相互変換だけをここで行う。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::field::{CompositeValue, FieldKind, FieldValue, RowIndex};
use crate::grid::{FormGrid, HeaderFields, Row};
use crate::tolerance::ToleranceField;

/// 下書きスキーマのバージョン
pub const SCHEMA_VERSION: u32 = 1;

/// 復元できる行数の上限
pub const MAX_DRAFT_ROWS: usize = 10_000;

/// 保存キー
pub const KEY_FORM_DATA: &str = "form3Data";
pub const KEY_RESULTS: &str = "resultsValue";
pub const KEY_SECONDARY: &str = "secondaryResults";
pub const KEY_EXTRA: &str = "extraField";
pub const KEY_TOP: &str = "form3Top";
pub const KEY_META: &str = "form3Meta";

pub const ALL_KEYS: [&str; 6] = [
    KEY_FORM_DATA,
    KEY_RESULTS,
    KEY_SECONDARY,
    KEY_EXTRA,
    KEY_TOP,
    KEY_META,
];

/// 特性区分を保存する extraField のサブキー
const DESIGNATOR_COLUMN: &str = "2";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftMeta {
    pub version: u32,
    pub row_count: usize,
}

/// 保存単位ごとのJSON
#[derive(Debug, Clone, PartialEq)]
pub struct DraftEntries {
    pub form_data: Map<String, Value>,
    pub results: Map<String, Value>,
    pub secondary: Map<String, Value>,
    pub extra: Map<String, Value>,
    pub top: HeaderFields,
    pub meta: DraftMeta,
}

// ============================================
// フラットキー
// ============================================

/// `form3Data` に保存するフィールド
fn flat_kinds() -> impl Iterator<Item = FieldKind> {
    FieldKind::all().into_iter().filter(|kind| {
        !matches!(
            kind,
            FieldKind::Designator | FieldKind::ResultsClassification | FieldKind::SecondaryResult
        )
    })
}

/// 行フィールドのフラットキー
pub fn flat_key(kind: FieldKind, row: RowIndex) -> Option<String> {
    let key = match kind {
        FieldKind::CharNo => format!("cell-char-{}", row),
        FieldKind::BubbleNo => format!("cell-bubble-{}", row),
        FieldKind::ReferenceLocation => format!("cell-{}-1", row),
        FieldKind::Tooling => format!("cell-{}-5", row),
        FieldKind::NonconformanceNumber => format!("cell-{}-6", row),
        FieldKind::Comments => format!("cell-{}-7", row),
        FieldKind::RequirementDescription => format!("req-desc-{}", row),
        FieldKind::ToleranceType => format!("req-tol-{}", row),
        FieldKind::Tolerance(field) => format!("{}-{}", field.key_prefix(), row),
        FieldKind::Units => format!("req-units-{}", row),
        FieldKind::GdtCallout => format!("req-gdt-{}", row),
        FieldKind::BonusTolerance => format!("req-bonus-{}", row),
        FieldKind::Designator | FieldKind::ResultsClassification | FieldKind::SecondaryResult => {
            return None
        }
    };
    Some(key)
}

fn req_kind(prefix: &str) -> Option<FieldKind> {
    let kind = match prefix {
        "req-desc" => FieldKind::RequirementDescription,
        "req-tol" => FieldKind::ToleranceType,
        "req-units" => FieldKind::Units,
        "req-gdt" => FieldKind::GdtCallout,
        "req-bonus" => FieldKind::BonusTolerance,
        _ => {
            let field = ToleranceField::ALL.iter().find(|f| f.key_prefix() == prefix)?;
            FieldKind::Tolerance(*field)
        }
    };
    Some(kind)
}

/// フラットキーを (種別, 行) に分解
pub fn parse_flat_key(key: &str) -> Option<(FieldKind, RowIndex)> {
    if let Some(rest) = key.strip_prefix("cell-") {
        if let Some(n) = rest.strip_prefix("char-") {
            return Some((FieldKind::CharNo, n.parse().ok()?));
        }
        if let Some(n) = rest.strip_prefix("bubble-") {
            return Some((FieldKind::BubbleNo, n.parse().ok()?));
        }
        let (row, column) = rest.split_once('-')?;
        let kind = match column {
            "1" => FieldKind::ReferenceLocation,
            "5" => FieldKind::Tooling,
            "6" => FieldKind::NonconformanceNumber,
            "7" => FieldKind::Comments,
            _ => return None,
        };
        return Some((kind, row.parse().ok()?));
    }

    let (prefix, row) = key.rsplit_once('-')?;
    Some((req_kind(prefix)?, row.parse().ok()?))
}

/// extraField のキー `"{row}-{column}"` から行を取り出す
fn extra_row(key: &str) -> Option<RowIndex> {
    key.split_once('-').and_then(|(row, _)| row.parse().ok())
}

fn header_entries(header: &HeaderFields) -> [(String, &str); 4] {
    [
        ("top-0".to_string(), header.part_number.as_str()),
        ("top-1".to_string(), header.part_name.as_str()),
        ("top-2".to_string(), header.serial_number.as_str()),
        ("top-3".to_string(), header.fair_identifier.as_str()),
    ]
}

// ============================================
// エンコード / デコード
// ============================================

/// グリッドを保存形式へ変換（空の値は書かない）
pub fn encode(grid: &FormGrid) -> Result<DraftEntries> {
    let mut form_data = Map::new();
    for (key, value) in header_entries(&grid.header) {
        form_data.insert(key, Value::String(value.to_string()));
    }

    let mut results = Map::new();
    let mut secondary = Map::new();
    let mut extra = Map::new();

    for (index, row) in grid.rows().iter().enumerate() {
        for kind in flat_kinds() {
            let value = row.get(kind);
            if value.is_blank() {
                continue;
            }
            if let Some(key) = flat_key(kind, index) {
                let json = match value {
                    FieldValue::Plain(text) => Value::String(text),
                    composite => serde_json::to_value(&composite)?,
                };
                form_data.insert(key, json);
            }
        }

        if let Some(classification) = row.classification {
            results.insert(index.to_string(), Value::String(classification.label().to_string()));
        }
        if let Some(value) = &row.secondary {
            secondary.insert(index.to_string(), Value::String(value.clone()));
        }
        if let Some(designator) = row.designator {
            extra.insert(
                format!("{}-{}", index, DESIGNATOR_COLUMN),
                Value::String(designator.label().to_string()),
            );
        }
    }

    Ok(DraftEntries {
        form_data,
        results,
        secondary,
        extra,
        top: grid.header.clone(),
        meta: DraftMeta {
            version: SCHEMA_VERSION,
            row_count: grid.len(),
        },
    })
}

fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// 保存済みの各マップから参照されている最大行番号
pub fn max_referenced_row(
    form_data: &Map<String, Value>,
    results: &Map<String, Value>,
    secondary: &Map<String, Value>,
    extra: &Map<String, Value>,
) -> Option<RowIndex> {
    let from_form = form_data.keys().filter_map(|k| parse_flat_key(k).map(|(_, row)| row));
    let from_results = results.keys().filter_map(|k| k.parse::<RowIndex>().ok());
    let from_secondary = secondary.keys().filter_map(|k| k.parse::<RowIndex>().ok());
    let from_extra = extra.keys().filter_map(|k| extra_row(k));
    from_form
        .chain(from_results)
        .chain(from_secondary)
        .chain(from_extra)
        .max()
}

/// 保存形式からグリッドを復元する
///
/// 行数は `meta.rowCount` と参照されている最大行番号+1 の大きい方（最低1行）。
/// 行数が `MAX_DRAFT_ROWS` を超える下書きは壊れているものとして拒否する。
/// ドロップダウンに無い値は読み飛ばす。
pub fn decode(
    header: HeaderFields,
    form_data: &Map<String, Value>,
    results: &Map<String, Value>,
    secondary: &Map<String, Value>,
    extra: &Map<String, Value>,
    meta: Option<DraftMeta>,
) -> Result<FormGrid> {
    let scanned = match max_referenced_row(form_data, results, secondary, extra) {
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| Error::Store(format!("row index {} is out of range", max)))?,
        None => 0,
    };
    let row_count = meta.map(|m| m.row_count).unwrap_or(0).max(scanned).max(1);
    if row_count > MAX_DRAFT_ROWS {
        return Err(Error::Store(format!(
            "draft has {} rows (limit {})",
            row_count, MAX_DRAFT_ROWS
        )));
    }
    let mut rows = vec![Row::default(); row_count];

    for (key, value) in form_data {
        let Some((kind, index)) = parse_flat_key(key) else {
            continue;
        };
        let row = &mut rows[index];
        let field_value = match kind {
            // 旧形式（文字列・data URL のみ）も受け付ける
            FieldKind::GdtCallout => CompositeValue::from_legacy_json(value).to_field_value(),
            _ => FieldValue::Plain(json_text(value)),
        };
        row.set(kind, field_value).ok();
    }

    for (key, value) in extra {
        let is_designator = key
            .split_once('-')
            .is_some_and(|(_, column)| column == DESIGNATOR_COLUMN);
        if let (true, Some(index)) = (is_designator, extra_row(key)) {
            rows[index]
                .set(FieldKind::Designator, FieldValue::Plain(json_text(value)))
                .ok();
        }
    }

    // 区分の設定は二次値を消すので先に行う
    for (key, value) in results {
        if let Ok(index) = key.parse::<RowIndex>() {
            rows[index]
                .set(FieldKind::ResultsClassification, FieldValue::Plain(json_text(value)))
                .ok();
        }
    }
    for (key, value) in secondary {
        if let Ok(index) = key.parse::<RowIndex>() {
            let text = json_text(value);
            rows[index].secondary = if text.is_empty() { None } else { Some(text) };
        }
    }

    Ok(FormGrid::from_rows(header, rows))
}
