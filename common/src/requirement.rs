//! 帳票用の表示値
//!
//! PDFとExcelで共通の「Requirement」セル・結果・特性番号の組み立て。

use crate::classification::ResultsClassification;
use crate::grid::{Requirement, Row};

/// 公差行（`Tol: {type}` と有効なサブフィールド）
pub fn specification_lines(req: &Requirement) -> Vec<String> {
    let Some(tolerance_type) = req.tolerance_type else {
        return Vec::new();
    };
    let mut lines = vec![format!("Tol: {}", tolerance_type.label())];
    for (label, value) in req.tolerance.active_fields(tolerance_type) {
        lines.push(format!("{}: {}", label, value));
    }
    lines
}

/// Requirement セルの行（説明 → 公差 → 単位 → GD&T の順）
pub fn requirement_lines(req: &Requirement) -> Vec<String> {
    let mut lines = Vec::new();
    if !req.description.is_empty() {
        lines.push(format!("Desc: {}", req.description));
    }
    lines.extend(specification_lines(req));
    if !req.units.is_empty() {
        lines.push(format!("Units: {}", req.units));
    }
    if !req.gdt.text.is_empty() {
        lines.push(format!("GD&T: {}", req.gdt.text));
    }
    lines
}

pub fn requirement_text(req: &Requirement) -> String {
    requirement_lines(req).join("\n")
}

/// 9. Results の表示値
pub fn resolve_results(row: &Row) -> String {
    match row.classification {
        Some(ResultsClassification::Attribute) | Some(ResultsClassification::Variable) => {
            row.secondary.clone().unwrap_or_default()
        }
        Some(ResultsClassification::NotReportable) => "Not Reportable".to_string(),
        None => String::new(),
    }
}

/// 5. Char. No.（バブル番号があれば `op#bubble`）
pub fn char_no_display(row: &Row) -> String {
    if row.bubble_no.is_empty() {
        row.char_no.clone()
    } else {
        format!("{}#{}", row.char_no, row.bubble_no)
    }
}

pub fn designator_display(row: &Row) -> &'static str {
    row.designator.map(|d| d.label()).unwrap_or("")
}
