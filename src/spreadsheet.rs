//! 検査計画スプレッドシートのオフライン取込（calamine）
//!
//! 抽出サーバーと同じ規則で行を読む:
//! シートは "Sheet2"（無ければ先頭）、1行目は読み飛ばし、2行目が見出し。

use crate::error::{FairError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use fair_form_common::ExtractedRow;
use std::collections::HashMap;
use std::path::Path;

const PREFERRED_SHEET: &str = "Sheet2";
const HEADER_ROW: usize = 1;

const COL_OPERATION: &str = "operation";
const COL_FEATURE: &str = "feature\nnumber";
const COL_DRAWING_REF: &str = "drawing ref";
const COL_DESCRIPTION: &str = "description";

fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        Some(Data::Empty) | None => String::new(),
        Some(data) => data.to_string().trim().to_string(),
    }
}

/// 見出し行から列位置を引く（文字列以外の見出しは無視）
fn header_columns(header: &[Data]) -> HashMap<String, usize> {
    let mut columns = HashMap::new();
    for (i, cell) in header.iter().enumerate() {
        if let Data::String(name) = cell {
            columns.entry(name.trim().to_lowercase()).or_insert(i);
        }
    }
    columns
}

/// 行データを ExtractedRow に変換する（operation が空の行は捨てる）
pub fn rows_from_range(rows: &[Vec<Data>]) -> Vec<ExtractedRow> {
    let Some(header) = rows.get(HEADER_ROW) else {
        return Vec::new();
    };
    let columns = header_columns(header);
    let value = |row: &[Data], name: &str| cell_text(columns.get(name).and_then(|&i| row.get(i)));

    rows.iter()
        .skip(HEADER_ROW + 1)
        .filter_map(|row| {
            let operation = value(row, COL_OPERATION);
            if operation.is_empty() {
                return None;
            }
            Some(ExtractedRow {
                operation,
                feature_no: value(row, COL_FEATURE),
                drawing_ref: value(row, COL_DRAWING_REF),
                description: value(row, COL_DESCRIPTION),
            })
        })
        .collect()
}

/// xlsx / xlsm / xls を読み込んで行を返す
pub fn read_extracted_rows(path: &Path) -> Result<Vec<ExtractedRow>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| FairError::Import(format!("ワークブックを開けません: {}", e)))?;

    let names = workbook.sheet_names();
    let sheet = names
        .iter()
        .find(|n| n.as_str() == PREFERRED_SHEET)
        .or_else(|| names.first())
        .cloned()
        .ok_or_else(|| FairError::Import("シートがありません".into()))?;

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| FairError::Import(format!("シート読み込みエラー ({}): {}", sheet, e)))?;

    // 使用範囲が1行目より下から始まる場合は空行で埋めて行番号を合わせる
    let offset = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let rows: Vec<Vec<Data>> = std::iter::repeat_with(Vec::new)
        .take(offset)
        .chain(range.rows().map(|r| r.to_vec()))
        .collect();
    let extracted = rows_from_range(&rows);
    tracing::info!(sheet = %sheet, rows = extracted.len(), "スプレッドシート読込");
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Data {
        Data::String(text.into())
    }

    #[test]
    fn test_rows_from_range() {
        let rows = vec![
            vec![s("Inspection Planning Sheet")],
            vec![s("Operation"), s(" Feature\nNumber "), s("Drawing Ref"), s("Description")],
            vec![Data::Float(10.0), Data::Int(1), s("SHEET1-A2"), s(" Bore dia ")],
            vec![Data::Empty, s("2"), s("x"), s("no operation")],
            vec![s("20"), Data::Empty, Data::Empty, s("Face")],
        ];
        let extracted = rows_from_range(&rows);
        assert_eq!(extracted.len(), 2);
        assert_eq!(extracted[0].operation, "10");
        assert_eq!(extracted[0].feature_no, "1");
        assert_eq!(extracted[0].drawing_ref, "SHEET1-A2");
        assert_eq!(extracted[0].description, "Bore dia");
        assert_eq!(extracted[1].operation, "20");
        assert_eq!(extracted[1].feature_no, "");
    }

    #[test]
    fn test_missing_header_row() {
        assert!(rows_from_range(&[vec![s("only title")]]).is_empty());
    }

    #[test]
    fn test_unknown_columns_are_blank() {
        let rows = vec![
            vec![],
            vec![s("operation")],
            vec![s("30"), s("ignored")],
        ];
        let extracted = rows_from_range(&rows);
        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted[0].description, "");
    }
}
