//! PDF export core utilities.
//!
//! 行の折り返し・行高さ・改ページ位置を計算する。描画はルートクレートの printpdf 側。
//! 座標はすべてページ上端からの mm。

use crate::field::Snapshot;
use crate::grid::{FormGrid, HeaderFields, Row};
use crate::layout::{PdfLayout, REQUIREMENT_COLUMN};
use crate::requirement::{char_no_display, designator_display, requirement_text, resolve_results};

/// 1文字の幅（em）。等幅近似で、全角は1em。
fn char_width_em(c: char) -> f32 {
    if c.is_ascii() {
        0.5
    } else if c.len_utf8() >= 3 {
        1.0
    } else {
        0.6
    }
}

fn text_width_mm(text: &str, font_size_pt: f32) -> f32 {
    let em_mm = font_size_pt * 25.4 / 72.0;
    text.chars().map(|c| char_width_em(c) * em_mm).sum()
}

/// 幅に収まるよう折り返す（改行は保持、長い単語は文字単位で分割）
pub fn wrap_text(text: &str, width_mm: f32, font_size_pt: f32) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split(' ') {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if text_width_mm(&candidate, font_size_pt) <= width_mm {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            // 単語自体が収まらない場合は文字単位
            for c in word.chars() {
                current.push(c);
                if text_width_mm(&current, font_size_pt) > width_mm && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                }
            }
        }
        lines.push(current);
    }
    lines
}

/// 1行分のセル文字列（PDFの8列）
pub fn row_cells(row: &Row) -> [String; 8] {
    [
        char_no_display(row),
        row.reference_location.clone(),
        designator_display(row).to_string(),
        requirement_text(&row.requirement),
        resolve_results(row),
        row.tooling.clone(),
        row.nonconformance_number.clone(),
        row.comments.clone(),
    ]
}

/// スナップショットの配置
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotPlacement {
    pub snapshot: Snapshot,
    pub width_mm: f32,
    pub height_mm: f32,
}

/// 1行のレイアウト
#[derive(Debug, Clone, PartialEq)]
pub struct PdfRowLayout {
    pub index: usize,
    pub lines: [Vec<String>; 8],
    pub snapshot: Option<SnapshotPlacement>,
    pub height_mm: f32,
}

/// 画像寸法が読めない場合のスナップショット高さ
const FALLBACK_SNAPSHOT_HEIGHT_MM: f32 = 20.0;

pub fn layout_row(index: usize, row: &Row, layout: &PdfLayout) -> PdfRowLayout {
    let widths = layout.column_widths_mm();
    let cells = row_cells(row);
    let mut lines: [Vec<String>; 8] = Default::default();
    for (i, cell) in cells.iter().enumerate() {
        lines[i] = wrap_text(cell, widths[i] - layout.cell_padding_mm, layout.body_font_size_pt);
    }

    let snapshot = row.requirement.gdt.snapshot.as_ref().map(|snapshot| {
        let width_mm = layout.snapshot_width_mm();
        let height_mm = snapshot
            .png_dimensions()
            .filter(|(w, _)| *w > 0)
            .map(|(w, h)| width_mm * h as f32 / w as f32)
            .unwrap_or(FALLBACK_SNAPSHOT_HEIGHT_MM);
        SnapshotPlacement {
            snapshot: snapshot.clone(),
            width_mm,
            height_mm,
        }
    });

    let mut height_mm = layout.min_row_height_mm;
    for (i, cell_lines) in lines.iter().enumerate() {
        let mut cell_height = cell_lines.len() as f32 * layout.line_height_mm;
        if i == REQUIREMENT_COLUMN {
            if let Some(placement) = &snapshot {
                cell_height += placement.height_mm + layout.image_gap_mm;
            }
        }
        height_mm = height_mm.max(cell_height);
    }

    PdfRowLayout {
        index,
        lines,
        snapshot,
        height_mm,
    }
}

// ============================================
// ページ割り
// ============================================

/// 上部の識別フィールド（4つの枠）
#[derive(Debug, Clone, PartialEq)]
pub struct TopBox {
    pub label: &'static str,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedRow {
    pub y_mm: f32,
    pub row: PdfRowLayout,
}

/// 1ページ分の描画位置
#[derive(Debug, Clone, PartialEq)]
pub struct PdfPagePlan {
    /// "Characteristics" 見出しのY（表の最初のページのみ）
    pub caption_y_mm: Option<f32>,
    /// 列見出しのY（表が無いページは None）
    pub header_y_mm: Option<f32>,
    pub rows: Vec<PlacedRow>,
}

impl PdfPagePlan {
    fn table(caption_y_mm: Option<f32>, header_y_mm: f32) -> Self {
        Self {
            caption_y_mm,
            header_y_mm: Some(header_y_mm),
            rows: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PdfDocumentPlan {
    pub title_y_mm: f32,
    pub top_y_mm: f32,
    pub top_boxes: Vec<TopBox>,
    pub top_height_mm: f32,
    pub pages: Vec<PdfPagePlan>,
}

fn top_boxes(header: &HeaderFields, layout: &PdfLayout) -> (Vec<TopBox>, f32) {
    let width = layout.table_width_mm() / 4.0;
    let mut max_height = layout.top_box_min_height_mm;
    let boxes = header
        .labeled()
        .iter()
        .zip(crate::layout::TOP_FIELD_LABELS)
        .map(|((_, value), label)| {
            let lines = wrap_text(value, width - 4.0, layout.body_font_size_pt);
            let height = lines.len() as f32 * layout.top_line_height_mm + 6.0;
            max_height = max_height.max(height);
            TopBox { label, lines }
        })
        .collect();
    (boxes, max_height)
}

/// 全ページの配置を計算する
///
/// 次の行が印刷可能範囲を超えるときに改ページし、新しいページには列見出しを再度置く。
pub fn plan_document(grid: &FormGrid, layout: &PdfLayout) -> PdfDocumentPlan {
    let bottom = layout.printable_bottom_mm();
    let title_y_mm = layout.margin_mm + 5.0;
    let top_y_mm = title_y_mm + 5.0;
    let (top_boxes, top_height_mm) = top_boxes(&grid.header, layout);

    let mut pages = Vec::new();
    let mut y = top_y_mm + top_height_mm + 5.0;

    // 見出しと最低1行分が入らなければ表は次ページから
    if y + layout.min_row_height_mm > bottom {
        pages.push(PdfPagePlan {
            caption_y_mm: None,
            header_y_mm: None,
            rows: Vec::new(),
        });
        y = layout.margin_mm;
    }
    pages.push(PdfPagePlan::table(Some(y), y + 5.0));
    y += 5.0 + layout.header_height_mm;

    for (index, row) in grid.rows().iter().enumerate() {
        let row_layout = layout_row(index, row, layout);
        let page_has_rows = pages.last().is_some_and(|p: &PdfPagePlan| !p.rows.is_empty());
        if y + row_layout.height_mm > bottom && page_has_rows {
            pages.push(PdfPagePlan::table(None, layout.margin_mm));
            y = layout.margin_mm + layout.header_height_mm;
        }
        let height = row_layout.height_mm;
        if let Some(page) = pages.last_mut() {
            page.rows.push(PlacedRow { y_mm: y, row: row_layout });
        }
        y += height;
    }

    PdfDocumentPlan {
        title_y_mm,
        top_y_mm,
        top_boxes,
        top_height_mm,
        pages,
    }
}
