//! 帳票レイアウト定数
//!
//! PDF（A4縦）と Excel の列構成。PDFの寸法はすべて mm。

/// mm → pt
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * 72.0 / 25.4
}

/// pt → mm
pub fn pt_to_mm(pt: f32) -> f32 {
    pt * 25.4 / 72.0
}

/// PDF の列見出し
pub const PDF_HEADERS: [&str; 8] = [
    "5. Char. No.",
    "6. Reference Location",
    "7. Characteristic Designator",
    "8. Requirement",
    "9. Results",
    "10. Tooling",
    "11. Nonconformance No.",
    "12. Comments",
];

/// 表幅に対する各列の割合
pub const PDF_COLUMN_FRACTIONS: [f32; 8] = [0.07, 0.15, 0.12, 0.22, 0.15, 0.10, 0.09, 0.10];

/// Requirement 列（スナップショットを置く列）
pub const REQUIREMENT_COLUMN: usize = 3;

pub const TOP_FIELD_LABELS: [&str; 4] = [
    "1. Part Number",
    "2. Part Name",
    "3. Serial Number",
    "4. FAIR Identifier",
];

pub const PDF_TITLE: &str =
    "Form 3: Characteristic Accountability, Verification and Compatibility Evaluation";

/// PDFレイアウト設定
#[derive(Debug, Clone, PartialEq)]
pub struct PdfLayout {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    pub header_height_mm: f32,
    pub line_height_mm: f32,
    pub min_row_height_mm: f32,
    /// セル内テキストの左右余白（合計）
    pub cell_padding_mm: f32,
    /// スナップショット下の余白
    pub image_gap_mm: f32,
    pub body_font_size_pt: f32,
    pub header_font_size_pt: f32,
    pub caption_font_size_pt: f32,
    pub title_font_size_pt: f32,
    pub top_box_min_height_mm: f32,
    pub top_line_height_mm: f32,
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self::a4_portrait()
    }
}

impl PdfLayout {
    pub fn a4_portrait() -> Self {
        Self {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_mm: 10.0,
            header_height_mm: 12.0,
            line_height_mm: 4.5,
            min_row_height_mm: 20.0,
            cell_padding_mm: 2.0,
            image_gap_mm: 5.0,
            body_font_size_pt: 8.0,
            header_font_size_pt: 8.0,
            caption_font_size_pt: 11.0,
            title_font_size_pt: 12.0,
            top_box_min_height_mm: 10.0,
            top_line_height_mm: 4.0,
        }
    }

    pub fn table_width_mm(&self) -> f32 {
        self.page_width_mm - self.margin_mm * 2.0
    }

    pub fn column_widths_mm(&self) -> [f32; 8] {
        let width = self.table_width_mm();
        PDF_COLUMN_FRACTIONS.map(|f| width * f)
    }

    /// 各列の左端X
    pub fn column_x_mm(&self) -> [f32; 8] {
        let widths = self.column_widths_mm();
        let mut xs = [0.0; 8];
        let mut x = self.margin_mm;
        for (i, w) in widths.iter().enumerate() {
            xs[i] = x;
            x += w;
        }
        xs
    }

    /// ページ下端の印刷可能限界（上端からの距離）
    pub fn printable_bottom_mm(&self) -> f32 {
        self.page_height_mm - self.margin_mm
    }

    /// スナップショットの幅（Requirement列の内幅）
    pub fn snapshot_width_mm(&self) -> f32 {
        self.column_widths_mm()[REQUIREMENT_COLUMN] - 4.0
    }
}

/// Excel 出力の構成
#[derive(Debug, Clone, PartialEq)]
pub struct ExcelLayout {
    pub form1_sheet: &'static str,
    pub form3_sheet: &'static str,
    /// Form 3 シートの列幅（文字数）
    pub column_widths: [f64; 12],
}

impl Default for ExcelLayout {
    fn default() -> Self {
        Self {
            form1_sheet: "Form 1",
            form3_sheet: "Form 3",
            column_widths: [10.0, 16.0, 14.0, 28.0, 22.0, 18.0, 12.0, 12.0, 14.0, 16.0, 16.0, 24.0],
        }
    }
}

pub const EXCEL_TITLE: &str =
    "Form 3 - Characteristic Accountability, Verification and Compatibility Evaluation";

/// Excel 1段目の見出し（Requirement は 4列を結合）
pub const EXCEL_HEADER_ROW1: [&str; 12] = [
    "Char. No.",
    "Reference Location",
    "Characteristic Designator",
    "Requirement",
    "",
    "",
    "",
    "Bonus Tolerance",
    "Results",
    "Designed / Qualified Tooling",
    "Nonconformance Number",
    "Comments",
];

/// Excel 2段目の見出し（Requirement の内訳）
pub const EXCEL_HEADER_ROW2: [&str; 12] = [
    "",
    "",
    "",
    "Description / Note text",
    "Specification",
    "GD&T Callout",
    "Unit of measurement",
    "",
    "",
    "",
    "",
    "",
];

/// Requirement グループの列範囲
pub const EXCEL_REQUIREMENT_SPAN: (u16, u16) = (3, 6);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mm_pt_conversion() {
        assert!((mm_to_pt(25.4) - 72.0).abs() < 1e-4);
        assert!((pt_to_mm(mm_to_pt(10.0)) - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_column_widths_fill_table() {
        let layout = PdfLayout::a4_portrait();
        let total: f32 = layout.column_widths_mm().iter().sum();
        assert!((total - layout.table_width_mm()).abs() < 1e-3);
        assert!((layout.column_widths_mm()[REQUIREMENT_COLUMN] - 41.8).abs() < 1e-3);
    }

    #[test]
    fn test_column_x_positions() {
        let layout = PdfLayout::a4_portrait();
        let xs = layout.column_x_mm();
        assert_eq!(xs[0], 10.0);
        assert!((xs[1] - (10.0 + 190.0 * 0.07)).abs() < 1e-3);
    }

    #[test]
    fn test_excel_headers_align() {
        assert_eq!(EXCEL_HEADER_ROW1.len(), EXCEL_HEADER_ROW2.len());
        let (first, last) = EXCEL_REQUIREMENT_SPAN;
        assert_eq!(EXCEL_HEADER_ROW1[first as usize], "Requirement");
        assert!(EXCEL_HEADER_ROW2[first as usize..=last as usize]
            .iter()
            .all(|h| !h.is_empty()));
    }
}
