//! Excel export core (rust_xlsxwriter)
//!
//! "Form 1"（識別フィールド）と "Form 3"（特性一覧）の2シートを持つブックを作る。

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

use crate::grid::{FormGrid, Row};
use crate::layout::{ExcelLayout, EXCEL_HEADER_ROW1, EXCEL_HEADER_ROW2, EXCEL_REQUIREMENT_SPAN, EXCEL_TITLE};
use crate::requirement::{char_no_display, designator_display, resolve_results, specification_lines};

/// Form 3 シートの1行（12列）
pub fn form3_row(row: &Row) -> [String; 12] {
    [
        char_no_display(row),
        row.reference_location.clone(),
        designator_display(row).to_string(),
        row.requirement.description.clone(),
        specification_lines(&row.requirement).join("\n"),
        row.requirement.gdt.text.clone(),
        row.requirement.units.clone(),
        row.bonus_tolerance.clone(),
        resolve_results(row),
        row.tooling.clone(),
        row.nonconformance_number.clone(),
        row.comments.clone(),
    ]
}

/// Form 1 シートの (Field, Value)
pub fn form1_rows(grid: &FormGrid) -> [(&'static str, String); 4] {
    let h = &grid.header;
    [
        ("Part Number", h.part_number.clone()),
        ("Part Name", h.part_name.clone()),
        ("Serial Number", h.serial_number.clone()),
        ("FAIR ID", h.fair_identifier.clone()),
    ]
}

fn write_form1(worksheet: &mut Worksheet, grid: &FormGrid, bold: &Format) -> Result<(), XlsxError> {
    worksheet.write_string_with_format(0, 0, "Form 1", bold)?;
    worksheet.write_string_with_format(1, 0, "Field", bold)?;
    worksheet.write_string_with_format(1, 1, "Value", bold)?;
    for (i, (label, value)) in form1_rows(grid).iter().enumerate() {
        let row = 2 + i as u32;
        worksheet.write_string(row, 0, *label)?;
        worksheet.write_string(row, 1, value)?;
    }
    worksheet.set_column_width(0, 16)?;
    worksheet.set_column_width(1, 32)?;
    Ok(())
}

fn write_form3(
    worksheet: &mut Worksheet,
    grid: &FormGrid,
    layout: &ExcelLayout,
    title_format: &Format,
    header_format: &Format,
    cell_format: &Format,
) -> Result<(), XlsxError> {
    let last_col = (EXCEL_HEADER_ROW1.len() - 1) as u16;
    worksheet.merge_range(0, 0, 0, last_col, EXCEL_TITLE, title_format)?;

    let (req_first, req_last) = EXCEL_REQUIREMENT_SPAN;
    worksheet.merge_range(1, req_first, 1, req_last, EXCEL_HEADER_ROW1[req_first as usize], header_format)?;
    for col in 0..=last_col {
        if (req_first..=req_last).contains(&col) {
            worksheet.write_string_with_format(2, col, EXCEL_HEADER_ROW2[col as usize], header_format)?;
        } else {
            // グループ外の見出しは2段を縦に結合
            worksheet.merge_range(1, col, 2, col, EXCEL_HEADER_ROW1[col as usize], header_format)?;
        }
    }

    for (i, row) in grid.rows().iter().enumerate() {
        let excel_row = 3 + i as u32;
        for (col, value) in form3_row(row).iter().enumerate() {
            worksheet.write_string_with_format(excel_row, col as u16, value, cell_format)?;
        }
    }

    for (col, width) in layout.column_widths.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }
    Ok(())
}

/// ブックをバイト列として生成する
pub fn build_workbook(grid: &FormGrid, layout: &ExcelLayout) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();

    let bold = Format::new().set_bold();
    let title_format = Format::new()
        .set_bold()
        .set_font_size(12.0)
        .set_align(FormatAlign::Center);
    let header_format = Format::new()
        .set_bold()
        .set_font_size(9.0)
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_border(FormatBorder::Thin);
    let cell_format = Format::new()
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::Top)
        .set_text_wrap()
        .set_border(FormatBorder::Thin);

    let form1 = workbook.add_worksheet();
    form1
        .set_name(layout.form1_sheet)
        .map_err(|e| format!("シート名設定エラー: {}", e))?;
    write_form1(form1, grid, &bold).map_err(|e| format!("Form 1 書き込みエラー: {}", e))?;

    let form3 = workbook.add_worksheet();
    form3
        .set_name(layout.form3_sheet)
        .map_err(|e| format!("シート名設定エラー: {}", e))?;
    write_form3(form3, grid, layout, &title_format, &header_format, &cell_format)
        .map_err(|e| format!("Form 3 書き込みエラー: {}", e))?;

    workbook
        .save_to_buffer()
        .map_err(|e| format!("Excel保存エラー: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::{Designator, ResultsClassification};
    use crate::tolerance::ToleranceType;
    use calamine::{Data, Reader, Xlsx};
    use std::io::Cursor;

    fn sample_grid() -> FormGrid {
        let mut grid = FormGrid::with_blank_row();
        grid.header.part_number = "PN-42".into();
        grid.header.fair_identifier = "FAIR-0042".into();
        {
            let row = grid.row_mut(0).unwrap();
            row.char_no = "10".into();
            row.bubble_no = "2".into();
            row.requirement.description = "Bore".into();
            row.requirement.units = "mm".into();
            row.requirement.gdt.text = "⌀ 0.05".into();
            row.bonus_tolerance = "0.01".into();
        }
        grid.set_designator(0, Some(Designator::Critical)).unwrap();
        grid.set_tolerance_type(0, Some(ToleranceType::UnilateralLower)).unwrap();
        grid.row_mut(0).unwrap().requirement.tolerance.lower = "11.9".into();
        grid.set_results_classification(0, Some(ResultsClassification::Variable))
            .unwrap();
        grid.set_secondary_result(0, Some("11.95".into())).unwrap();
        grid
    }

    #[test]
    fn test_form3_row_columns() {
        let grid = sample_grid();
        let cells = form3_row(grid.row(0).unwrap());
        assert_eq!(cells[0], "10#2");
        assert_eq!(cells[2], "Critical");
        assert_eq!(cells[3], "Bore");
        assert_eq!(cells[4], "Tol: Unilateral Lower\nLower Specification: 11.9");
        assert_eq!(cells[5], "⌀ 0.05");
        assert_eq!(cells[6], "mm");
        assert_eq!(cells[7], "0.01");
        assert_eq!(cells[8], "11.95");
    }

    #[test]
    fn test_build_workbook_sheets() {
        let grid = sample_grid();
        let bytes = build_workbook(&grid, &ExcelLayout::default()).unwrap();
        assert!(bytes.starts_with(b"PK"));

        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Form 1".to_string(), "Form 3".to_string()]);

        let form1 = workbook.worksheet_range("Form 1").unwrap();
        assert_eq!(form1.get_value((2, 1)), Some(&Data::String("PN-42".into())));
        assert_eq!(form1.get_value((5, 0)), Some(&Data::String("FAIR ID".into())));

        let form3 = workbook.worksheet_range("Form 3").unwrap();
        assert_eq!(form3.get_value((1, 3)), Some(&Data::String("Requirement".into())));
        assert_eq!(
            form3.get_value((2, 4)),
            Some(&Data::String("Specification".into()))
        );
        assert_eq!(form3.get_value((3, 0)), Some(&Data::String("10#2".into())));
        assert_eq!(form3.get_value((3, 8)), Some(&Data::String("11.95".into())));
    }
}
