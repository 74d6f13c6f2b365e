pub mod excel;
pub mod pdf;

use crate::cli::ExportFormat;
use crate::error::Result;
use fair_form_common::export::{EXCEL_FILE_NAME, PDF_FILE_NAME};
use fair_form_common::{ExcelLayout, FormGrid, PdfLayout};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// 出力先ディレクトリに固定名で書き出し、作成したパスを返す
///
/// フォームの状態は変更しない。
pub fn export_form(
    grid: &FormGrid,
    format: ExportFormat,
    output_dir: &Path,
    quiet: bool,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    let mut written = Vec::new();

    if matches!(format, ExportFormat::Pdf | ExportFormat::Both) {
        let path = output_dir.join(PDF_FILE_NAME);
        let pb = spinner("PDFを生成中...", quiet);
        let result = pdf::generate_pdf(grid, &PdfLayout::a4_portrait(), &path);
        pb.finish_and_clear();
        result?;
        tracing::info!(path = %path.display(), rows = grid.len(), "PDF出力");
        written.push(path);
    }

    if matches!(format, ExportFormat::Excel | ExportFormat::Both) {
        let path = output_dir.join(EXCEL_FILE_NAME);
        let pb = spinner("Excelを生成中...", quiet);
        let result = excel::generate_excel(grid, &ExcelLayout::default(), &path);
        pb.finish_and_clear();
        result?;
        tracing::info!(path = %path.display(), rows = grid.len(), "Excel出力");
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_both_fixed_names() {
        let dir = tempfile::tempdir().unwrap();
        let grid = FormGrid::with_blank_row();
        let paths = export_form(&grid, ExportFormat::Both, dir.path(), true).unwrap();
        assert_eq!(
            paths,
            vec![dir.path().join("Form3_FAIR.pdf"), dir.path().join("Form3_FAIR.xlsx")]
        );
        assert!(paths.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_export_single_format() {
        let dir = tempfile::tempdir().unwrap();
        let grid = FormGrid::with_blank_row();
        let paths = export_form(&grid, ExportFormat::Excel, dir.path(), true).unwrap();
        assert_eq!(paths.len(), 1);
        assert!(!dir.path().join("Form3_FAIR.pdf").exists());
    }
}
