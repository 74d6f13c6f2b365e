//! Export core modules shared by the CLI exporters.

pub mod pdf_core;

#[cfg(feature = "excel")]
pub mod excel_core;

/// 出力ファイル名
pub const PDF_FILE_NAME: &str = "Form3_FAIR.pdf";
pub const EXCEL_FILE_NAME: &str = "Form3_FAIR.xlsx";
