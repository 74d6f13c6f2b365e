//! fair-portal: FAIR Form 3（特性一覧）の編集・OCR取込・帳票出力
//!
//! 純粋なフォームモデルは `fair_form_common` にあり、
//! このクレートはI/O（HTTP・ファイル・ラスタライズ・CLI）を担う。

pub mod capture;
pub mod cli;
pub mod config;
pub mod draft_store;
pub mod error;
pub mod export;
pub mod import;
pub mod logging;
pub mod ocr;
pub mod raster;
pub mod spreadsheet;
pub mod voice;
