//! Form 3 のExcel出力
//!
//! ブックの組み立ては `fair_form_common::export::excel_core` が行う。

use crate::error::{FairError, Result};
use fair_form_common::export::excel_core::build_workbook;
use fair_form_common::{ExcelLayout, FormGrid};
use std::path::Path;

pub fn generate_excel(grid: &FormGrid, layout: &ExcelLayout, output_path: &Path) -> Result<()> {
    let bytes = build_workbook(grid, layout).map_err(FairError::ExcelGeneration)?;
    std::fs::write(output_path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_excel_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        generate_excel(&FormGrid::with_blank_row(), &ExcelLayout::default(), &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_generate_excel_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.xlsx");
        let result = generate_excel(&FormGrid::with_blank_row(), &ExcelLayout::default(), &path);
        assert!(matches!(result, Err(FairError::Io(_))));
    }
}
