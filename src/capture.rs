//! 切り抜き → OCR / スナップショット → フィールド反映
//!
//! 失敗時はフィールドを変更せず、セッションにエラーを残して Idle へ戻す。

use crate::error::{FairError, Result};
use crate::ocr::TextRecognizer;
use crate::raster::{self, PageRasterizer, SourceFile};
use fair_form_common::{CropSession, FieldKey, FormGrid, Snapshot};
use image::GenericImageView;
use std::path::Path;

/// ファイルを開いてセッションに読み込む
///
/// 非対応形式やPDF描画エンジン未準備のときはセッションを変えない。
pub fn open_source(
    session: &mut CropSession,
    path: &Path,
    rasterizer: Option<&dyn PageRasterizer>,
) -> Result<SourceFile> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let kind = fair_form_common::crop::classify_source(&name, None)?;
    let bytes = std::fs::read(path)?;

    let page_count = match kind {
        fair_form_common::SourceKind::Image => {
            raster::load_image(&bytes)?;
            1
        }
        fair_form_common::SourceKind::PdfPage => {
            let rasterizer = rasterizer.ok_or_else(|| {
                FairError::RasterEngineUnavailable("PDF viewer not ready yet.".into())
            })?;
            rasterizer.page_count(&bytes)?
        }
    };

    session.load(kind, page_count);
    tracing::info!(file = %name, ?kind, pages = page_count, "ソース読み込み");
    Ok(SourceFile { name, kind, bytes })
}

/// 現在の表示状態で描画し、その寸法を元サイズとしてセッションに登録する
///
/// displayed は画面上の表示サイズ（省略時は等倍）。
pub fn prepare_geometry(
    session: &mut CropSession,
    source: &SourceFile,
    displayed: Option<(f64, f64)>,
    rasterizer: Option<&dyn PageRasterizer>,
) -> Result<(u32, u32)> {
    let page_rotation = match source.kind {
        fair_form_common::SourceKind::PdfPage => session.rotation(),
        fair_form_common::SourceKind::Image => 0,
    };
    let rendered = source.render(session.page(), session.zoom(), page_rotation, rasterizer)?;
    let (width, height) = rendered.dimensions();
    let native = (width as f64, height as f64);
    session.set_geometry(displayed.unwrap_or(native), native);
    Ok((width, height))
}

/// 選択範囲をOCRし、結果を対象フィールドへ追記する
pub async fn extract_text<R: TextRecognizer>(
    session: &mut CropSession,
    grid: &mut FormGrid,
    key: FieldKey,
    source: &SourceFile,
    rasterizer: Option<&dyn PageRasterizer>,
    recognizer: &R,
) -> Result<String> {
    // 対象行の存在を先に確認（失敗してもセッションは変えない）
    grid.row_mut(key.row)?;
    let zoom = session.zoom();
    let plan = session.begin_extract()?;

    let jpeg = match source
        .rasterize(&plan, zoom, rasterizer)
        .and_then(|image| raster::encode_jpeg(&image))
    {
        Ok(jpeg) => jpeg,
        Err(e) => {
            session.fail(e.to_string());
            return Err(e);
        }
    };

    let merged = match recognizer.recognize(jpeg).await {
        Ok(text) => grid.append_text(key, &text).map(|()| text).map_err(FairError::from),
        Err(e) => Err(e),
    };
    match merged {
        Ok(text) => {
            session.finish();
            tracing::info!(field = %key, chars = text.chars().count(), "OCR反映");
            Ok(text)
        }
        Err(e) => {
            session.fail(e.to_string());
            Err(e)
        }
    }
}

/// 選択範囲をPNGで切り出し、対象フィールドの値を置き換える（PDFのみ）
pub fn insert_snapshot(
    session: &mut CropSession,
    grid: &mut FormGrid,
    key: FieldKey,
    source: &SourceFile,
    rasterizer: Option<&dyn PageRasterizer>,
) -> Result<()> {
    grid.row_mut(key.row)?;
    let zoom = session.zoom();
    let plan = session.begin_snapshot(key.kind.allows_snapshot())?;

    let png = match source
        .rasterize(&plan, zoom, rasterizer)
        .and_then(|image| raster::encode_png(&image))
    {
        Ok(png) => png,
        Err(e) => {
            session.fail(e.to_string());
            return Err(e);
        }
    };

    if let Err(e) = grid.set_snapshot(key, Snapshot::from_png(png)) {
        session.fail(e.to_string());
        return Err(e.into());
    }
    session.finish();
    tracing::info!(field = %key, "スナップショット挿入");
    Ok(())
}
