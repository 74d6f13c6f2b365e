//! ラスタライズ（画像の読み込み・切り抜き・回転・エンコード、PDFページ描画）

use crate::error::{FairError, Result};
use fair_form_common::crop::{CropPlan, PixelRect};
use fair_form_common::SourceKind;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

pub const JPEG_QUALITY: u8 = 90;

/// ズーム1.0で描画するときの倍率（72dpi → 144dpi）
pub const PDF_RENDER_SCALE: f32 = 2.0;

pub fn load_image(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| FairError::SourceUnreadable(e.to_string()))
}

/// 矩形を画像内に収める（はみ出した部分は切り捨て）
pub fn clamp_rect(rect: PixelRect, width: u32, height: u32) -> Option<PixelRect> {
    let x = rect.x.min(width);
    let y = rect.y.min(height);
    let w = rect.width.min(width - x);
    let h = rect.height.min(height - y);
    if w == 0 || h == 0 {
        None
    } else {
        Some(PixelRect {
            x,
            y,
            width: w,
            height: h,
        })
    }
}

fn rotate(image: DynamicImage, degrees: u16) -> DynamicImage {
    match degrees % 360 {
        90 => image.rotate90(),
        180 => image.rotate180(),
        270 => image.rotate270(),
        _ => image,
    }
}

/// 元解像度で切り抜き、画像なら回転を適用する
pub fn crop_and_rotate(image: &DynamicImage, plan: &CropPlan) -> Result<DynamicImage> {
    let (width, height) = image.dimensions();
    let rect = clamp_rect(plan.rect, width, height).ok_or(fair_form_common::Error::EmptyCrop)?;
    let cropped = image.crop_imm(rect.x, rect.y, rect.width, rect.height);
    Ok(rotate(cropped, plan.rotation))
}

pub fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
    // JPEGはアルファ非対応
    DynamicImage::ImageRgb8(image.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| FairError::Unexpected(format!("JPEGエンコードエラー: {}", e)))?;
    Ok(buffer)
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| FairError::Unexpected(format!("PNGエンコードエラー: {}", e)))?;
    Ok(buffer.into_inner())
}

// ============================================
// PDFページ
// ============================================

/// PDFページを画像として描画する境界
pub trait PageRasterizer {
    fn page_count(&self, pdf: &[u8]) -> Result<u32>;

    /// page は1始まり、rotation は度（0/90/180/270）
    fn render_page(&self, pdf: &[u8], page: u32, zoom: f64, rotation: u16) -> Result<DynamicImage>;
}

#[cfg(feature = "pdfium")]
mod pdfium_backend {
    use super::*;
    use image::RgbaImage;
    use pdfium_render::prelude::*;

    pub struct PdfiumRasterizer {
        pdfium: Pdfium,
    }

    impl PdfiumRasterizer {
        /// カレントディレクトリのライブラリ、無ければシステムのライブラリを使う
        pub fn new() -> Result<Self> {
            let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library())
                .map_err(|e| FairError::RasterEngineUnavailable(e.to_string()))?;
            Ok(Self {
                pdfium: Pdfium::new(bindings),
            })
        }

        fn open<'a>(&'a self, pdf: &'a [u8]) -> Result<PdfDocument<'a>> {
            self.pdfium
                .load_pdf_from_byte_slice(pdf, None)
                .map_err(|e| FairError::SourceUnreadable(format!("PDFを読み込めません: {}", e)))
        }
    }

    impl PageRasterizer for PdfiumRasterizer {
        fn page_count(&self, pdf: &[u8]) -> Result<u32> {
            let document = self.open(pdf)?;
            Ok(document.pages().len() as u32)
        }

        fn render_page(&self, pdf: &[u8], page: u32, zoom: f64, rotation: u16) -> Result<DynamicImage> {
            let document = self.open(pdf)?;
            let index = page
                .saturating_sub(1)
                .try_into()
                .map_err(|_| FairError::SourceUnreadable(format!("ページ番号が不正です: {}", page)))?;
            let pdf_page = document
                .pages()
                .get(index)
                .map_err(|e| FairError::SourceUnreadable(e.to_string()))?;

            let rotation = match rotation % 360 {
                90 => PdfPageRenderRotation::Degrees90,
                180 => PdfPageRenderRotation::Degrees180,
                270 => PdfPageRenderRotation::Degrees270,
                _ => PdfPageRenderRotation::None,
            };
            let config = PdfRenderConfig::new()
                .scale_page_by_factor(zoom as f32 * PDF_RENDER_SCALE)
                .rotate(rotation, false);

            let bitmap = pdf_page
                .render_with_config(&config)
                .map_err(|e| FairError::SourceUnreadable(format!("ページ描画エラー: {}", e)))?;
            let width = bitmap.width() as u32;
            let height = bitmap.height() as u32;
            RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes())
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(|| FairError::SourceUnreadable("ビットマップ変換エラー".into()))
        }
    }
}

#[cfg(feature = "pdfium")]
pub use pdfium_backend::PdfiumRasterizer;

/// 利用可能なPDF描画エンジンを返す
#[cfg(feature = "pdfium")]
pub fn default_rasterizer() -> Result<Box<dyn PageRasterizer>> {
    Ok(Box::new(PdfiumRasterizer::new()?))
}

#[cfg(not(feature = "pdfium"))]
pub fn default_rasterizer() -> Result<Box<dyn PageRasterizer>> {
    Err(FairError::RasterEngineUnavailable(
        "pdfium 機能を有効にしてビルドしてください".into(),
    ))
}

// ============================================
// 読み込み済みソース
// ============================================

/// 読み込んだファイル（バイト列と種別）
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub kind: SourceKind,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    /// 現在の表示状態（ページ・ズーム・回転）での描画結果
    pub fn render(
        &self,
        page: u32,
        zoom: f64,
        page_rotation: u16,
        rasterizer: Option<&dyn PageRasterizer>,
    ) -> Result<DynamicImage> {
        match self.kind {
            SourceKind::Image => load_image(&self.bytes),
            SourceKind::PdfPage => {
                let rasterizer = rasterizer.ok_or_else(|| {
                    FairError::RasterEngineUnavailable("PDF描画エンジンが未初期化です".into())
                })?;
                rasterizer.render_page(&self.bytes, page, zoom, page_rotation)
            }
        }
    }

    /// 切り抜き指示どおりの画像を作る
    pub fn rasterize(
        &self,
        plan: &CropPlan,
        zoom: f64,
        rasterizer: Option<&dyn PageRasterizer>,
    ) -> Result<DynamicImage> {
        let rendered = self.render(plan.page, zoom, plan.page_rotation, rasterizer)?;
        crop_and_rotate(&rendered, plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn plan(rect: PixelRect, rotation: u16) -> CropPlan {
        CropPlan {
            source: SourceKind::Image,
            rect,
            rotation,
            page: 1,
            page_rotation: 0,
        }
    }

    fn rect(x: u32, y: u32, width: u32, height: u32) -> PixelRect {
        PixelRect { x, y, width, height }
    }

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([x as u8, y as u8, 0])
        }))
    }

    #[test]
    fn test_clamp_rect_inside() {
        assert_eq!(clamp_rect(rect(10, 10, 20, 20), 100, 100), Some(rect(10, 10, 20, 20)));
    }

    #[test]
    fn test_clamp_rect_overflow() {
        assert_eq!(clamp_rect(rect(90, 95, 50, 50), 100, 100), Some(rect(90, 95, 10, 5)));
        assert_eq!(clamp_rect(rect(120, 0, 5, 5), 100, 100), None);
    }

    #[test]
    fn test_crop_and_rotate() {
        let image = gradient(100, 50);
        let cropped = crop_and_rotate(&image, &plan(rect(10, 5, 30, 20), 0)).unwrap();
        assert_eq!(cropped.dimensions(), (30, 20));
        assert_eq!(cropped.to_rgb8().get_pixel(0, 0), &Rgb([10, 5, 0]));

        let rotated = crop_and_rotate(&image, &plan(rect(10, 5, 30, 20), 90)).unwrap();
        assert_eq!(rotated.dimensions(), (20, 30));
    }

    #[test]
    fn test_crop_outside_is_empty() {
        let image = gradient(10, 10);
        let result = crop_and_rotate(&image, &plan(rect(50, 50, 5, 5), 0));
        assert!(matches!(
            result,
            Err(FairError::Form(fair_form_common::Error::EmptyCrop))
        ));
    }

    #[test]
    fn test_encode_jpeg_and_png() {
        let image = gradient(16, 8);
        let jpeg = encode_jpeg(&image).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let png = encode_png(&image).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
        assert_eq!(load_image(&png).unwrap().dimensions(), (16, 8));
    }

    #[test]
    fn test_load_garbage_is_unreadable() {
        assert!(matches!(
            load_image(b"not an image"),
            Err(FairError::SourceUnreadable(_))
        ));
    }

    #[test]
    fn test_pdf_without_rasterizer() {
        let source = SourceFile {
            name: "drawing.pdf".into(),
            kind: SourceKind::PdfPage,
            bytes: b"%PDF-1.4".to_vec(),
        };
        let mut plan = plan(rect(0, 0, 5, 5), 0);
        plan.source = SourceKind::PdfPage;
        assert!(matches!(
            source.rasterize(&plan, 1.2, None),
            Err(FairError::RasterEngineUnavailable(_))
        ));
    }
}
