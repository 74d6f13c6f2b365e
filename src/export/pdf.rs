//! Form 3 のPDF描画（printpdf）
//!
//! 配置は `fair_form_common::export::pdf_core::plan_document` が決め、
//! ここでは上端基準の mm 座標を PDF の下端基準へ変換して描くだけ。

use crate::error::Result;
use fair_form_common::export::pdf_core::{plan_document, PdfRowLayout, SnapshotPlacement};
use fair_form_common::layout::{mm_to_pt, PdfLayout, PDF_HEADERS, PDF_TITLE, REQUIREMENT_COLUMN};
use fair_form_common::FormGrid;
use printpdf::{
    BuiltinFont, Line, LinePoint, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Point, Pt, RawImage,
    RawImageData, RawImageFormat, TextItem, XObjectTransform,
};
use std::path::Path;

/// セル内テキストの上余白
const TEXT_TOP_MM: f32 = 1.5;

const IMAGE_LOAD_ERROR: &str = "Image load error";

struct PageCanvas<'a> {
    layout: &'a PdfLayout,
    ops: Vec<Op>,
}

impl<'a> PageCanvas<'a> {
    fn new(layout: &'a PdfLayout) -> Self {
        Self {
            layout,
            ops: vec![Op::SetOutlineThickness { pt: Pt(0.5) }],
        }
    }

    /// 上端からの mm をPDF座標の点へ
    fn point(&self, x_mm: f32, top_mm: f32) -> Point {
        Point::new(Mm(x_mm), Mm(self.layout.page_height_mm - top_mm))
    }

    fn text(&mut self, x_mm: f32, baseline_mm: f32, size_pt: f32, font: BuiltinFont, text: &str) {
        if text.is_empty() {
            return;
        }
        let pos = self.point(x_mm, baseline_mm);
        self.ops.extend([
            Op::StartTextSection,
            Op::SetFontSizeBuiltinFont {
                size: Pt(size_pt),
                font,
            },
            Op::SetTextCursor { pos },
            Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(text.to_string())],
                font,
            },
            Op::EndTextSection,
        ]);
    }

    /// 折り返し済みの行をセル内に並べる
    fn lines(&mut self, x_mm: f32, top_mm: f32, lines: &[String], size_pt: f32, font: BuiltinFont) {
        let line_height = self.layout.line_height_mm;
        let inset = self.layout.cell_padding_mm / 2.0;
        for (i, line) in lines.iter().enumerate() {
            let baseline = top_mm + TEXT_TOP_MM + line_height * (i as f32 + 1.0) - 1.0;
            self.text(x_mm + inset, baseline, size_pt, font, line);
        }
    }

    fn rect(&mut self, x_mm: f32, top_mm: f32, width_mm: f32, height_mm: f32) {
        let corners = [
            (x_mm, top_mm),
            (x_mm + width_mm, top_mm),
            (x_mm + width_mm, top_mm + height_mm),
            (x_mm, top_mm + height_mm),
        ];
        let points = corners
            .iter()
            .map(|&(x, y)| LinePoint {
                p: self.point(x, y),
                bezier: false,
            })
            .collect();
        self.ops.push(Op::DrawLine {
            line: Line {
                points,
                is_closed: true,
            },
        });
    }

    fn column_header(&mut self, top_mm: f32) {
        let xs = self.layout.column_x_mm();
        let widths = self.layout.column_widths_mm();
        let size = self.layout.header_font_size_pt;
        for (i, label) in PDF_HEADERS.iter().enumerate() {
            self.rect(xs[i], top_mm, widths[i], self.layout.header_height_mm);
            let wrapped = fair_form_common::export::pdf_core::wrap_text(
                label,
                widths[i] - self.layout.cell_padding_mm,
                size,
            );
            self.lines(xs[i], top_mm, &wrapped, size, BuiltinFont::HelveticaBold);
        }
    }

    fn row(&mut self, doc: &mut PdfDocument, top_mm: f32, row: &PdfRowLayout) {
        let xs = self.layout.column_x_mm();
        let widths = self.layout.column_widths_mm();
        let size = self.layout.body_font_size_pt;
        for (i, lines) in row.lines.iter().enumerate() {
            self.rect(xs[i], top_mm, widths[i], row.height_mm);
            self.lines(xs[i], top_mm, lines, size, BuiltinFont::Helvetica);
        }

        if let Some(placement) = &row.snapshot {
            let text_height = row.lines[REQUIREMENT_COLUMN].len() as f32 * self.layout.line_height_mm;
            let image_top = top_mm + TEXT_TOP_MM + text_height;
            self.snapshot(doc, xs[REQUIREMENT_COLUMN] + 2.0, image_top, placement);
        }
    }

    /// 画像を置く。読めない画像は代わりに "Image load error" を書いて続行する
    fn snapshot(&mut self, doc: &mut PdfDocument, x_mm: f32, top_mm: f32, placement: &SnapshotPlacement) {
        let decoded = match image::load_from_memory(placement.snapshot.bytes()) {
            Ok(decoded) => decoded.to_rgb8(),
            Err(e) => {
                tracing::warn!("スナップショット読込エラー: {}", e);
                self.text(x_mm, top_mm + 6.0, self.layout.body_font_size_pt, BuiltinFont::Helvetica, IMAGE_LOAD_ERROR);
                return;
            }
        };
        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            return;
        }

        let raw = RawImage {
            pixels: RawImageData::U8(decoded.into_raw()),
            width: width as usize,
            height: height as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let id = doc.add_image(&raw);

        // dpi 72 では1ピクセル = 1pt
        let bottom = self.layout.page_height_mm - (top_mm + placement.height_mm);
        self.ops.push(Op::UseXobject {
            id,
            transform: XObjectTransform {
                translate_x: Some(Pt(mm_to_pt(x_mm))),
                translate_y: Some(Pt(mm_to_pt(bottom))),
                scale_x: Some(mm_to_pt(placement.width_mm) / width as f32),
                scale_y: Some(mm_to_pt(placement.height_mm) / height as f32),
                dpi: Some(72.0),
                ..Default::default()
            },
        });
    }
}

/// PDFをバイト列として生成する
pub fn render_pdf(grid: &FormGrid, layout: &PdfLayout) -> Result<Vec<u8>> {
    let plan = plan_document(grid, layout);
    let mut doc = PdfDocument::new(PDF_TITLE);
    let mut pages = Vec::with_capacity(plan.pages.len());

    for (page_index, page_plan) in plan.pages.iter().enumerate() {
        let mut canvas = PageCanvas::new(layout);

        if page_index == 0 {
            canvas.text(
                layout.margin_mm,
                plan.title_y_mm,
                layout.title_font_size_pt,
                BuiltinFont::HelveticaBold,
                PDF_TITLE,
            );
            let box_width = layout.table_width_mm() / plan.top_boxes.len().max(1) as f32;
            for (i, top_box) in plan.top_boxes.iter().enumerate() {
                let x = layout.margin_mm + box_width * i as f32;
                canvas.rect(x, plan.top_y_mm, box_width, plan.top_height_mm);
                canvas.text(
                    x + 2.0,
                    plan.top_y_mm + 4.0,
                    layout.body_font_size_pt,
                    BuiltinFont::HelveticaBold,
                    top_box.label,
                );
                for (j, line) in top_box.lines.iter().enumerate() {
                    let baseline = plan.top_y_mm + 4.0 + layout.top_line_height_mm * (j as f32 + 1.0);
                    canvas.text(x + 2.0, baseline, layout.body_font_size_pt, BuiltinFont::Helvetica, line);
                }
            }
        }

        if let Some(caption_y) = page_plan.caption_y_mm {
            canvas.text(
                layout.margin_mm,
                caption_y + 4.0,
                layout.caption_font_size_pt,
                BuiltinFont::HelveticaBold,
                "Characteristics",
            );
        }
        if let Some(header_y) = page_plan.header_y_mm {
            canvas.column_header(header_y);
        }
        for placed in &page_plan.rows {
            canvas.row(&mut doc, placed.y_mm, &placed.row);
        }

        pages.push(PdfPage::new(
            Mm(layout.page_width_mm),
            Mm(layout.page_height_mm),
            canvas.ops,
        ));
    }

    doc.pages.extend(pages);
    let mut warnings = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        tracing::debug!(count = warnings.len(), "PDF生成時の警告");
    }
    Ok(bytes)
}

/// PDFファイルを書き出す
pub fn generate_pdf(grid: &FormGrid, layout: &PdfLayout, output_path: &Path) -> Result<()> {
    let bytes = render_pdf(grid, layout)?;
    std::fs::write(output_path, bytes)?;
    Ok(())
}
