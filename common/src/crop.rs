//! 切り抜きセッションの状態機械
//!
//! `Idle → SourceLoaded → Cropping → (Extracting | SnapshotOnly) → Idle`
//!
//! 描画面には依存せず、表示座標の矩形を元画像のピクセル矩形へ変換した
//! `CropPlan` を返すところまでを扱う。実際のラスタライズはルートクレート側。

use crate::error::{Error, Result};

pub const ZOOM_MIN: f64 = 0.5;
pub const ZOOM_MAX: f64 = 3.0;
pub const ZOOM_STEP: f64 = 0.1;
pub const IMAGE_DEFAULT_ZOOM: f64 = 1.0;
pub const PDF_DEFAULT_ZOOM: f64 = 1.2;

/// 読み込んだソースの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Image,
    PdfPage,
}

impl SourceKind {
    pub fn default_zoom(&self) -> f64 {
        match self {
            SourceKind::Image => IMAGE_DEFAULT_ZOOM,
            SourceKind::PdfPage => PDF_DEFAULT_ZOOM,
        }
    }
}

const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff"];

/// ファイル名（とMIMEタイプ）からソース種別を判定
pub fn classify_source(name: &str, mime: Option<&str>) -> Result<SourceKind> {
    if let Some(mime) = mime {
        let mime = mime.to_ascii_lowercase();
        if mime == "application/pdf" {
            return Ok(SourceKind::PdfPage);
        }
        if mime.starts_with("image/") {
            return Ok(SourceKind::Image);
        }
    }

    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if ext == "pdf" {
        Ok(SourceKind::PdfPage)
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Ok(SourceKind::Image)
    } else {
        Err(Error::UnsupportedFileType(name.to_string()))
    }
}

/// 表示座標の矩形
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_positive(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// 元画像のピクセル矩形
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// ラスタライズ指示
#[derive(Debug, Clone, PartialEq)]
pub struct CropPlan {
    pub source: SourceKind,
    /// 元解像度での切り抜き範囲
    pub rect: PixelRect,
    /// 切り抜き後に適用する回転（画像のみ。PDFは回転済みで描画される）
    pub rotation: u16,
    /// PDFのページ番号（1始まり）
    pub page: u32,
    /// PDFページ描画時の回転
    pub page_rotation: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropState {
    Idle,
    SourceLoaded(SourceKind),
    Cropping(SourceKind),
    Extracting(SourceKind),
    SnapshotOnly,
}

#[derive(Debug, Clone)]
pub struct CropSession {
    state: CropState,
    zoom: f64,
    rotation: u16,
    page: u32,
    page_count: u32,
    crop: Option<Rect>,
    /// 表示サイズ / 元サイズ（幅, 高さ）
    displayed: Option<(f64, f64)>,
    native: Option<(f64, f64)>,
    error: Option<String>,
}

impl Default for CropSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CropSession {
    pub fn new() -> Self {
        Self {
            state: CropState::Idle,
            zoom: IMAGE_DEFAULT_ZOOM,
            rotation: 0,
            page: 1,
            page_count: 1,
            crop: None,
            displayed: None,
            native: None,
            error: None,
        }
    }

    pub fn state(&self) -> CropState {
        self.state
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn rotation(&self) -> u16 {
        self.rotation
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn crop(&self) -> Option<Rect> {
        self.crop
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn source(&self) -> Option<SourceKind> {
        match self.state {
            CropState::Idle => None,
            CropState::SourceLoaded(kind) | CropState::Cropping(kind) | CropState::Extracting(kind) => {
                Some(kind)
            }
            CropState::SnapshotOnly => Some(SourceKind::PdfPage),
        }
    }

    /// ファイル名から種別を判定して読み込む（非対応なら Idle のまま）
    pub fn open(&mut self, name: &str, mime: Option<&str>, page_count: u32) -> Result<SourceKind> {
        let kind = classify_source(name, mime)?;
        self.load(kind, page_count);
        Ok(kind)
    }

    pub fn load(&mut self, kind: SourceKind, page_count: u32) {
        self.state = CropState::SourceLoaded(kind);
        self.page_count = page_count.max(1);
        self.page = 1;
        self.error = None;
        self.displayed = None;
        self.native = None;
        self.reset_view();
    }

    /// 表示サイズと元サイズを設定（縦横独立に倍率を求める）
    pub fn set_geometry(&mut self, displayed: (f64, f64), native: (f64, f64)) {
        self.displayed = Some(displayed);
        self.native = Some(native);
    }

    fn loaded_kind(&self) -> Option<SourceKind> {
        match self.state {
            CropState::SourceLoaded(kind) | CropState::Cropping(kind) => Some(kind),
            _ => None,
        }
    }

    // ============================================
    // 表示操作
    // ============================================

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = ((zoom.clamp(ZOOM_MIN, ZOOM_MAX)) * 100.0).round() / 100.0;
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - ZOOM_STEP);
    }

    /// 90度単位で回転（負数は反時計回り）
    pub fn rotate(&mut self, quarter_turns: i32) {
        let degrees = (self.rotation as i32 + quarter_turns * 90).rem_euclid(360);
        self.rotation = degrees as u16;
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.clamp(1, self.page_count);
        // 描画が変わるので選択は無効
        if self.loaded_kind().is_some() {
            self.clear_crop();
        }
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page.saturating_add(1));
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.page.saturating_sub(1));
    }

    /// 切り抜き・ズーム・回転を既定値へ戻す
    pub fn reset_view(&mut self) {
        self.zoom = self.source().map(|k| k.default_zoom()).unwrap_or(IMAGE_DEFAULT_ZOOM);
        self.rotation = 0;
        self.crop = None;
        if let CropState::Cropping(kind) = self.state {
            self.state = CropState::SourceLoaded(kind);
        }
    }

    // ============================================
    // 切り抜き
    // ============================================

    pub fn set_crop(&mut self, rect: Rect) -> Result<()> {
        let kind = self
            .loaded_kind()
            .ok_or(Error::CropState("no source loaded"))?;
        if rect.is_positive() {
            self.crop = Some(rect);
            self.state = CropState::Cropping(kind);
        } else {
            self.crop = None;
            self.state = CropState::SourceLoaded(kind);
        }
        Ok(())
    }

    pub fn clear_crop(&mut self) {
        self.crop = None;
        if let CropState::Cropping(kind) = self.state {
            self.state = CropState::SourceLoaded(kind);
        }
    }

    /// 「テキスト抽出」が可能か
    pub fn can_extract(&self) -> bool {
        matches!(self.state, CropState::Cropping(_)) && self.crop.is_some_and(|r| r.is_positive())
    }

    /// 「スナップショット挿入」が可能か
    pub fn can_snapshot(&self, allow_snapshot: bool) -> bool {
        allow_snapshot && self.can_extract() && self.loaded_kind() == Some(SourceKind::PdfPage)
    }

    /// 表示座標の矩形を元解像度へ変換
    pub fn native_rect(&self, rect: &Rect) -> PixelRect {
        let (sx, sy) = match (self.displayed, self.native) {
            (Some((dw, dh)), Some((nw, nh))) if dw > 0.0 && dh > 0.0 => (nw / dw, nh / dh),
            _ => (1.0, 1.0),
        };
        let scale = |v: f64, s: f64| (v * s).round().max(0.0) as u32;
        PixelRect {
            x: scale(rect.x, sx),
            y: scale(rect.y, sy),
            width: scale(rect.width, sx),
            height: scale(rect.height, sy),
        }
    }

    fn plan(&self, kind: SourceKind) -> Result<CropPlan> {
        let rect = self.crop.filter(|r| r.is_positive()).ok_or(Error::EmptyCrop)?;
        let (rotation, page_rotation) = match kind {
            SourceKind::Image => (self.rotation, 0),
            SourceKind::PdfPage => (0, self.rotation),
        };
        Ok(CropPlan {
            source: kind,
            rect: self.native_rect(&rect),
            rotation,
            page: self.page,
            page_rotation,
        })
    }

    /// OCR用の切り抜きを開始
    pub fn begin_extract(&mut self) -> Result<CropPlan> {
        let kind = self
            .loaded_kind()
            .ok_or(Error::CropState("no source loaded"))?;
        let plan = self.plan(kind)?;
        self.state = CropState::Extracting(kind);
        Ok(plan)
    }

    /// スナップショット挿入を開始（PDFのみ・許可されたフィールドのみ）
    pub fn begin_snapshot(&mut self, allow_snapshot: bool) -> Result<CropPlan> {
        if !allow_snapshot {
            return Err(Error::CropState("field does not accept snapshots"));
        }
        let kind = self
            .loaded_kind()
            .ok_or(Error::CropState("no source loaded"))?;
        if kind != SourceKind::PdfPage {
            return Err(Error::CropState("snapshots are taken from PDF pages only"));
        }
        let plan = self.plan(kind)?;
        self.state = CropState::SnapshotOnly;
        Ok(plan)
    }

    /// 完了して Idle へ戻る
    pub fn finish(&mut self) {
        self.state = CropState::Idle;
        self.error = None;
        self.reset_view();
        self.displayed = None;
        self.native = None;
    }

    /// 失敗して Idle へ戻る（エラーは閉じるまで保持）
    pub fn fail(&mut self, message: impl Into<String>) {
        self.finish();
        self.error = Some(message.into());
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}
