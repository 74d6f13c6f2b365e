use clap::{Parser, Subcommand};
use fair_form_common::{FieldKind, HeaderFields, Rect};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fair-portal")]
#[command(about = "FAIR Form 3（特性一覧）の編集・OCR取込・帳票出力ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 編集するフォームID（省略時は設定値）
    #[arg(long, global = true)]
    pub form: Option<String>,
}

/// 識別フィールド（Form 1 からの引き継ぎ値）
#[derive(clap::Args, Debug, Default, Clone)]
pub struct HeaderArgs {
    #[arg(long)]
    pub part_number: Option<String>,

    #[arg(long)]
    pub part_name: Option<String>,

    #[arg(long)]
    pub serial_number: Option<String>,

    #[arg(long)]
    pub fair_id: Option<String>,
}

impl HeaderArgs {
    /// 未指定の項目は空（= 保存済みの値を使う）
    pub fn to_fields(&self) -> HeaderFields {
        HeaderFields {
            part_number: self.part_number.clone().unwrap_or_default(),
            part_name: self.part_name.clone().unwrap_or_default(),
            serial_number: self.serial_number.clone().unwrap_or_default(),
            fair_identifier: self.fair_id.clone().unwrap_or_default(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// 行データを破棄して新しいフォームを始める（識別フィールドは残す）
    New {
        #[command(flatten)]
        header: HeaderArgs,
    },

    /// 識別フィールドを設定
    Header {
        #[command(flatten)]
        header: HeaderArgs,
    },

    /// フォームの内容を表示
    Show {
        /// JSON（下書き形式）で出力
        #[arg(long)]
        json: bool,
    },

    /// 行の追加・削除
    Row {
        #[command(subcommand)]
        action: RowAction,
    },

    /// フィールドに値を設定（上書き）
    Set {
        /// 行番号（1始まり）
        row: usize,

        /// フィールド名 (char-no, description, sym-nominal, gdt, ...)
        field: FieldKind,

        /// 値（空文字でクリア）
        value: String,
    },

    /// Results の区分を設定（省略でクリア）。副結果は必ずクリアされる
    Classify {
        row: usize,

        /// Variable / Attribute / Not Reportable
        value: Option<String>,
    },

    /// Results の副結果を設定（省略でクリア）
    Secondary {
        row: usize,
        value: Option<String>,
    },

    /// 画像/PDFの範囲を切り抜いてOCR（またはスナップショット挿入）
    Ocr {
        /// 画像またはPDFファイル
        #[arg(required = true)]
        file: PathBuf,

        /// 行番号（1始まり）
        #[arg(short, long)]
        row: usize,

        /// 反映先フィールド
        #[arg(short, long)]
        field: FieldKind,

        /// 切り抜き範囲 x,y,幅,高さ（表示座標）
        #[arg(long, value_parser = parse_rect)]
        rect: Rect,

        /// 表示サイズ 幅x高さ（省略時は元サイズと同じ）
        #[arg(long, value_parser = parse_size)]
        display: Option<(f64, f64)>,

        /// PDFのページ番号（1始まり）
        #[arg(long)]
        page: Option<u32>,

        /// ズーム倍率 (0.5-3.0)
        #[arg(long)]
        zoom: Option<f64>,

        /// 90度単位の回転回数（負数で反時計回り）
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        rotate: i32,

        /// OCRせず画像として挿入（PDFのGD&T欄のみ）
        #[arg(long)]
        snapshot: bool,
    },

    /// 音声入力（1回分）をフィールドへ追記
    Dictate {
        #[arg(short, long)]
        row: usize,

        #[arg(short, long)]
        field: FieldKind,

        /// 書き起こし済みテキスト（省略時は対話入力）
        #[arg(long)]
        text: Option<String>,
    },

    /// 検査計画ファイルから行を一括取込
    Import {
        #[arg(required = true)]
        file: PathBuf,

        /// サーバーを使わずローカルで読む（xlsx/xlsm/xls のみ）
        #[arg(long)]
        offline: bool,
    },

    /// PDF/Excelを出力
    Export {
        /// 出力形式 (pdf/excel/both)
        #[arg(short, long, default_value = "both")]
        format: ExportFormat,

        /// 出力ディレクトリ
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// 下書きの保存先と保存済みキーを表示（--clear で破棄）
    Draft {
        /// 行データの下書きを破棄（識別フィールドは残す）
        #[arg(long)]
        clear: bool,
    },

    /// 設定を表示/編集
    Config {
        /// OCRサーバーのURLを設定
        #[arg(long)]
        set_api_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand)]
pub enum RowAction {
    /// 末尾に空行を追加
    Add,
    /// 行を削除（以降の行は繰り上がる）
    Delete { row: usize },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Excel,
    #[default]
    Both,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "both" => Ok(ExportFormat::Both),
            _ => Err(format!("Unknown format: {}. Use pdf, excel, or both", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Pdf => write!(f, "pdf"),
            ExportFormat::Excel => write!(f, "excel"),
            ExportFormat::Both => write!(f, "both"),
        }
    }
}

/// "x,y,w,h" を表示座標の矩形に
pub fn parse_rect(s: &str) -> Result<Rect, String> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("矩形の数値が不正です: {} ({})", s, e))?;
    match values.as_slice() {
        [x, y, w, h] => Ok(Rect::new(*x, *y, *w, *h)),
        _ => Err(format!("矩形は x,y,幅,高さ の4つで指定してください: {}", s)),
    }
}

/// "800x600" を (幅, 高さ) に
pub fn parse_size(s: &str) -> Result<(f64, f64), String> {
    let (w, h) = s
        .split_once(|c: char| c == 'x' || c == 'X')
        .ok_or_else(|| format!("サイズは 幅x高さ で指定してください: {}", s))?;
    let parse = |v: &str| v.trim().parse::<f64>().map_err(|e| format!("サイズが不正です: {} ({})", s, e));
    let size = (parse(w)?, parse(h)?);
    if size.0 <= 0.0 || size.1 <= 0.0 {
        return Err(format!("サイズは正の値で指定してください: {}", s));
    }
    Ok(size)
}

/// 1始まりの行番号を内部インデックスへ
pub fn row_index(row: usize) -> Result<usize, String> {
    row.checked_sub(1)
        .ok_or_else(|| "行番号は1から指定してください".to_string())
}
