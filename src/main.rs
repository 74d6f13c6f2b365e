use clap::Parser;
use fair_form_common::draft;
use fair_form_common::requirement::{char_no_display, designator_display, requirement_lines, resolve_results};
use fair_form_common::{
    CropSession, DraftStore, FieldKey, FieldValue, FormGrid, FormSession, ResultsClassification,
};
use fair_portal::{capture, cli, config, draft_store, error, export, import, logging, ocr, raster, spreadsheet, voice};
use cli::{Cli, Commands, RowAction};
use config::Config;
use draft_store::FileDraftStore;
use error::{FairError, Result};
use std::io::IsTerminal;

fn index(row: usize) -> Result<usize> {
    cli::row_index(row).map_err(|e| FairError::Form(fair_form_common::Error::Parse(e)))
}

fn print_grid(form_id: &str, grid: &FormGrid) {
    println!("📋 Form 3 [{}]\n", form_id);
    for (label, value) in grid.header.labeled() {
        println!("  {}: {}", label, value);
    }
    println!();
    for (i, row) in grid.rows().iter().enumerate() {
        println!(
            "行{}: {} | {} | {}",
            i + 1,
            char_no_display(row),
            row.reference_location,
            designator_display(row)
        );
        for line in requirement_lines(&row.requirement) {
            println!("    {}", line);
        }
        if row.requirement.gdt.snapshot.is_some() {
            println!("    [GD&T 画像あり]");
        }
        let results = resolve_results(row);
        if !results.is_empty() {
            println!("    Results: {}", results);
        }
        for (label, value) in [
            ("Bonus", &row.bonus_tolerance),
            ("Tooling", &row.tooling),
            ("NC#", &row.nonconformance_number),
            ("Comments", &row.comments),
        ] {
            if !value.is_empty() {
                println!("    {}: {}", label, value);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load()?;
    logging::init(&config.log_level, cli.verbose);
    let form_id = cli.form.clone().unwrap_or_else(|| config.form_id.clone());

    let store = FileDraftStore::new(&config.draft_dir()?, &form_id);

    match cli.command {
        Commands::New { header } => {
            let mut session = FormSession::open(store, Some(&header.to_fields()))?;
            session.reset()?;
            session.save()?;
            println!("✔ 新しいフォームを開始しました [{}]", form_id);
        }

        Commands::Header { header } => {
            let mut session = FormSession::open(store, Some(&header.to_fields()))?;
            session.save()?;
            for (label, value) in session.grid().header.labeled() {
                println!("  {}: {}", label, value);
            }
            println!("✔ 識別フィールドを保存しました");
        }

        Commands::Show { json } => {
            let session = FormSession::open(store, None)?;
            if json {
                let entries = draft::encode(session.grid())?;
                let mut out = serde_json::Map::new();
                out.insert(draft::KEY_FORM_DATA.into(), entries.form_data.into());
                out.insert(draft::KEY_RESULTS.into(), entries.results.into());
                out.insert(draft::KEY_SECONDARY.into(), entries.secondary.into());
                out.insert(draft::KEY_EXTRA.into(), entries.extra.into());
                out.insert(draft::KEY_TOP.into(), serde_json::to_value(&entries.top)?);
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print_grid(&form_id, session.grid());
            }
        }

        Commands::Row { action } => {
            let mut session = FormSession::open(store, None)?;
            match action {
                RowAction::Add => {
                    let i = session.grid_mut().add_row();
                    println!("✔ 行{}を追加しました", i + 1);
                }
                RowAction::Delete { row } => {
                    session.grid_mut().delete_row(index(row)?)?;
                    println!("✔ 行{}を削除しました（残り{}行）", row, session.grid().len());
                }
            }
            session.save()?;
        }

        Commands::Set { row, field, value } => {
            let mut session = FormSession::open(store, None)?;
            let key = FieldKey::new(field, index(row)?);
            session.grid_mut().set_field(key, FieldValue::plain(value))?;
            session.save()?;
            println!("✔ {} を更新しました", key);
        }

        Commands::Classify { row, value } => {
            let mut session = FormSession::open(store, None)?;
            let classification = ResultsClassification::parse_optional(value.as_deref().unwrap_or(""))
                .map_err(|e| FairError::Form(fair_form_common::Error::Parse(e)))?;
            session
                .grid_mut()
                .set_results_classification(index(row)?, classification)?;
            session.save()?;
            println!(
                "✔ 行{}の区分: {}",
                row,
                classification.map(|c| c.label()).unwrap_or("(なし)")
            );
        }

        Commands::Secondary { row, value } => {
            let mut session = FormSession::open(store, None)?;
            let i = index(row)?;
            let classification = session
                .grid()
                .row(i)
                .ok_or(fair_form_common::Error::RowOutOfRange { index: i, len: session.grid().len() })?
                .classification;
            if let (Some(c), Some(v)) = (classification, value.as_deref()) {
                if !c.accepts_secondary(v) {
                    return Err(FairError::Form(fair_form_common::Error::InvalidValue {
                        field: format!("{} の結果", c.label()),
                        value: v.to_string(),
                    }));
                }
            }
            session.grid_mut().set_secondary_result(i, value)?;
            session.save()?;
            println!("✔ 行{}の結果を更新しました", row);
        }

        Commands::Ocr { file, row, field, rect, display, page, zoom, rotate, snapshot } => {
            println!("🔍 fair-portal - 切り抜き{}\n", if snapshot { "（スナップショット）" } else { "OCR" });
            let mut session = FormSession::open(store, None)?;
            let key = FieldKey::new(field, index(row)?);

            let rasterizer = match raster::default_rasterizer() {
                Ok(r) => Some(r),
                Err(e) => {
                    tracing::debug!("PDF描画エンジンなし: {}", e);
                    None
                }
            };

            let mut crop = CropSession::new();
            let source = capture::open_source(&mut crop, &file, rasterizer.as_deref())?;
            if let Some(page) = page {
                crop.set_page(page);
            }
            if let Some(zoom) = zoom {
                crop.set_zoom(zoom);
            }
            crop.rotate(rotate);
            let (w, h) = capture::prepare_geometry(&mut crop, &source, display, rasterizer.as_deref())?;
            println!("- {} ({}x{}px, ページ {}/{})", source.name, w, h, crop.page(), crop.page_count());
            crop.set_crop(rect)?;

            if snapshot {
                capture::insert_snapshot(&mut crop, session.grid_mut(), key, &source, rasterizer.as_deref())?;
                println!("✔ {} に画像を挿入しました", key);
            } else {
                let client = ocr::OcrClient::new(config.api_base_url())?;
                println!("- OCR中... ({})", client.endpoint());
                let text = capture::extract_text(
                    &mut crop,
                    session.grid_mut(),
                    key,
                    &source,
                    rasterizer.as_deref(),
                    &client,
                )
                .await?;
                println!("✔ 抽出テキスト: {}", text);
                println!("  {} = {}", key, session.grid().field(key).text());
            }
            session.save()?;
        }

        Commands::Dictate { row, field, text } => {
            let mut session = FormSession::open(store, None)?;
            let key = FieldKey::new(field, index(row)?);

            let mut transcript;
            let mut prompt;
            let recognizer: Option<&mut dyn voice::SpeechRecognizer> = if let Some(text) = text {
                transcript = voice::TranscriptRecognizer::new(text);
                Some(&mut transcript)
            } else if std::io::stdin().is_terminal() {
                prompt = voice::PromptRecognizer::new("🎤 読み上げ内容");
                Some(&mut prompt)
            } else {
                None
            };

            let text = voice::dictate(session.grid_mut(), key, recognizer)?;
            session.save()?;
            println!("✔ {} に追記: {}", key, text);
        }

        Commands::Import { file, offline } => {
            println!("📥 fair-portal - 一括取込\n");
            let mut session = FormSession::open(store, None)?;

            if offline {
                let rows = spreadsheet::read_extracted_rows(&file)?;
                for item in &rows {
                    let i = session.grid_mut().append_extracted(item);
                    println!("  + 行{}: {} {}", i + 1, item.operation, item.description);
                }
                session.save()?;
                println!("\n✅ {}行を取り込みました", rows.len());
            } else {
                let client = reqwest::Client::new();
                let result = import::import_stream(
                    &client,
                    &config.api_base_url(),
                    &file,
                    session.grid_mut(),
                    |i, item| println!("  + 行{}: {} {}", i + 1, item.operation, item.description),
                )
                .await;
                // 中断時も反映済みの行は保存する
                session.save()?;
                let summary = result?;
                println!("\n✅ {}行を取り込みました", summary.rows);
            }
        }

        Commands::Export { format, output } => {
            println!("📄 fair-portal - エクスポート\n");
            let session = FormSession::open(store, None)?;
            let paths = export::export_form(session.grid(), format, &output, false)?;
            for path in paths {
                println!("✔ 出力: {}", path.display());
            }
            println!("\n✅ エクスポート完了");
        }

        Commands::Draft { clear } => {
            if clear {
                let mut session = FormSession::open(store, None)?;
                session.reset()?;
                println!("✔ 下書きを破棄しました（識別フィールドは保持）");
            } else {
                println!("下書き:");
                println!("  パス: {}", store.dir().display());
                let keys = store.keys()?;
                if keys.is_empty() {
                    println!("  （保存なし）");
                }
                for key in keys {
                    let size = store.load(&key)?.map(|v| v.to_string().len()).unwrap_or(0);
                    println!("  {} ({} bytes)", key, size);
                }
            }
        }

        Commands::Config { set_api_url, show } => {
            if let Some(url) = set_api_url {
                config.set_api_base_url(url)?;
                config.save()?;
                println!("✔ OCRサーバーURLを設定しました");
            }

            if show {
                println!("設定:");
                println!("  OCRサーバー: {}", config.api_base_url());
                println!("  下書き保存先: {}", config.draft_dir()?.display());
                println!("  フォームID: {}", config.form_id);
                println!("  ログレベル: {}", config.log_level);
            }
        }
    }

    Ok(())
}
