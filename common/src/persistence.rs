//! 下書きの保存・復元
//!
//! 保存先は `DraftStore` として注入する。メモリ実装はテスト用、
//! ファイル実装はルートクレート側にある。

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::draft::{self, DraftMeta, SCHEMA_VERSION};
use crate::error::{Error, Result};
use crate::grid::{FormGrid, HeaderFields};

/// キー単位でJSONを読み書きする保存先
pub trait DraftStore {
    fn load(&self, key: &str) -> Result<Option<Value>>;
    fn save(&mut self, key: &str, value: &Value) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// メモリ上の保存先
#[derive(Debug, Clone, Default)]
pub struct MemoryDraftStore {
    entries: HashMap<String, Value>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl DraftStore for MemoryDraftStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &Value) -> Result<()> {
        self.entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

fn load_map<S: DraftStore + ?Sized>(store: &S, key: &str) -> Result<Option<Map<String, Value>>> {
    match store.load(key)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(Error::Store(format!(
            "{} is not a JSON object: {}",
            key, other
        ))),
    }
}

/// 全エントリを書き込む
pub fn save_draft<S: DraftStore + ?Sized>(store: &mut S, grid: &FormGrid) -> Result<()> {
    let entries = draft::encode(grid)?;
    store.save(draft::KEY_FORM_DATA, &Value::Object(entries.form_data))?;
    store.save(draft::KEY_RESULTS, &Value::Object(entries.results))?;
    store.save(draft::KEY_SECONDARY, &Value::Object(entries.secondary))?;
    store.save(draft::KEY_EXTRA, &Value::Object(entries.extra))?;
    store.save(draft::KEY_TOP, &serde_json::to_value(&entries.top)?)?;
    store.save(draft::KEY_META, &serde_json::to_value(entries.meta)?)?;
    Ok(())
}

/// 前工程のヘッダー > 保存済みヘッダー > 空 の順で合成し、保存し直す
pub fn restore_header<S: DraftStore + ?Sized>(
    store: &mut S,
    handoff: Option<&HeaderFields>,
) -> Result<HeaderFields> {
    let stored: HeaderFields = match store.load(draft::KEY_TOP)? {
        Some(Value::Null) | None => HeaderFields::default(),
        Some(value) => serde_json::from_value(value)?,
    };
    let header = match handoff {
        Some(handoff) => handoff.merged_over(&stored),
        None => stored,
    };
    store.save(draft::KEY_TOP, &serde_json::to_value(&header)?)?;
    Ok(header)
}

/// 下書きを復元する
///
/// 完全な下書きが無い（またはスキーマが異なる）場合はヘッダーと空行1つ。
pub fn restore_draft<S: DraftStore + ?Sized>(
    store: &mut S,
    handoff: Option<&HeaderFields>,
) -> Result<FormGrid> {
    let header = restore_header(store, handoff)?;

    let meta: Option<DraftMeta> = match store.load(draft::KEY_META)? {
        Some(Value::Null) | None => None,
        Some(value) => Some(serde_json::from_value(value)?),
    };
    if meta.is_some_and(|m| m.version != SCHEMA_VERSION) {
        return Ok(FormGrid::from_rows(header, vec![Default::default()]));
    }

    let Some(form_data) = load_map(store, draft::KEY_FORM_DATA)? else {
        return Ok(FormGrid::from_rows(header, vec![Default::default()]));
    };
    let results = load_map(store, draft::KEY_RESULTS)?.unwrap_or_default();
    let secondary = load_map(store, draft::KEY_SECONDARY)?.unwrap_or_default();
    let extra = load_map(store, draft::KEY_EXTRA)?.unwrap_or_default();

    draft::decode(header, &form_data, &results, &secondary, &extra, meta)
}

/// ヘッダー以外の下書きを削除する
pub fn clear_draft<S: DraftStore + ?Sized>(store: &mut S) -> Result<()> {
    for key in draft::ALL_KEYS {
        if key != draft::KEY_TOP {
            store.remove(key)?;
        }
    }
    Ok(())
}

// ============================================
// フォームセッション
// ============================================

/// 1フォーム分の編集セッション
pub struct FormSession<S: DraftStore> {
    store: S,
    grid: FormGrid,
}

impl<S: DraftStore> FormSession<S> {
    /// フォームを開く（下書きと前工程のヘッダーを反映）
    pub fn open(mut store: S, handoff: Option<&HeaderFields>) -> Result<Self> {
        let grid = restore_draft(&mut store, handoff)?;
        Ok(Self { store, grid })
    }

    pub fn grid(&self) -> &FormGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut FormGrid {
        &mut self.grid
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn save(&mut self) -> Result<()> {
        save_draft(&mut self.store, &self.grid)
    }

    /// 画面を離れる: ヘッダーだけ保存し、隣の工程へ渡す値を返す
    pub fn leave(&mut self) -> Result<HeaderFields> {
        let header = self.grid.header.clone();
        self.store
            .save(draft::KEY_TOP, &serde_json::to_value(&header)?)?;
        Ok(header)
    }

    /// 行データを破棄して空行1つに戻す（ヘッダーは残す）
    pub fn reset(&mut self) -> Result<()> {
        clear_draft(&mut self.store)?;
        let header = std::mem::take(&mut self.grid.header);
        self.grid.reset();
        self.grid.header = header;
        Ok(())
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
