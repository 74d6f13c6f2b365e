//! ファイルベースの下書き保存先
//!
//! キーごとに `{draft_dir}/{form_id}/{key}.json` を1つ持つ。

use fair_form_common::{DraftStore, Error};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

type StoreResult<T> = fair_form_common::Result<T>;

fn store_error(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::Store(format!("{}: {}", path.display(), e))
}

#[derive(Debug, Clone)]
pub struct FileDraftStore {
    dir: PathBuf,
}

impl FileDraftStore {
    /// フォームごとのディレクトリを使う
    pub fn new(draft_dir: &Path, form_id: &str) -> Self {
        Self {
            dir: draft_dir.join(form_id),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// 保存済みのキー一覧
    pub fn keys(&self) -> StoreResult<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(|e| store_error(&self.dir, e))? {
            let path = entry.map_err(|e| store_error(&self.dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

impl DraftStore for FileDraftStore {
    fn load(&self, key: &str) -> StoreResult<Option<Value>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(&path).map_err(|e| store_error(&path, e))?;
        let value = serde_json::from_reader(BufReader::new(file)).map_err(|e| store_error(&path, e))?;
        Ok(Some(value))
    }

    fn save(&mut self, key: &str, value: &Value) -> StoreResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| store_error(&self.dir, e))?;
        let path = self.path_for(key);
        let file = File::create(&path).map_err(|e| store_error(&path, e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), value).map_err(|e| store_error(&path, e))?;
        tracing::debug!(key, path = %path.display(), "下書き保存");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(store_error(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_load_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileDraftStore::new(dir.path(), "fair-1");

        assert_eq!(store.load("form3Top").unwrap(), None);
        store.save("form3Top", &json!({"partNumber": "PN-1"})).unwrap();
        assert!(dir.path().join("fair-1").join("form3Top.json").exists());
        assert_eq!(
            store.load("form3Top").unwrap(),
            Some(json!({"partNumber": "PN-1"}))
        );

        store.remove("form3Top").unwrap();
        assert_eq!(store.load("form3Top").unwrap(), None);
        // 存在しないキーの削除は成功扱い
        store.remove("form3Top").unwrap();
    }

    #[test]
    fn test_keys_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileDraftStore::new(dir.path(), "f");
        assert!(store.keys().unwrap().is_empty());
        store.save("resultsValue", &json!({})).unwrap();
        store.save("form3Data", &json!({})).unwrap();
        assert_eq!(store.keys().unwrap(), vec!["form3Data", "resultsValue"]);
    }

    #[test]
    fn test_corrupt_file_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDraftStore::new(dir.path(), "f");
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.dir().join("form3Data.json"), "{not json").unwrap();
        assert!(matches!(store.load("form3Data"), Err(Error::Store(_))));
    }
}
