use crate::error::{FairError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_FORM_ID: &str = "default";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// OCR・抽出サーバーのベースURL
    pub api_base_url: String,
    /// 下書きの保存先（未設定なら ~/.config/fair-portal/drafts）
    pub draft_dir: Option<PathBuf>,
    /// 編集中のフォームID（下書きのサブディレクトリ名）
    pub form_id: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            draft_dir: None,
            form_id: DEFAULT_FORM_ID.into(),
            log_level: "info".into(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| FairError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("fair-portal"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// APIのベースURL（環境変数 FAIR_API_URL を優先）
    pub fn api_base_url(&self) -> String {
        let url = std::env::var("FAIR_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.api_base_url.clone());
        url.trim_end_matches('/').to_string()
    }

    pub fn draft_dir(&self) -> Result<PathBuf> {
        match &self.draft_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::config_dir()?.join("drafts")),
        }
    }

    pub fn set_api_base_url(&mut self, url: String) -> Result<()> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(FairError::Config(format!(
                "URLは http:// または https:// で始めてください: {}",
                url
            )));
        }
        self.api_base_url = url;
        Ok(())
    }
}
