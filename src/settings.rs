use crate::sketch::classify::DEFAULT_ENDPOINT;
use crate::sketch::model::ModelKind;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE_NAME: &str = "quick_draw_settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Classifier URL that receives `POST` requests.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model preselected in the dropdown at startup.
    #[serde(default)]
    pub default_model: ModelKind,
    /// When enabled the logger runs at debug level and honours `RUST_LOG`.
    #[serde(default)]
    pub debug_logging: bool,
    /// Optional file that receives log output in addition to stderr.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Begin a new drawing on the first stroke after a completed attempt.
    #[serde(default = "default_clear_after_classify")]
    pub clear_after_classify: bool,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_owned()
}

fn default_clear_after_classify() -> bool {
    true
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            default_model: ModelKind::default(),
            debug_logging: false,
            log_file: None,
            clear_after_classify: default_clear_after_classify(),
        }
    }
}

impl AppSettings {
    /// Reads settings from `path`. A missing or blank file yields defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read settings file {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("deserialize settings file {}", path.display()))
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create settings folder {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("write settings file {}", path.display()))
    }
}

pub fn settings_path_from_exe_path(exe_path: &Path) -> Result<PathBuf> {
    let parent = exe_path
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
    Ok(parent.join(SETTINGS_FILE_NAME))
}

pub fn resolve_settings_path() -> Result<PathBuf> {
    let exe_path = std::env::current_exe().context("resolve current executable")?;
    settings_path_from_exe_path(&exe_path)
}
