//! Runtime configuration.
//!
//! Read from `config.json` in the data directory when present, then
//! overridden by `TRADE_JOURNAL_*` environment variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::error::{JournalError, JournalResult};

pub const CONFIG_FILE: &str = "config.json";
pub const DATABASE_FILE: &str = "journal.db";
pub const SESSION_FILE: &str = "session.json";
/// Directory created under the platform data directory
pub const DATA_DIR_NAME: &str = "trade-journal";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalConfig {
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Namespace for per-user documents in the cloud database
    #[serde(default = "default_app_id")]
    pub app_id: String,
    #[serde(default)]
    pub firebase: Option<FirebaseConfig>,
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
    #[serde(default)]
    pub storage_bucket: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    /// Requests allowed per minute
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
}

fn default_app_id() -> String {
    "trading-journal-india-v1".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_requests_per_minute() -> u32 {
    10
}

impl JournalConfig {
    /// Load configuration for `data_dir`, or the default data directory
    pub fn load(data_dir: Option<PathBuf>) -> JournalResult<Self> {
        let data_dir = match data_dir.or_else(|| env::var_os("TRADE_JOURNAL_HOME").map(PathBuf::from)) {
            Some(dir) => dir,
            None => default_data_dir()?,
        };

        let config_path = data_dir.join(CONFIG_FILE);
        let mut config = if config_path.exists() {
            let raw = fs::read_to_string(&config_path)?;
            serde_json::from_str::<JournalConfig>(&raw).map_err(|e| {
                JournalError::Config(format!("{}: {}", config_path.display(), e))
            })?
        } else {
            JournalConfig::with_data_dir(PathBuf::new())
        };
        config.data_dir = data_dir;
        config.apply_env_overrides();

        log::debug!("Data directory: {}", config.data_dir.display());
        Ok(config)
    }

    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            app_id: default_app_id(),
            firebase: None,
            gemini: None,
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(app_id) = env::var("TRADE_JOURNAL_APP_ID") {
            self.app_id = app_id;
        }

        if let (Ok(api_key), Ok(project_id)) = (
            env::var("TRADE_JOURNAL_FIREBASE_API_KEY"),
            env::var("TRADE_JOURNAL_FIREBASE_PROJECT_ID"),
        ) {
            self.firebase = Some(FirebaseConfig {
                api_key,
                project_id,
                storage_bucket: env::var("TRADE_JOURNAL_FIREBASE_STORAGE_BUCKET").ok(),
            });
        }

        if let Ok(api_key) = env::var("TRADE_JOURNAL_GEMINI_API_KEY") {
            let model = env::var("TRADE_JOURNAL_GEMINI_MODEL")
                .ok()
                .or_else(|| self.gemini.as_ref().map(|g| g.model.clone()))
                .unwrap_or_else(default_gemini_model);
            let requests_per_minute = self
                .gemini
                .as_ref()
                .map(|g| g.requests_per_minute)
                .unwrap_or_else(default_requests_per_minute);
            self.gemini = Some(GeminiConfig {
                api_key,
                model,
                requests_per_minute,
            });
        }
    }

    pub fn ensure_data_dir(&self) -> JournalResult<()> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }

    pub fn firebase(&self) -> JournalResult<&FirebaseConfig> {
        self.firebase.as_ref().ok_or_else(|| {
            JournalError::Config(
                "cloud backend not configured: set TRADE_JOURNAL_FIREBASE_API_KEY and TRADE_JOURNAL_FIREBASE_PROJECT_ID".to_string(),
            )
        })
    }

    pub fn gemini(&self) -> JournalResult<&GeminiConfig> {
        self.gemini.as_ref().ok_or_else(|| {
            JournalError::Config("analysis not configured: set TRADE_JOURNAL_GEMINI_API_KEY".to_string())
        })
    }
}

/// Platform data directory, e.g. `~/.local/share/trade-journal` on Linux
fn default_data_dir() -> JournalResult<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(DATA_DIR_NAME))
        .ok_or_else(|| JournalError::Config("cannot resolve data directory; pass --data-dir".to_string()))
}
