//! Persistence backends for trades, settings and the user profile.
//!
//! A session picks one backend at start-up: the local SQLite database
//! (demo/offline mode) or the per-user cloud document store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::JournalResult;
use crate::models::{Profile, ProfileUpdate, Settings, Trade};

pub mod cloud;
pub mod local;

pub use cloud::CloudStore;
pub use local::LocalStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Local,
    Cloud,
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageMode::Local => f.write_str("demo (local)"),
            StorageMode::Cloud => f.write_str("cloud"),
        }
    }
}

/// Storage capability shared by both backends
#[async_trait]
pub trait TradeStore: Send + Sync {
    fn mode(&self) -> StorageMode;

    /// Every stored trade, in no particular order
    async fn load_trades(&self) -> JournalResult<Vec<Trade>>;

    async fn create_trade(&self, trade: &Trade) -> JournalResult<()>;

    /// Replace an existing trade; `NotFound` when the id is unknown
    async fn update_trade(&self, trade: &Trade) -> JournalResult<()>;

    /// `NotFound` when the id is unknown
    async fn delete_trade(&self, id: &str) -> JournalResult<()>;

    async fn load_settings(&self) -> JournalResult<Settings>;

    async fn save_settings(&self, settings: &Settings) -> JournalResult<()>;

    async fn profile(&self) -> JournalResult<Profile>;

    async fn update_profile(&self, update: ProfileUpdate) -> JournalResult<Profile>;
}
