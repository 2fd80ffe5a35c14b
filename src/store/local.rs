use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::Path;
use std::sync::MutexGuard;

use super::{StorageMode, TradeStore};
use crate::api::storage::image_content_type;
use crate::db::Database;
use crate::error::{JournalError, JournalResult};
use crate::models::{PhotoSource, Profile, ProfileUpdate, Settings, Trade, TradeType};

const TRADE_COLUMNS: &str =
    "id, date, time, timestamp, symbol, type, entry, exit, qty, pnl, strategy, notes";

/// Demo-mode store backed by the local SQLite database
pub struct LocalStore {
    db: Database,
}

impl LocalStore {
    pub fn open(path: &Path) -> JournalResult<Self> {
        let path = path
            .to_str()
            .ok_or_else(|| JournalError::Config(format!("Non UTF-8 database path: {}", path.display())))?;
        Ok(Self { db: Database::new(path)? })
    }

    pub fn in_memory() -> JournalResult<Self> {
        Ok(Self { db: Database::new(":memory:")? })
    }

    fn conn(&self) -> JournalResult<MutexGuard<'_, Connection>> {
        self.db
            .conn
            .lock()
            .map_err(|e| JournalError::Database(e.to_string()))
    }
}

fn map_row_to_trade(row: &rusqlite::Row) -> rusqlite::Result<Trade> {
    let trade_type: String = row.get(5)?;
    let trade_type = trade_type.parse::<TradeType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Trade {
        id: row.get(0)?,
        date: row.get(1)?,
        time: row.get(2)?,
        timestamp: row.get(3)?,
        symbol: row.get(4)?,
        trade_type,
        entry: row.get(6)?,
        exit: row.get(7)?,
        qty: row.get(8)?,
        pnl: row.get(9)?,
        strategy: row.get(10)?,
        notes: row.get(11)?,
    })
}

/// Inline `data:` URL for a local image file
fn photo_data_url(path: &Path) -> JournalResult<String> {
    let bytes = fs::read(path)?;
    Ok(format!(
        "data:{};base64,{}",
        image_content_type(path),
        STANDARD.encode(bytes)
    ))
}

#[async_trait]
impl TradeStore for LocalStore {
    fn mode(&self) -> StorageMode {
        StorageMode::Local
    }

    async fn load_trades(&self) -> JournalResult<Vec<Trade>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM trades", TRADE_COLUMNS))?;
        let trades = stmt
            .query_map([], map_row_to_trade)?
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("Loaded {} trades from local database", trades.len());
        Ok(trades)
    }

    async fn create_trade(&self, trade: &Trade) -> JournalResult<()> {
        let conn = self.conn()?;
        let now = Utc::now().timestamp();

        conn.execute(
            &format!(
                "INSERT INTO trades ({}, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
                TRADE_COLUMNS
            ),
            params![
                trade.id,
                trade.date,
                trade.time,
                trade.timestamp(),
                trade.symbol,
                trade.trade_type.as_str(),
                trade.entry,
                trade.exit,
                trade.qty,
                trade.pnl(),
                trade.strategy,
                trade.notes,
                now
            ],
        )?;

        log::info!("Created trade {}", trade.id);
        Ok(())
    }

    async fn update_trade(&self, trade: &Trade) -> JournalResult<()> {
        let conn = self.conn()?;

        let updated = conn.execute(
            "UPDATE trades SET date = ?2, time = ?3, timestamp = ?4, symbol = ?5, type = ?6,
                    entry = ?7, exit = ?8, qty = ?9, pnl = ?10, strategy = ?11, notes = ?12,
                    updated_at = ?13
             WHERE id = ?1",
            params![
                trade.id,
                trade.date,
                trade.time,
                trade.timestamp(),
                trade.symbol,
                trade.trade_type.as_str(),
                trade.entry,
                trade.exit,
                trade.qty,
                trade.pnl(),
                trade.strategy,
                trade.notes,
                Utc::now().timestamp()
            ],
        )?;

        if updated == 0 {
            return Err(JournalError::NotFound(format!("Trade {}", trade.id)));
        }
        log::info!("Updated trade {}", trade.id);
        Ok(())
    }

    async fn delete_trade(&self, id: &str) -> JournalResult<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM trades WHERE id = ?1", [id])?;

        if deleted == 0 {
            return Err(JournalError::NotFound(format!("Trade {}", id)));
        }
        log::info!("Deleted trade {}", id);
        Ok(())
    }

    async fn load_settings(&self) -> JournalResult<Settings> {
        let conn = self.conn()?;
        let row: Option<(f64, String)> = conn
            .query_row(
                "SELECT capital, strategies FROM settings WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((capital, strategies)) = row else {
            return Ok(Settings::default());
        };
        Ok(Settings {
            capital,
            strategies: serde_json::from_str(&strategies)?,
        })
    }

    async fn save_settings(&self, settings: &Settings) -> JournalResult<()> {
        let conn = self.conn()?;
        let strategies = serde_json::to_string(&settings.strategies)?;

        conn.execute(
            "INSERT INTO settings (id, capital, strategies, updated_at) VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET capital = excluded.capital,
                 strategies = excluded.strategies, updated_at = excluded.updated_at",
            params![settings.capital, strategies, Utc::now().timestamp()],
        )?;
        Ok(())
    }

    async fn profile(&self) -> JournalResult<Profile> {
        let conn = self.conn()?;
        let row: Option<(Option<String>, Option<String>)> = conn
            .query_row(
                "SELECT display_name, photo_url FROM settings WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let mut profile = Profile::demo();
        if let Some((display_name, photo_url)) = row {
            if display_name.is_some() {
                profile.display_name = display_name;
            }
            profile.photo_url = photo_url;
        }
        Ok(profile)
    }

    async fn update_profile(&self, update: ProfileUpdate) -> JournalResult<Profile> {
        let photo_url = match update.photo {
            Some(PhotoSource::Url(url)) => Some(url),
            Some(PhotoSource::File(path)) => Some(photo_data_url(&path)?),
            None => None,
        };

        {
            let conn = self.conn()?;
            let mut updates = Vec::new();
            let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if let Some(name) = update.display_name {
                updates.push("display_name = ?");
                params.push(Box::new(name));
            }
            if let Some(url) = photo_url {
                updates.push("photo_url = ?");
                params.push(Box::new(url));
            }

            if !updates.is_empty() {
                updates.push("updated_at = ?");
                params.push(Box::new(Utc::now().timestamp()));

                let query = format!("UPDATE settings SET {} WHERE id = 1", updates.join(", "));
                let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
                conn.execute(&query, param_refs.as_slice())?;
            }
        }

        self.profile().await
    }
}
