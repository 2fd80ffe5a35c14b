use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{JournalError, JournalResult};
use crate::journal::Journal;
use crate::models::{Settings, Trade};

pub const BACKUP_VERSION: &str = "1.0.0";

const CSV_HEADER: [&str; 10] = [
    "Date", "Time", "Symbol", "Type", "Qty", "Entry", "Exit", "P&L", "Strategy", "Notes",
];

// CSV Export

/// `trading_journal_<YYYY-MM-DD>.csv`
pub fn default_csv_file_name(date: NaiveDate) -> String {
    format!("trading_journal_{}.csv", date.format("%Y-%m-%d"))
}

/// Write trades as CSV, in the given order. Fails on an empty set.
pub fn write_trades_csv<W: Write>(trades: &[&Trade], writer: W) -> JournalResult<()> {
    if trades.is_empty() {
        return Err(JournalError::NoTrades);
    }

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)?;

    for t in trades {
        let pnl = t.pnl().to_string();
        wtr.write_record([
            t.date.as_str(),
            t.time.as_str(),
            t.symbol.as_str(),
            t.trade_type.as_str(),
            t.qty.as_str(),
            t.entry.as_str(),
            t.exit.as_str(),
            pnl.as_str(),
            t.strategy.as_str(),
            t.notes.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Export the filtered view to `output` (a file or directory), defaulting to
/// today's file name in the current directory. Returns the written path.
pub fn export_csv(journal: &Journal, output: Option<&Path>) -> JournalResult<PathBuf> {
    let trades = journal.filtered_trades();
    if trades.is_empty() {
        return Err(JournalError::NoTrades);
    }

    let file_name = default_csv_file_name(Local::now().date_naive());
    let path = match output {
        Some(p) if p.is_dir() => p.join(file_name),
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(file_name),
    };

    let file = fs::File::create(&path)?;
    write_trades_csv(&trades, file)?;

    log::info!("Exported {} trades to {}", trades.len(), path.display());
    Ok(path)
}

// Data Export/Import

#[derive(Debug, Serialize, Deserialize)]
pub struct BackupData {
    pub settings: Settings,
    pub trades: Vec<Trade>,
    pub export_date: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub settings_restored: bool,
    pub trades_imported: usize,
}

pub fn export_all_data(journal: &Journal) -> JournalResult<String> {
    let backup = BackupData {
        settings: journal.settings().clone(),
        trades: journal.trades().to_vec(),
        export_date: Utc::now().to_rfc3339(),
        version: BACKUP_VERSION.to_string(),
    };

    Ok(serde_json::to_string_pretty(&backup)?)
}

pub fn export_backup(journal: &Journal, path: &Path) -> JournalResult<()> {
    fs::write(path, export_all_data(journal)?)?;
    log::info!("Wrote backup of {} trades to {}", journal.trades().len(), path.display());
    Ok(())
}

/// Restore a JSON backup. Trades are upserted by id and their P&L is
/// recomputed rather than trusted.
pub async fn import_all_data(journal: &mut Journal, json_data: &str) -> JournalResult<ImportSummary> {
    let backup: BackupData = serde_json::from_str(json_data)?;
    if backup.version != BACKUP_VERSION {
        log::warn!(
            "Backup version {} differs from {}; importing anyway",
            backup.version,
            BACKUP_VERSION
        );
    }

    journal.replace_settings(backup.settings).await?;
    let trades_imported = journal.import_trades(&backup.trades).await?;

    Ok(ImportSummary {
        settings_restored: true,
        trades_imported,
    })
}

pub async fn import_backup(journal: &mut Journal, path: &Path) -> JournalResult<ImportSummary> {
    let json_data = fs::read_to_string(path)?;
    import_all_data(journal, &json_data).await
}
