use rusqlite::{params, Connection, OptionalExtension, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

/// Backups kept in `backups/` next to the database
const BACKUPS_TO_KEEP: usize = 5;

#[derive(Debug, Clone)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

impl Migration {
    pub fn new(version: u32, name: &'static str, sql: &'static str) -> Self {
        Self { version, name, sql }
    }

    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.sql.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

pub struct MigrationRunner {
    migrations: Vec<Migration>,
}

impl Default for MigrationRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationRunner {
    pub fn new() -> Self {
        Self {
            migrations: vec![
                Migration::new(0, "bootstrap", include_str!("migrations/000_bootstrap.sql")),
                Migration::new(
                    1,
                    "initial_schema",
                    include_str!("migrations/001_initial_schema.sql"),
                ),
                Migration::new(
                    2,
                    "add_profile_columns",
                    include_str!("migrations/002_add_profile_columns.sql"),
                ),
            ],
        }
    }

    /// Apply every migration newer than the recorded schema version.
    /// Returns the number applied. An existing database is backed up first.
    pub fn run_pending_migrations(&self, conn: &Connection, db_path: &str) -> Result<usize> {
        let current_version = self.get_current_version(conn)?;

        let pending: Vec<&Migration> = self
            .migrations
            .iter()
            .filter(|m| current_version.map_or(true, |v| m.version > v))
            .collect();

        let Some(target) = pending.last() else {
            return Ok(0);
        };

        log::info!(
            "Found {} pending migrations (schema {:?} -> {})",
            pending.len(),
            current_version,
            target.version
        );

        let backup_path = match current_version {
            Some(_) if !is_in_memory(db_path) => Some(self.create_backup(db_path, target.version)?),
            _ => None,
        };

        let mut applied = 0;
        for migration in pending {
            if let Err(e) = self.apply_migration(conn, migration) {
                log::error!("Migration {} ({}) failed: {}", migration.version, migration.name, e);
                if let Some(path) = &backup_path {
                    log::error!("Backup available at: {}", path.display());
                }
                return Err(e);
            }
            applied += 1;
        }

        Ok(applied)
    }

    fn apply_migration(&self, conn: &Connection, migration: &Migration) -> Result<()> {
        let start = Instant::now();
        let tx = conn.unchecked_transaction()?;

        tx.execute_batch(migration.sql)?;

        let execution_time = start.elapsed().as_millis() as i64;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at, checksum, execution_time_ms)
             VALUES (?, ?, strftime('%s', 'now'), ?, ?)",
            params![
                migration.version,
                migration.name,
                migration.checksum(),
                execution_time
            ],
        )?;

        tx.commit()?;

        log::info!(
            "Applied migration {} ({}) in {}ms",
            migration.version,
            migration.name,
            execution_time
        );
        Ok(())
    }

    /// Fail if an applied migration's SQL changed since it ran
    pub fn verify_migrations(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare(
            "SELECT version, name, checksum FROM schema_migrations WHERE checksum IS NOT NULL ORDER BY version",
        )?;

        let applied: Vec<(u32, String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<Result<Vec<_>>>()?;

        for (version, name, stored_checksum) in applied {
            let Some(migration) = self.migrations.iter().find(|m| m.version == version) else {
                continue;
            };
            if stored_checksum != migration.checksum() {
                log::error!("Checksum mismatch for migration {} ({})", version, name);
                log::error!("Expected: {}", migration.checksum());
                log::error!("Actual:   {}", stored_checksum);
                return Err(rusqlite::Error::InvalidQuery);
            }
        }

        Ok(())
    }

    pub fn get_current_version(&self, conn: &Connection) -> Result<Option<u32>> {
        let has_table: i32 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_migrations'",
            [],
            |row| row.get(0),
        )?;
        if has_table == 0 {
            return Ok(None);
        }

        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get::<_, Option<u32>>(0)
        })
        .optional()
        .map(Option::flatten)
    }

    fn create_backup(&self, db_path: &str, target_version: u32) -> Result<PathBuf> {
        let db_path_buf = PathBuf::from(db_path);
        let db_dir = db_path_buf
            .parent()
            .ok_or_else(|| rusqlite::Error::InvalidPath(db_path_buf.clone()))?;
        let backup_dir = db_dir.join("backups");

        fs::create_dir_all(&backup_dir).map_err(|e| io_failure("create backup directory", e))?;

        let backup_path = backup_dir.join(format!(
            "pre_migration_v{}_{}.db",
            target_version,
            chrono::Utc::now().timestamp()
        ));

        let src = Connection::open(db_path)?;
        let mut dst = Connection::open(&backup_path)?;
        {
            let backup = rusqlite::backup::Backup::new(&src, &mut dst)?;
            backup.run_to_completion(5, std::time::Duration::from_millis(250), None)?;
        }

        let integrity: String = dst.pragma_query_value(None, "integrity_check", |row| row.get(0))?;
        if integrity != "ok" {
            return Err(sqlite_failure(format!("Backup integrity check failed: {}", integrity)));
        }

        log::info!("Backup created: {}", backup_path.display());

        if let Err(e) = cleanup_old_backups(&backup_dir) {
            log::warn!("Failed to clean up old backups: {}", e);
        }

        Ok(backup_path)
    }
}

fn cleanup_old_backups(backup_dir: &Path) -> std::io::Result<()> {
    let mut backups: Vec<_> = fs::read_dir(backup_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|s| s.starts_with("pre_migration_") && s.ends_with(".db"))
        })
        .collect();

    // Oldest first
    backups.sort_by_key(|entry| {
        entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH)
    });

    let excess = backups.len().saturating_sub(BACKUPS_TO_KEEP);
    for entry in backups.iter().take(excess) {
        fs::remove_file(entry.path())?;
    }
    Ok(())
}

fn is_in_memory(db_path: &str) -> bool {
    db_path == ":memory:" || db_path.is_empty()
}

fn sqlite_failure(message: String) -> rusqlite::Error {
    rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(1), Some(message))
}

fn io_failure(action: &str, err: std::io::Error) -> rusqlite::Error {
    sqlite_failure(format!("Failed to {}: {}", action, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_sequential() {
        let runner = MigrationRunner::new();
        for (i, m) in runner.migrations.iter().enumerate() {
            assert_eq!(m.version as usize, i, "Migration versions must be sequential");
        }
    }

    #[test]
    fn test_fresh_install() {
        let conn = Connection::open_in_memory().unwrap();
        let runner = MigrationRunner::new();

        let applied = runner.run_pending_migrations(&conn, ":memory:").unwrap();
        assert_eq!(applied, runner.migrations.len());
        assert_eq!(runner.get_current_version(&conn).unwrap(), Some(2));

        for table in ["schema_migrations", "trades", "settings"] {
            let count: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
                    params![table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }

        let capital: f64 = conn
            .query_row("SELECT capital FROM settings WHERE id = 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(capital, 100_000.0);
    }

    #[test]
    fn test_idempotency() {
        let conn = Connection::open_in_memory().unwrap();
        let runner = MigrationRunner::new();

        assert!(runner.run_pending_migrations(&conn, ":memory:").unwrap() > 0);
        assert_eq!(runner.run_pending_migrations(&conn, ":memory:").unwrap(), 0);
        assert!(runner.verify_migrations(&conn).is_ok());
    }

    #[test]
    fn test_checksum_mismatch_detected() {
        let conn = Connection::open_in_memory().unwrap();
        let runner = MigrationRunner::new();
        runner.run_pending_migrations(&conn, ":memory:").unwrap();

        conn.execute("UPDATE schema_migrations SET checksum = 'tampered' WHERE version = 1", [])
            .unwrap();
        assert!(runner.verify_migrations(&conn).is_err());
    }

    #[test]
    fn test_failed_migration_rolls_back() {
        let conn = Connection::open_in_memory().unwrap();
        let runner = MigrationRunner::new();
        runner.apply_migration(&conn, &runner.migrations[0]).unwrap();
        runner.apply_migration(&conn, &runner.migrations[1]).unwrap();

        let bad = Migration::new(2, "bad_migration", "INVALID SQL SYNTAX");
        assert!(runner.apply_migration(&conn, &bad).is_err());
        assert_eq!(runner.get_current_version(&conn).unwrap(), Some(1));
    }

    #[test]
    fn test_upgrade_creates_backup() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("journal.db");
        let db_path = db_path.to_str().unwrap();

        let runner = MigrationRunner::new();
        {
            let conn = Connection::open(db_path).unwrap();
            runner.apply_migration(&conn, &runner.migrations[0]).unwrap();
            runner.apply_migration(&conn, &runner.migrations[1]).unwrap();
        }

        let conn = Connection::open(db_path).unwrap();
        assert_eq!(runner.run_pending_migrations(&conn, db_path).unwrap(), 1);

        let backups: Vec<_> = fs::read_dir(dir.path().join("backups")).unwrap().collect();
        assert_eq!(backups.len(), 1);
    }
}
