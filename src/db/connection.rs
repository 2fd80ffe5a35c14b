use rusqlite::{Connection, Result};
use std::sync::Mutex;

use crate::db::migration_runner::MigrationRunner;

pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the journal database and bring its schema up to date.
    /// Pass `:memory:` for a throwaway database.
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.execute("PRAGMA foreign_keys = ON", [])?;
        if db_path != ":memory:" {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }

        let runner = MigrationRunner::new();
        let applied = runner.run_pending_migrations(&conn, db_path)?;
        if applied > 0 {
            log::info!("Applied {} migrations to {}", applied, db_path);
        } else {
            log::debug!("Database schema is up to date");
        }

        runner.verify_migrations(&conn)?;

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }
}
