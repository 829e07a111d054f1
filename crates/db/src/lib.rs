//! SQLite connection factory and migration ledger for the catalog.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use shelf_kernel::settings::DatabaseSettings;
use shelf_kernel::Migration;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("database connection lock poisoned")]
    Poisoned,
}

const LEDGER_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL,
        PRIMARY KEY (module, id)
    );
"#;

/// Shared handle on the catalog database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (creating if needed) the database file named in the settings.
    pub fn open(settings: &DatabaseSettings) -> anyhow::Result<Self> {
        Self::open_path(&settings.path)
    }

    pub fn open_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let is_new_db = !path.exists();

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;

        if is_new_db {
            tracing::info!(target: "shelf-db", path = %path.display(), "created new database");
        } else {
            tracing::info!(target: "shelf-db", path = %path.display(), "opened database");
        }

        Self::from_connection(conn)
    }

    /// Private in-memory database, mostly for tests.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context("failed to configure database connection")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Lock the shared connection.
    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    /// Apply every migration not yet recorded in the ledger.
    ///
    /// Each script runs in its own transaction together with its ledger row.
    /// Returns the number of scripts applied.
    pub fn apply_migrations(&self, migrations: &[(String, Migration)]) -> anyhow::Result<usize> {
        let mut conn = self.lock()?;
        conn.execute_batch(LEDGER_SCHEMA)
            .context("failed to create migration ledger")?;

        let mut applied = 0;
        for (module, migration) in migrations {
            let already: Option<String> = conn
                .query_row(
                    "SELECT applied_at FROM schema_migrations WHERE module = ?1 AND id = ?2",
                    params![module, migration.id],
                    |row| row.get(0),
                )
                .optional()?;

            if already.is_some() {
                tracing::debug!(
                    target: "shelf-db",
                    %module,
                    id = migration.id,
                    "migration already applied"
                );
                continue;
            }

            tracing::info!(target: "shelf-db", %module, id = migration.id, "applying migration");

            let tx = conn.transaction()?;
            tx.execute_batch(migration.up).with_context(|| {
                format!("migration '{}' of module '{}' failed", migration.id, module)
            })?;
            tx.execute(
                "INSERT INTO schema_migrations (module, id, applied_at) VALUES (?1, ?2, ?3)",
                params![module, migration.id, now_rfc3339()?],
            )?;
            tx.commit()?;

            applied += 1;
        }

        Ok(applied)
    }
}

fn now_rfc3339() -> anyhow::Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("failed to format timestamp")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrations() -> Vec<(String, Migration)> {
        vec![(
            "notes".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE IF NOT EXISTS notes (id INTEGER PRIMARY KEY, body TEXT);",
            },
        )]
    }

    #[test]
    fn migrations_apply_once() {
        let db = Database::open_in_memory().unwrap();

        assert_eq!(db.apply_migrations(&migrations()).unwrap(), 1);
        assert_eq!(db.apply_migrations(&migrations()).unwrap(), 0);

        let conn = db.lock().unwrap();
        let recorded: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(recorded, 1);
    }

    #[test]
    fn failed_migration_is_not_recorded() {
        let db = Database::open_in_memory().unwrap();
        let broken = vec![(
            "broken".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE;",
            },
        )];

        assert!(db.apply_migrations(&broken).is_err());

        let conn = db.lock().unwrap();
        let recorded: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(recorded, 0);
    }

    #[test]
    fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        let db = Database::open_path(&path).unwrap();
        db.apply_migrations(&migrations()).unwrap();
        drop(db);

        let reopened = Database::open_path(&path).unwrap();
        assert_eq!(reopened.apply_migrations(&migrations()).unwrap(), 0);
    }
}
