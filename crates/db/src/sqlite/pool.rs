//! SQLite-Anbindung: Pool-Aufbau und Migrationen
//!
//! Klassenruf haelt Mandanten, Abonnenten und den Nachrichten-Log in
//! einer einzelnen SQLite-Datei. WAL trennt die Leser (History,
//! Posteingang) von den Schreibern (Anhaengen, Verbergen).

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::error::DbError;
use crate::repository::DatabaseConfig;

/// Haelt den Verbindungs-Pool und implementiert alle Repository-Traits
#[derive(Debug, Clone)]
pub struct SqliteDb {
    pub(crate) pool: SqlitePool,
}

impl SqliteDb {
    /// Oeffnet die Datenbank-Datei und bringt das Schema auf Stand
    ///
    /// Eine fehlende Datei wird angelegt; Migrationen laufen vor der
    /// Rueckgabe, der Aufrufer bekommt immer ein vollstaendiges Schema.
    pub async fn oeffnen(config: &DatabaseConfig) -> Result<Self, DbError> {
        let optionen = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(if config.sqlite_wal {
                SqliteJournalMode::Wal
            } else {
                SqliteJournalMode::Delete
            })
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_verbindungen)
            .connect_with(optionen)
            .await?;

        info!(url = %config.url, wal = config.sqlite_wal, "Datenbank geoeffnet");

        let db = Self { pool };
        db.migrationen_ausfuehren().await?;

        Ok(db)
    }

    /// Spielt ausstehende Migrationen ein
    pub async fn migrationen_ausfuehren(&self) -> Result<(), DbError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await?;
        info!("Schema-Migrationen eingespielt");
        Ok(())
    }

    /// Direkter Zugriff auf den Pool fuer Integrationstests
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Fluechtige In-Memory-Datenbank fuer Tests
    ///
    /// :memory: lebt nur solange eine Verbindung offen ist, deshalb
    /// wird genau eine Verbindung dauerhaft gehalten.
    pub async fn in_memory() -> Result<Self, DbError> {
        let optionen = SqliteConnectOptions::from_str("sqlite::memory:")?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .connect_with(optionen)
            .await?;

        let db = Self { pool };
        db.migrationen_ausfuehren().await?;
        Ok(db)
    }
}
