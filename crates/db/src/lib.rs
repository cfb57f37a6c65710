//! klassenruf-db – Datenbank-Abstraktion
//!
//! Dieses Crate stellt das Repository-Pattern bereit, das die
//! SQLite-Persistenz hinter einheitlichen Trait-Schnittstellen
//! abstrahiert. Die Geschaeftslogik (Store, Directory) haengt nur
//! an den Traits, nicht an der konkreten Implementierung.

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

pub use error::DbError;
pub use repository::{
    DatabaseConfig, DbResult, MessageRepository, SettingsRepository, SubscriberRepository,
    TenantRepository,
};
pub use sqlite::SqliteDb;
