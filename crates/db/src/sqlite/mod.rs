//! SQLite-Backend-Implementierungen fuer alle Repository-Traits

pub mod messages;
pub mod pool;
pub mod settings;
pub mod subscribers;
pub mod tenants;

pub use pool::SqliteDb;
