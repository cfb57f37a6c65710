//! Fehlertypen fuer das Store-Crate

use thiserror::Error;

/// Store-Fehlertypen
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Nachricht nicht gefunden: {0}")]
    NachrichtNichtGefunden(i64),

    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error("Datenbank-Fehler: {0}")]
    DatenbankFehler(#[from] klassenruf_db::DbError),
}

pub type StoreResult<T> = Result<T, StoreError>;
