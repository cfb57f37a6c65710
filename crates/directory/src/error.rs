//! Fehlertypen fuer das Directory-Crate

use thiserror::Error;

/// Directory-Fehlertypen
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Unbekannter Mandanten-Code: {0}")]
    MandantNichtGefunden(String),

    #[error("Anmeldung fehlgeschlagen")]
    AnmeldungFehlgeschlagen,

    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error("Kein freier Mandanten-Code nach {0} Versuchen")]
    CodeVergabeFehlgeschlagen(u32),

    #[error("Datenbank-Fehler: {0}")]
    DatenbankFehler(#[from] klassenruf_db::DbError),
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;
