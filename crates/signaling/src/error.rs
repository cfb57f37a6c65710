//! Fehlertypen fuer den Signaling-Service

use thiserror::Error;

/// Fehlertyp der Moderations- und Handler-Pfade
///
/// Die Handler uebersetzen jede Variante in einen Antwort-Frame mit
/// dem passenden Fehlercode.
#[derive(Debug, Error)]
pub enum SignalingError {
    /// Berechtigung verweigert
    #[error("Berechtigung verweigert: {0}")]
    ZugriffVerweigert(String),

    /// Ressource nicht gefunden
    #[error("Nicht gefunden: {0}")]
    NichtGefunden(String),

    /// Persistenz-Fehler beim Schreiben
    #[error("Persistenz-Fehler: {0}")]
    Persistenz(String),

    /// Interner Fehler
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;
