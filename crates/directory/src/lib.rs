//! klassenruf-directory – Mandanten-Verzeichnis
//!
//! Dieses Crate verwaltet die Mandanten: Registrierung mit zufaellig
//! vergebenem sechsstelligem Code, Anmeldung, dauerhafte
//! Abonnenten-Datensaetze und das Erlaubnis-Flag fuer
//! Abonnenten-Nachrichten mit Durchschreibe-Cache.

pub mod error;
pub mod service;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use error::{DirectoryError, DirectoryResult};
pub use service::TenantDirectory;
