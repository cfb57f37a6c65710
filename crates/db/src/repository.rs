//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt die Geschaeftslogik von der konkreten
//! Datenbank-Implementierung. Alle Traits werden vom SQLite-Backend
//! implementiert; Tests koennen eigene In-Memory-Varianten stellen.

use klassenruf_core::types::TenantCode;

use crate::error::DbError;
use crate::models::{AbonnentRecord, MandantRecord, NachrichtRecord, NeueNachricht, NeuerMandant};

/// Result-Alias fuer alle Repository-Operationen
pub type DbResult<T> = Result<T, DbError>;

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://klassenruf.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus bei SQLite aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://klassenruf.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Repository fuer Mandanten-Datenzugriffe
#[allow(async_fn_in_trait)]
pub trait TenantRepository: Send + Sync {
    /// Einen neuen Mandanten mit bereits vergebenem Code anlegen
    ///
    /// Schlaegt mit `DbError::Eindeutigkeit` fehl wenn der Code schon
    /// existiert; der Aufrufer wuerfelt dann einen neuen Code.
    async fn erstellen(&self, data: NeuerMandant<'_>) -> DbResult<MandantRecord>;

    /// Einen Mandanten anhand seines Codes laden
    async fn laden(&self, code: &TenantCode) -> DbResult<Option<MandantRecord>>;

    /// Den Login-Zeitpunkt eines Mandanten auffrischen
    async fn login_vermerken(&self, code: &TenantCode) -> DbResult<()>;
}

/// Repository fuer Mandanten-Einstellungen
#[allow(async_fn_in_trait)]
pub trait SettingsRepository: Send + Sync {
    /// Laedt das Erlaubnis-Flag fuer Abonnenten-Nachrichten
    ///
    /// Legt beim ersten Zugriff eine Standardzeile (deaktiviert) an.
    async fn erlaubnis_laden(&self, code: &TenantCode) -> DbResult<bool>;

    /// Setzt das Erlaubnis-Flag fuer Abonnenten-Nachrichten
    async fn erlaubnis_setzen(&self, code: &TenantCode, erlaubt: bool) -> DbResult<()>;
}

/// Repository fuer dauerhafte Abonnenten-Datensaetze
#[allow(async_fn_in_trait)]
pub trait SubscriberRepository: Send + Sync {
    /// Vermerkt einen Abonnenten und frischt `last_seen` auf (Upsert)
    async fn vermerken(&self, code: &TenantCode, name: &str) -> DbResult<()>;

    /// Alle bekannten Abonnenten eines Mandanten, alphabetisch sortiert
    async fn alle(&self, code: &TenantCode) -> DbResult<Vec<AbonnentRecord>>;
}

/// Repository fuer den Nachrichten-Log
#[allow(async_fn_in_trait)]
pub trait MessageRepository: Send + Sync {
    /// Fuegt eine Nachricht samt expliziter Empfaengerliste ein
    async fn einfuegen(&self, data: NeueNachricht<'_>) -> DbResult<NachrichtRecord>;

    /// Laedt eine einzelne Nachricht anhand ihrer ID
    async fn laden(&self, message_id: i64) -> DbResult<Option<NachrichtRecord>>;

    /// History fuer einen Abonnenten: Moderator-Nachrichten die an alle
    /// oder explizit an diesen Namen gerichtet sind, ohne die vom
    /// Abonnenten verborgenen; neueste zuerst
    async fn fuer_abonnent(
        &self,
        code: &TenantCode,
        name: &str,
        limit: i64,
    ) -> DbResult<Vec<NachrichtRecord>>;

    /// Verbirgt eine Nachricht aus der Sicht eines Abonnenten (idempotent)
    async fn verbergen(&self, message_id: i64, name: &str) -> DbResult<()>;

    /// Entfernt eine Nachricht endgueltig fuer alle Empfaenger
    ///
    /// Gibt false zurueck wenn die Nachricht nicht existierte.
    async fn loeschen(&self, message_id: i64) -> DbResult<bool>;

    /// Loescht die aeltesten Abonnenten-Nachrichten eines Mandanten,
    /// sodass hoechstens `behalten` uebrig bleiben; Moderator-Nachrichten
    /// bleiben unberuehrt. Gibt die Anzahl der geloeschten Zeilen zurueck
    async fn kuerzen(&self, code: &TenantCode, behalten: i64) -> DbResult<u64>;

    /// Posteingang des Moderators: Abonnenten-Nachrichten, neueste zuerst
    async fn posteingang(&self, code: &TenantCode, limit: i64) -> DbResult<Vec<NachrichtRecord>>;

    /// Versand-History des Moderators, neueste zuerst
    async fn gesendete(&self, code: &TenantCode, limit: i64) -> DbResult<Vec<NachrichtRecord>>;

    /// Explizite Empfaengernamen einer Nachricht
    async fn empfaenger(&self, message_id: i64) -> DbResult<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_config_standard() {
        let cfg = DatabaseConfig::default();
        assert!(cfg.sqlite_wal);
        assert_eq!(cfg.max_verbindungen, 5);
        assert!(cfg.url.starts_with("sqlite://"));
    }
}
