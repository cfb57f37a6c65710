//! Datenbankmodelle fuer Klassenruf
//!
//! Diese Typen repraesentieren Datensaetze aus der Datenbank.
//! Sie sind von den Domain-Typen getrennt und dienen als reine Datenuebertragungsobjekte.

use chrono::{DateTime, Utc};
use klassenruf_core::types::{Rolle, TenantCode};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Mandanten
// ---------------------------------------------------------------------------

/// Mandanten-Datensatz aus der Datenbank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MandantRecord {
    pub code: TenantCode,
    pub name: String,
    pub credential_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Daten zum Anlegen eines neuen Mandanten
#[derive(Debug, Clone)]
pub struct NeuerMandant<'a> {
    pub code: &'a TenantCode,
    pub name: &'a str,
    pub credential_hash: &'a str,
}

// ---------------------------------------------------------------------------
// Abonnenten-Datensaetze
// ---------------------------------------------------------------------------

/// Dauerhafter Abonnenten-Datensatz eines Mandanten
///
/// Ueberlebt die Live-Verbindung: `last_seen` wird bei jedem Beitritt
/// und bei jeder Trennung aufgefrischt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbonnentRecord {
    pub tenant_code: TenantCode,
    pub name: String,
    pub last_seen: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Nachrichten
// ---------------------------------------------------------------------------

/// Nachrichten-Datensatz aus der Datenbank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NachrichtRecord {
    pub id: i64,
    pub tenant_code: TenantCode,
    pub sender_role: Rolle,
    pub sender_name: String,
    /// true wenn die Nachricht an alle Abonnenten des Mandanten gerichtet ist
    pub an_alle: bool,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Daten zum Einfuegen einer neuen Nachricht
///
/// Bei `an_alle = false` bestimmt `empfaenger` die sichtbaren Namen.
/// Eine leere Empfaengerliste ist gueltig: so werden Abonnenten-Nachrichten
/// an den Moderator abgelegt, ohne in irgendeiner Abonnenten-History
/// aufzutauchen.
#[derive(Debug, Clone)]
pub struct NeueNachricht<'a> {
    pub tenant_code: &'a TenantCode,
    pub sender_role: Rolle,
    pub sender_name: &'a str,
    pub an_alle: bool,
    pub body: &'a str,
    pub empfaenger: &'a [String],
}
