//! Domain-Typen des Nachrichten-Logs
//!
//! Von den DB-Records getrennt, damit die Netzwerkschicht nicht an das
//! Persistenzformat gekoppelt ist.

use chrono::{DateTime, Utc};
use klassenruf_core::types::{Rolle, TenantCode};
use serde::{Deserialize, Serialize};

/// Eine gespeicherte Nachricht
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nachricht {
    pub id: i64,
    pub tenant_code: TenantCode,
    pub sender_role: Rolle,
    pub sender_name: String,
    pub an_alle: bool,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Eine gesendete Moderator-Nachricht samt Empfaengerliste
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GesendeteNachricht {
    pub nachricht: Nachricht,
    /// Explizite Empfaengernamen; leer bei `an_alle = true`
    pub empfaenger: Vec<String>,
}

/// Konvertiert einen DB-Record in den Domain-Typ
pub(crate) fn record_to_nachricht(record: klassenruf_db::models::NachrichtRecord) -> Nachricht {
    Nachricht {
        id: record.id,
        tenant_code: record.tenant_code,
        sender_role: record.sender_role,
        sender_name: record.sender_name,
        an_alle: record.an_alle,
        body: record.body,
        created_at: record.created_at,
    }
}
