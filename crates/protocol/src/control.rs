//! Control-Protokoll (TCP)
//!
//! Definiert alle Steuerungsnachrichten die ueber die TCP-Verbindung
//! zwischen Client und Server ausgetauscht werden.
//!
//! ## Design
//! - Request/Response Pattern: jede Nachricht hat eine `request_id: u32`
//! - Server-initiierte Benachrichtigungen tragen `request_id = 0`
//! - JSON-Serialisierung via serde
//! - Tagged Enums fuer typsichere Nachrichtentypen

use klassenruf_core::types::{ConnectionId, Rolle, TenantCode};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Fehler-Codes
// ---------------------------------------------------------------------------

/// Standardisierte Fehler-Codes fuer Error-Responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Pflichtfeld fehlt oder ist fehlerhaft; abgelehnt vor jeder Mutation
    ValidationError,
    /// Unbekannter Mandanten-Code
    InvalidTenant,
    /// Moderations-Aktion ohne passende Rolle oder fuer einen fremden Mandanten
    Unauthorized,
    /// Ziel-Sitzung oder Nachricht nicht vorhanden
    NotFound,
    /// Abonnenten-Nachricht waehrend die Annahme deaktiviert ist
    Forbidden,
    /// Persistenzschicht nicht erreichbar
    PersistenceError,
    /// Unerwarteter interner Fehler
    InternalError,
}

// ---------------------------------------------------------------------------
// Join-Nachrichten
// ---------------------------------------------------------------------------

/// Moderator-Beitritt
///
/// Die Anmeldepruefung ist zu diesem Zeitpunkt bereits erfolgt; diese
/// Nachricht registriert nur die Live-Sitzung des Moderators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeratorJoinRequest {
    pub tenant_code: TenantCode,
    pub display_name: String,
}

/// Eintrag in der Abonnenten-Uebersicht des Moderators
///
/// Mischt dauerhafte Datensaetze (last_seen) mit dem Live-Status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEintrag {
    pub name: String,
    /// ConnectionId falls aktuell verbunden
    pub connection_id: Option<ConnectionId>,
    pub is_online: bool,
    /// Letzter bekannter Kontakt (RFC 3339)
    pub last_seen: String,
}

/// Antwort auf den Moderator-Beitritt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeratorJoinResponse {
    pub roster: Vec<RosterEintrag>,
    pub allow_subscriber_messages: bool,
}

/// Abonnenten-Beitritt mit Mandanten-Code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberJoinRequest {
    pub tenant_code: TenantCode,
    pub name: String,
}

/// Bestaetigung des Abonnenten-Beitritts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberJoinResponse {
    pub connection_id: ConnectionId,
    /// Anzeigename des Mandanten
    pub tenant_name: String,
    pub allow_subscriber_messages: bool,
}

// ---------------------------------------------------------------------------
// Nachrichten senden & lesen
// ---------------------------------------------------------------------------

/// Adressierung einer Moderator-Nachricht
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendRecipients {
    /// Alle aktuellen und kuenftigen Abonnenten des Mandanten
    All,
    /// Explizit ausgewaehlte Live-Verbindungen
    Selected(Vec<ConnectionId>),
}

/// Nachricht senden (Moderator oder Abonnent)
///
/// Abonnenten-Nachrichten gehen immer an den Moderator; das
/// `recipients`-Feld wird dort ignoriert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest {
    pub recipients: SendRecipients,
    pub body: String,
}

/// Bestaetigung mit der vergebenen Nachrichten-ID
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResponse {
    pub message_id: i64,
}

/// Eintrag der Abonnenten-History
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageInfo {
    pub message_id: i64,
    pub sender: String,
    pub sender_role: Rolle,
    pub body: String,
    /// Erstellungszeitpunkt (RFC 3339)
    pub created_at: String,
}

/// History-Antwort (neueste zuerst, ohne verborgene Nachrichten)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<MessageInfo>,
}

/// Nachricht aus der eigenen Ansicht verbergen (Abonnent)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HideRequest {
    pub message_id: i64,
}

/// Bestaetigung des Verbergens (idempotent)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HideResponse {
    pub message_id: i64,
}

// ---------------------------------------------------------------------------
// Moderation
// ---------------------------------------------------------------------------

/// Nachricht endgueltig entfernen (Moderator)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TakedownRequest {
    pub message_id: i64,
}

/// Bestaetigung der Entfernung
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TakedownResponse {
    pub message_id: i64,
}

/// Abonnenten-Sitzung zwangsweise trennen (Moderator)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KickRequest {
    pub target: ConnectionId,
}

/// Bestaetigung des Kicks mit dem Namen der getrennten Sitzung
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KickResponse {
    pub name: String,
}

/// Annahme von Abonnenten-Nachrichten umschalten (Moderator)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleAllowRequest {
    pub allow: bool,
}

/// Aktueller Stand des Erlaubnis-Flags
///
/// Geht als Antwort an den Ausloeser und als Benachrichtigung an alle
/// Abonnenten des Mandanten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowStatus {
    pub allow: bool,
}

/// Eintrag im Moderator-Posteingang (Abonnent -> Moderator)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxEintrag {
    pub message_id: i64,
    pub name: String,
    pub body: String,
    pub created_at: String,
}

/// Posteingang-Antwort (neueste zuerst)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxResponse {
    pub messages: Vec<InboxEintrag>,
}

/// Eintrag der Versand-History des Moderators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentEintrag {
    pub message_id: i64,
    pub an_alle: bool,
    pub recipients: Vec<String>,
    pub body: String,
    pub created_at: String,
}

/// Versand-History-Antwort (neueste zuerst)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentHistoryResponse {
    pub messages: Vec<SentEintrag>,
}

// ---------------------------------------------------------------------------
// Server-Benachrichtigungen
// ---------------------------------------------------------------------------

/// Zustellung einer Nachricht an einen verbundenen Abonnenten
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiveMessage {
    pub message_id: i64,
    pub sender: String,
    pub body: String,
    pub created_at: String,
}

/// Eine Nachricht wurde vom Moderator endgueltig entfernt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRemoved {
    pub message_id: i64,
}

/// Grund einer Zwangstrennung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KickReason {
    /// Vom Moderator getrennt
    Moderator,
    /// Ein neuer Beitritt unter demselben Namen hat diese Sitzung abgeloest
    Rejoin,
}

/// Benachrichtigung an die getrennte Sitzung, unmittelbar vor dem Schliessen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kicked {
    pub reason: KickReason,
}

/// Ein Abonnent ist dem Mandanten beigetreten (an den Moderator)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberConnected {
    pub connection_id: ConnectionId,
    pub name: String,
}

/// Ein Abonnent hat die Verbindung verloren (an den Moderator)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberDisconnected {
    pub connection_id: ConnectionId,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Keepalive
// ---------------------------------------------------------------------------

/// Ping (Client -> Server oder Server -> Client)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingMessage {
    /// Unix-Timestamp in Millisekunden fuer RTT-Messung
    pub timestamp_ms: u64,
}

/// Pong-Antwort (spiegelt den Timestamp zurueck)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PongMessage {
    /// Originaler Timestamp aus dem Ping
    pub echo_timestamp_ms: u64,
    /// Server-eigener Timestamp
    pub server_timestamp_ms: u64,
}

// ---------------------------------------------------------------------------
// Haupt-Enum: ControlPayload
// ---------------------------------------------------------------------------

/// Alle moeglichen Control-Nachrichten (typsicher via Tagged Enum)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlPayload {
    // Join
    ModeratorJoin(ModeratorJoinRequest),
    ModeratorJoinResponse(ModeratorJoinResponse),
    SubscriberJoin(SubscriberJoinRequest),
    SubscriberJoinResponse(SubscriberJoinResponse),

    // Nachrichten
    Send(SendRequest),
    SendResponse(SendResponse),
    History,
    HistoryResponse(HistoryResponse),
    Hide(HideRequest),
    HideResponse(HideResponse),

    // Moderation
    Takedown(TakedownRequest),
    TakedownResponse(TakedownResponse),
    Kick(KickRequest),
    KickResponse(KickResponse),
    ToggleAllow(ToggleAllowRequest),
    AllowStatus(AllowStatus),
    ModeratorInbox,
    InboxResponse(InboxResponse),
    SentHistory,
    SentHistoryResponse(SentHistoryResponse),

    // Server-Benachrichtigungen
    ReceiveMessage(ReceiveMessage),
    MessageRemoved(MessageRemoved),
    Kicked(Kicked),
    SubscriberConnected(SubscriberConnected),
    SubscriberDisconnected(SubscriberDisconnected),

    // Keepalive
    Ping(PingMessage),
    Pong(PongMessage),

    // Error
    Error(ErrorResponse),
}

/// Standardisierte Fehler-Antwort
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Control-Frame (Umschlag fuer alle Nachrichten)
// ---------------------------------------------------------------------------

/// Control-Protokoll-Nachricht mit Request/Response-Zuordnung
///
/// Jede Nachricht traegt eine `request_id` die der Client vergibt.
/// Der Server kopiert die ID in die Antwort damit der Client Request
/// und Response zuordnen kann. Benachrichtigungen vom Server tragen
/// die ID 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlMessage {
    /// Eindeutige Nachrichten-ID fuer Request/Response-Zuordnung
    pub request_id: u32,
    /// Inhalt der Nachricht
    pub payload: ControlPayload,
}

impl ControlMessage {
    /// Erstellt eine neue Control-Nachricht
    pub fn new(request_id: u32, payload: ControlPayload) -> Self {
        Self {
            request_id,
            payload,
        }
    }

    /// Erstellt eine Server-Benachrichtigung (request_id = 0)
    pub fn notification(payload: ControlPayload) -> Self {
        Self::new(0, payload)
    }

    /// Erstellt eine Ping-Nachricht
    pub fn ping(request_id: u32, timestamp_ms: u64) -> Self {
        Self::new(
            request_id,
            ControlPayload::Ping(PingMessage { timestamp_ms }),
        )
    }

    /// Erstellt eine Pong-Antwort
    pub fn pong(request_id: u32, echo_timestamp_ms: u64, server_timestamp_ms: u64) -> Self {
        Self::new(
            request_id,
            ControlPayload::Pong(PongMessage {
                echo_timestamp_ms,
                server_timestamp_ms,
            }),
        )
    }

    /// Erstellt eine Fehler-Antwort
    pub fn error(request_id: u32, code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(
            request_id,
            ControlPayload::Error(ErrorResponse {
                code,
                message: message.into(),
            }),
        )
    }

    /// Serialisiert die Nachricht als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialisiert eine Nachricht aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
