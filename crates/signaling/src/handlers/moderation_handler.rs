//! Handler fuer Moderations-Operationen
//!
//! Takedown, Kick und Erlaubnis-Umschaltung laufen ueber den
//! ModerationController; Posteingang und Versand-History lesen direkt
//! aus dem Store. Alle Operationen setzen die Moderator-Rolle voraus.

use tracing::warn;

use klassenruf_core::types::Rolle;
use klassenruf_db::{
    MessageRepository, SettingsRepository, SubscriberRepository, TenantRepository,
};
use klassenruf_protocol::control::{
    AllowStatus, ControlMessage, ControlPayload, ErrorCode, InboxEintrag, InboxResponse,
    KickRequest, KickResponse, SentEintrag, SentHistoryResponse, TakedownRequest,
    TakedownResponse, ToggleAllowRequest,
};

use crate::error::SignalingError;
use crate::moderation;
use crate::registry::SitzungsInfo;
use crate::server_state::SignalingState;

/// Behandelt das endgueltige Entfernen einer Nachricht
pub async fn handle_takedown<R>(
    req: TakedownRequest,
    request_id: u32,
    session: &SitzungsInfo,
    state: &SignalingState<R>,
) -> ControlMessage
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    match moderation::nachricht_entfernen(state, session, req.message_id).await {
        Ok(message_id) => ControlMessage::new(
            request_id,
            ControlPayload::TakedownResponse(TakedownResponse { message_id }),
        ),
        Err(e) => signaling_fehler(request_id, e),
    }
}

/// Behandelt das Entfernen einer Abonnenten-Sitzung
pub async fn handle_kick<R>(
    req: KickRequest,
    request_id: u32,
    session: &SitzungsInfo,
    state: &SignalingState<R>,
) -> ControlMessage
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    match moderation::kicken(state, session, req.target).await {
        Ok(name) => ControlMessage::new(
            request_id,
            ControlPayload::KickResponse(KickResponse { name }),
        ),
        Err(e) => signaling_fehler(request_id, e),
    }
}

/// Behandelt das Umschalten des Erlaubnis-Flags
pub async fn handle_toggle_allow<R>(
    req: ToggleAllowRequest,
    request_id: u32,
    session: &SitzungsInfo,
    state: &SignalingState<R>,
) -> ControlMessage
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    match moderation::erlaubnis_setzen(state, session, req.allow).await {
        Ok(allow) => ControlMessage::new(
            request_id,
            ControlPayload::AllowStatus(AllowStatus { allow }),
        ),
        Err(e) => signaling_fehler(request_id, e),
    }
}

/// Behandelt den Abruf des Moderator-Posteingangs
///
/// Lesefehler degradieren zu einem leeren Posteingang.
pub async fn handle_inbox<R>(
    request_id: u32,
    session: &SitzungsInfo,
    state: &SignalingState<R>,
) -> ControlMessage
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    if session.rolle != Rolle::Moderator {
        return ControlMessage::error(
            request_id,
            ErrorCode::Unauthorized,
            "Nur der Moderator darf diese Operation ausfuehren",
        );
    }

    let nachrichten = match state.store.posteingang(&session.tenant_code).await {
        Ok(liste) => liste,
        Err(e) => {
            warn!(tenant = %session.tenant_code, fehler = %e, "Posteingang nicht lesbar, liefere leer");
            Vec::new()
        }
    };

    let messages = nachrichten
        .into_iter()
        .map(|n| InboxEintrag {
            message_id: n.id,
            name: n.sender_name,
            body: n.body,
            created_at: n.created_at.to_rfc3339(),
        })
        .collect();

    ControlMessage::new(
        request_id,
        ControlPayload::InboxResponse(InboxResponse { messages }),
    )
}

/// Behandelt den Abruf der Versand-History des Moderators
pub async fn handle_sent_history<R>(
    request_id: u32,
    session: &SitzungsInfo,
    state: &SignalingState<R>,
) -> ControlMessage
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    if session.rolle != Rolle::Moderator {
        return ControlMessage::error(
            request_id,
            ErrorCode::Unauthorized,
            "Nur der Moderator darf diese Operation ausfuehren",
        );
    }

    let gesendete = match state.store.gesendete(&session.tenant_code).await {
        Ok(liste) => liste,
        Err(e) => {
            warn!(tenant = %session.tenant_code, fehler = %e, "Versand-History nicht lesbar, liefere leer");
            Vec::new()
        }
    };

    let messages = gesendete
        .into_iter()
        .map(|g| SentEintrag {
            message_id: g.nachricht.id,
            an_alle: g.nachricht.an_alle,
            recipients: g.empfaenger,
            body: g.nachricht.body,
            created_at: g.nachricht.created_at.to_rfc3339(),
        })
        .collect();

    ControlMessage::new(
        request_id,
        ControlPayload::SentHistoryResponse(SentHistoryResponse { messages }),
    )
}

/// Uebersetzt Signaling-Fehler in Antwort-Frames
fn signaling_fehler(request_id: u32, e: SignalingError) -> ControlMessage {
    match e {
        SignalingError::ZugriffVerweigert(msg) => {
            ControlMessage::error(request_id, ErrorCode::Unauthorized, msg)
        }
        SignalingError::NichtGefunden(msg) => {
            ControlMessage::error(request_id, ErrorCode::NotFound, msg)
        }
        SignalingError::Persistenz(msg) => {
            warn!(fehler = %msg, "Persistenz-Fehler");
            ControlMessage::error(
                request_id,
                ErrorCode::PersistenceError,
                "Operation konnte nicht gespeichert werden",
            )
        }
        SignalingError::Intern(msg) => {
            warn!(fehler = %msg, "Unerwarteter Fehler");
            ControlMessage::error(request_id, ErrorCode::InternalError, "Interner Fehler")
        }
    }
}
