//! Handler fuer Senden, History und Verbergen

use tracing::warn;

use klassenruf_core::types::Rolle;
use klassenruf_db::{
    MessageRepository, SettingsRepository, SubscriberRepository, TenantRepository,
};
use klassenruf_protocol::control::{
    ControlMessage, ControlPayload, ErrorCode, HideRequest, HideResponse, HistoryResponse,
    MessageInfo, ReceiveMessage, SendRecipients, SendRequest, SendResponse,
};
use klassenruf_store::StoreError;

use crate::registry::SitzungsInfo;
use crate::rooms::Raum;
use crate::server_state::SignalingState;

/// Behandelt eine Send-Anfrage
///
/// Moderatoren senden an alle oder an ausgewaehlte Sitzungen;
/// Abonnenten senden an den Moderator, sofern das Erlaubnis-Flag
/// gesetzt ist. Zustellung an Online-Sitzungen passiert sofort, die
/// Persistenz sorgt fuer den History-Abruf spaeterer Sitzungen.
pub async fn handle_send<R>(
    req: SendRequest,
    request_id: u32,
    session: &SitzungsInfo,
    state: &SignalingState<R>,
) -> ControlMessage
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    match session.rolle {
        Rolle::Moderator => moderator_senden(req, request_id, session, state).await,
        Rolle::Abonnent => abonnent_senden(req, request_id, session, state).await,
    }
}

async fn moderator_senden<R>(
    req: SendRequest,
    request_id: u32,
    session: &SitzungsInfo,
    state: &SignalingState<R>,
) -> ControlMessage
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    // Empfaenger-Sitzungen aufloesen bevor irgendetwas persistiert wird
    let (an_alle, ziele, namen) = match &req.recipients {
        SendRecipients::All => (true, Vec::new(), Vec::new()),
        SendRecipients::Selected(ids) => {
            if ids.is_empty() {
                return ControlMessage::error(
                    request_id,
                    ErrorCode::ValidationError,
                    "Empfaengerliste darf nicht leer sein",
                );
            }
            let mut ziele: Vec<SitzungsInfo> = Vec::with_capacity(ids.len());
            let mut namen: Vec<String> = Vec::with_capacity(ids.len());
            for id in ids {
                let Some(ziel) = state
                    .registry
                    .nachschlagen(id)
                    .filter(|s| s.rolle == Rolle::Abonnent && s.tenant_code == session.tenant_code)
                else {
                    return ControlMessage::error(
                        request_id,
                        ErrorCode::NotFound,
                        "Ziel-Sitzung nicht vorhanden",
                    );
                };
                // Doppelt genannte Ziele nur einmal beliefern
                if ziele.iter().any(|z| z.connection_id == ziel.connection_id) {
                    continue;
                }
                if !namen.contains(&ziel.name) {
                    namen.push(ziel.name.clone());
                }
                ziele.push(ziel);
            }
            (false, ziele, namen)
        }
    };

    let nachricht = match state
        .store
        .anhaengen(
            &session.tenant_code,
            Rolle::Moderator,
            &session.name,
            an_alle,
            &namen,
            &req.body,
        )
        .await
    {
        Ok(n) => n,
        Err(e) => return store_fehler(request_id, e),
    };

    let benachrichtigung = ControlMessage::notification(ControlPayload::ReceiveMessage(
        ReceiveMessage {
            message_id: nachricht.id,
            sender: session.name.clone(),
            body: nachricht.body.clone(),
            created_at: nachricht.created_at.to_rfc3339(),
        },
    ));

    if an_alle {
        state.rooms.an_raum_senden(
            &Raum::abonnenten(session.tenant_code.clone()),
            benachrichtigung,
        );
    } else {
        for ziel in &ziele {
            state
                .rooms
                .an_verbindung_senden(&ziel.connection_id, benachrichtigung.clone());
        }
    }

    ControlMessage::new(
        request_id,
        ControlPayload::SendResponse(SendResponse {
            message_id: nachricht.id,
        }),
    )
}

async fn abonnent_senden<R>(
    req: SendRequest,
    request_id: u32,
    session: &SitzungsInfo,
    state: &SignalingState<R>,
) -> ControlMessage
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    let erlaubt = match state.directory.erlaubnis(&session.tenant_code).await {
        Ok(wert) => wert,
        Err(e) => {
            warn!(tenant = %session.tenant_code, fehler = %e, "Erlaubnis-Flag nicht lesbar");
            false
        }
    };
    if !erlaubt {
        return ControlMessage::error(
            request_id,
            ErrorCode::Forbidden,
            "Abonnenten-Nachrichten sind deaktiviert",
        );
    }

    // Abonnenten-Nachrichten landen mit leerer Empfaengerliste nur im
    // Moderator-Posteingang
    let nachricht = match state
        .store
        .anhaengen(
            &session.tenant_code,
            Rolle::Abonnent,
            &session.name,
            false,
            &[],
            &req.body,
        )
        .await
    {
        Ok(n) => n,
        Err(e) => return store_fehler(request_id, e),
    };

    state.rooms.an_raum_senden(
        &Raum::moderatoren(session.tenant_code.clone()),
        ControlMessage::notification(ControlPayload::ReceiveMessage(ReceiveMessage {
            message_id: nachricht.id,
            sender: session.name.clone(),
            body: nachricht.body.clone(),
            created_at: nachricht.created_at.to_rfc3339(),
        })),
    );

    ControlMessage::new(
        request_id,
        ControlPayload::SendResponse(SendResponse {
            message_id: nachricht.id,
        }),
    )
}

/// Behandelt eine History-Anfrage eines Abonnenten
///
/// Lesefehler degradieren zu einer leeren History.
pub async fn handle_history<R>(
    request_id: u32,
    session: &SitzungsInfo,
    state: &SignalingState<R>,
) -> ControlMessage
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    if session.rolle != Rolle::Abonnent {
        return ControlMessage::error(
            request_id,
            ErrorCode::Unauthorized,
            "History steht nur Abonnenten zur Verfuegung",
        );
    }

    let nachrichten = match state
        .store
        .abfragen(&session.tenant_code, &session.name)
        .await
    {
        Ok(liste) => liste,
        Err(e) => {
            warn!(tenant = %session.tenant_code, fehler = %e, "History nicht lesbar, liefere leer");
            Vec::new()
        }
    };

    let messages = nachrichten
        .into_iter()
        .map(|n| MessageInfo {
            message_id: n.id,
            sender: n.sender_name,
            sender_role: n.sender_role,
            body: n.body,
            created_at: n.created_at.to_rfc3339(),
        })
        .collect();

    ControlMessage::new(
        request_id,
        ControlPayload::HistoryResponse(HistoryResponse { messages }),
    )
}

/// Behandelt das Verbergen einer Nachricht aus der eigenen Ansicht
pub async fn handle_hide<R>(
    req: HideRequest,
    request_id: u32,
    session: &SitzungsInfo,
    state: &SignalingState<R>,
) -> ControlMessage
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    if session.rolle != Rolle::Abonnent {
        return ControlMessage::error(
            request_id,
            ErrorCode::Unauthorized,
            "Verbergen steht nur Abonnenten zur Verfuegung",
        );
    }

    match state
        .store
        .verbergen(&session.tenant_code, &session.name, req.message_id)
        .await
    {
        Ok(()) => ControlMessage::new(
            request_id,
            ControlPayload::HideResponse(HideResponse {
                message_id: req.message_id,
            }),
        ),
        Err(e) => store_fehler(request_id, e),
    }
}

/// Uebersetzt Store-Fehler in Antwort-Frames
fn store_fehler(request_id: u32, e: StoreError) -> ControlMessage {
    match e {
        StoreError::NachrichtNichtGefunden(id) => ControlMessage::error(
            request_id,
            ErrorCode::NotFound,
            format!("Nachricht {id} nicht vorhanden"),
        ),
        StoreError::UngueltigeEingabe(msg) => {
            ControlMessage::error(request_id, ErrorCode::ValidationError, msg)
        }
        StoreError::DatenbankFehler(e) => {
            warn!(fehler = %e, "Persistenz-Fehler");
            ControlMessage::error(
                request_id,
                ErrorCode::PersistenceError,
                "Nachricht konnte nicht gespeichert werden",
            )
        }
    }
}
