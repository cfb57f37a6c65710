//! Message-Dispatcher – Routet ControlMessages an die richtigen Handler
//!
//! Der Dispatcher empfaengt ControlMessages von einer ClientConnection,
//! bestimmt den richtigen Handler und gibt die Antwort zurueck. Vor dem
//! Beitritt sind nur Join-Anfragen und Ping/Pong erlaubt; alles andere
//! setzt eine aktive Sitzung voraus.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use klassenruf_core::types::{ConnectionId, Rolle};
use klassenruf_db::{
    MessageRepository, SettingsRepository, SubscriberRepository, TenantRepository,
};
use klassenruf_protocol::control::{
    ControlMessage, ControlPayload, ErrorCode, SubscriberDisconnected,
};

use crate::handlers::{join_handler, moderation_handler, nachrichten_handler};
use crate::registry::SitzungsInfo;
use crate::rooms::Raum;
use crate::server_state::SignalingState;

/// Kontext einer einzelnen Client-Verbindung
#[derive(Debug, Clone)]
pub struct DispatcherContext {
    /// Adresse des Clients
    pub peer_addr: SocketAddr,
    /// Verbindungs-ID, beim Accept vergeben
    pub connection_id: ConnectionId,
}

/// MessageDispatcher routet eingehende ControlMessages
pub struct MessageDispatcher<R>
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    state: Arc<SignalingState<R>>,
}

impl<R> MessageDispatcher<R>
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<SignalingState<R>>) -> Self {
        Self { state }
    }

    /// Zugriff auf den geteilten Zustand
    pub fn state(&self) -> &Arc<SignalingState<R>> {
        &self.state
    }

    /// Verarbeitet eine eingehende Nachricht und liefert die Antwort
    ///
    /// `None` bedeutet: keine Antwort noetig (z.B. eingehendes Pong).
    pub async fn dispatch(
        &self,
        msg: ControlMessage,
        ctx: &DispatcherContext,
    ) -> Option<ControlMessage> {
        let request_id = msg.request_id;
        let session = self.state.registry.nachschlagen(&ctx.connection_id);

        match msg.payload {
            // Beitritt: nur ohne bestehende Sitzung
            ControlPayload::ModeratorJoin(req) => {
                if session.is_some() {
                    return Some(ControlMessage::error(
                        request_id,
                        ErrorCode::ValidationError,
                        "Bereits beigetreten",
                    ));
                }
                Some(
                    join_handler::handle_moderator_join(
                        req,
                        request_id,
                        ctx.connection_id,
                        &self.state,
                    )
                    .await,
                )
            }
            ControlPayload::SubscriberJoin(req) => {
                if session.is_some() {
                    return Some(ControlMessage::error(
                        request_id,
                        ErrorCode::ValidationError,
                        "Bereits beigetreten",
                    ));
                }
                Some(
                    join_handler::handle_subscriber_join(
                        req,
                        request_id,
                        ctx.connection_id,
                        &self.state,
                    )
                    .await,
                )
            }

            // Keepalive laeuft unabhaengig vom Sitzungszustand
            ControlPayload::Ping(ping) => {
                let jetzt = chrono::Utc::now().timestamp_millis() as u64;
                Some(ControlMessage::pong(request_id, ping.timestamp_ms, jetzt))
            }
            ControlPayload::Pong(_) => {
                trace!(peer = %ctx.peer_addr, "Pong empfangen");
                None
            }

            payload => {
                let Some(session) = session else {
                    debug!(peer = %ctx.peer_addr, "Anfrage ohne Sitzung abgelehnt");
                    return Some(ControlMessage::error(
                        request_id,
                        ErrorCode::Unauthorized,
                        "Zuerst beitreten",
                    ));
                };
                Some(
                    self.dispatch_authenticated(payload, request_id, &session, ctx)
                        .await,
                )
            }
        }
    }

    /// Verarbeitet Nachrichten die eine aktive Sitzung voraussetzen
    async fn dispatch_authenticated(
        &self,
        payload: ControlPayload,
        request_id: u32,
        session: &SitzungsInfo,
        ctx: &DispatcherContext,
    ) -> ControlMessage {
        match payload {
            ControlPayload::Send(req) => {
                nachrichten_handler::handle_send(req, request_id, session, &self.state).await
            }
            ControlPayload::History => {
                nachrichten_handler::handle_history(request_id, session, &self.state).await
            }
            ControlPayload::Hide(req) => {
                nachrichten_handler::handle_hide(req, request_id, session, &self.state).await
            }

            ControlPayload::Takedown(req) => {
                moderation_handler::handle_takedown(req, request_id, session, &self.state).await
            }
            ControlPayload::Kick(req) => {
                moderation_handler::handle_kick(req, request_id, session, &self.state).await
            }
            ControlPayload::ToggleAllow(req) => {
                moderation_handler::handle_toggle_allow(req, request_id, session, &self.state)
                    .await
            }
            ControlPayload::ModeratorInbox => {
                moderation_handler::handle_inbox(request_id, session, &self.state).await
            }
            ControlPayload::SentHistory => {
                moderation_handler::handle_sent_history(request_id, session, &self.state).await
            }

            // Antworten und Benachrichtigungen kommen nie vom Client
            _ => {
                warn!(peer = %ctx.peer_addr, "Unerwartete Nachricht vom Client");
                ControlMessage::error(
                    request_id,
                    ErrorCode::ValidationError,
                    "Unerwartete Nachricht",
                )
            }
        }
    }

    /// Raeumt nach dem Ende einer Verbindung auf
    ///
    /// Entfernt die Sitzung aus Registry und Router, informiert den
    /// Moderator-Raum ueber abgegangene Abonnenten und frischt deren
    /// last_seen auf.
    pub async fn verbindung_cleanup(&self, ctx: &DispatcherContext) {
        self.state.rooms.verbindung_entfernen(&ctx.connection_id);

        let Some(info) = self.state.registry.entfernen(&ctx.connection_id) else {
            return;
        };

        if info.rolle == Rolle::Abonnent {
            self.state.rooms.an_raum_senden(
                &Raum::moderatoren(info.tenant_code.clone()),
                ControlMessage::notification(ControlPayload::SubscriberDisconnected(
                    SubscriberDisconnected {
                        connection_id: info.connection_id,
                        name: info.name.clone(),
                    },
                )),
            );

            if let Err(e) = self
                .state
                .directory
                .abonnent_vermerken(&info.tenant_code, &info.name)
                .await
            {
                warn!(tenant = %info.tenant_code, fehler = %e, "last_seen beim Trennen nicht aktualisiert");
            }
        }

        info!(
            peer = %ctx.peer_addr,
            verbindung = %ctx.connection_id,
            rolle = %info.rolle,
            name = %info.name,
            "Sitzung beendet"
        );
    }
}
