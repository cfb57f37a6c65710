//! Handler fuer Moderator- und Abonnenten-Beitritt
//!
//! Der Beitritt ist die einzige Operation die eine Sitzung anlegt.
//! Ein erneuter Beitritt mit demselben Namen gewinnt: die alte
//! Verbindung erhaelt eine Kicked-Benachrichtigung und wird
//! serverseitig geschlossen.

use tracing::{info, warn};

use klassenruf_core::types::{ConnectionId, Rolle, TenantCode};
use klassenruf_db::{
    MessageRepository, SettingsRepository, SubscriberRepository, TenantRepository,
};
use klassenruf_protocol::control::{
    ControlMessage, ControlPayload, ErrorCode, KickReason, Kicked, ModeratorJoinRequest,
    ModeratorJoinResponse, RosterEintrag, SubscriberConnected, SubscriberJoinRequest,
    SubscriberJoinResponse,
};

use crate::registry::SitzungsInfo;
use crate::rooms::Raum;
use crate::server_state::SignalingState;

/// Schliesst eine verdraengte Sitzung mit Rejoin-Begruendung
fn verdraengte_sitzung_schliessen<R>(state: &SignalingState<R>, alt: ConnectionId)
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    state.rooms.an_verbindung_senden(
        &alt,
        ControlMessage::notification(ControlPayload::Kicked(Kicked {
            reason: KickReason::Rejoin,
        })),
    );
    state.rooms.verbindung_entfernen(&alt);
}

/// Behandelt den Beitritt eines Moderators
pub async fn handle_moderator_join<R>(
    req: ModeratorJoinRequest,
    request_id: u32,
    connection_id: ConnectionId,
    state: &SignalingState<R>,
) -> ControlMessage
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    if req.display_name.trim().is_empty() {
        return ControlMessage::error(
            request_id,
            ErrorCode::ValidationError,
            "Anzeigename darf nicht leer sein",
        );
    }

    let mandant = match state.directory.laden(&req.tenant_code).await {
        Ok(Some(m)) => m,
        Ok(None) => {
            return ControlMessage::error(
                request_id,
                ErrorCode::InvalidTenant,
                "Unbekannter Mandanten-Code",
            );
        }
        Err(e) => {
            warn!(tenant = %req.tenant_code, fehler = %e, "Mandant laden fehlgeschlagen");
            return ControlMessage::error(
                request_id,
                ErrorCode::PersistenceError,
                "Mandant konnte nicht geladen werden",
            );
        }
    };

    if let Err(e) = state.directory.login_vermerken(&req.tenant_code).await {
        warn!(tenant = %req.tenant_code, fehler = %e, "Login-Zeitpunkt nicht aktualisiert");
    }

    let info = SitzungsInfo::neu(
        connection_id,
        req.tenant_code.clone(),
        Rolle::Moderator,
        req.display_name.trim(),
    );
    if let Some(alt) = state.registry.moderator_registrieren(info) {
        info!(tenant = %req.tenant_code, verdraengt = %alt, "Moderator-Sitzung uebernommen");
        verdraengte_sitzung_schliessen(state, alt);
    }
    state
        .rooms
        .beitreten(connection_id, Raum::moderatoren(req.tenant_code.clone()));

    // Roster: dauerhafte Abonnenten-Datensaetze, angereichert um den
    // Live-Status aus der Registry. Lesefehler degradieren zu einer
    // leeren Liste.
    let datensaetze = match state.directory.abonnenten(&req.tenant_code).await {
        Ok(liste) => liste,
        Err(e) => {
            warn!(tenant = %req.tenant_code, fehler = %e, "Roster konnte nicht geladen werden");
            Vec::new()
        }
    };

    let mut roster: Vec<RosterEintrag> = datensaetze
        .into_iter()
        .map(|r| {
            let live = state.registry.abonnent_nach_name(&req.tenant_code, &r.name);
            RosterEintrag {
                name: r.name,
                connection_id: live.as_ref().map(|s| s.connection_id),
                is_online: live.is_some(),
                last_seen: r.last_seen.to_rfc3339(),
            }
        })
        .collect();

    // Live-Sitzungen ohne Datensatz (z.B. wenn das Vermerken fehlschlug)
    for sitzung in state.registry.abonnenten_von(&req.tenant_code) {
        if !roster.iter().any(|e| e.name == sitzung.name) {
            roster.push(RosterEintrag {
                name: sitzung.name.clone(),
                connection_id: Some(sitzung.connection_id),
                is_online: true,
                last_seen: sitzung.joined_at.to_rfc3339(),
            });
        }
    }

    let erlaubt = erlaubnis_oder_standard(state, &req.tenant_code).await;

    info!(tenant = %req.tenant_code, name = %mandant.name, "Moderator beigetreten");
    ControlMessage::new(
        request_id,
        ControlPayload::ModeratorJoinResponse(ModeratorJoinResponse {
            roster,
            allow_subscriber_messages: erlaubt,
        }),
    )
}

/// Behandelt den Beitritt eines Abonnenten
pub async fn handle_subscriber_join<R>(
    req: SubscriberJoinRequest,
    request_id: u32,
    connection_id: ConnectionId,
    state: &SignalingState<R>,
) -> ControlMessage
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    let name = req.name.trim();
    if name.is_empty() {
        return ControlMessage::error(
            request_id,
            ErrorCode::ValidationError,
            "Name darf nicht leer sein",
        );
    }

    let mandant = match state.directory.laden(&req.tenant_code).await {
        Ok(Some(m)) => m,
        Ok(None) => {
            return ControlMessage::error(
                request_id,
                ErrorCode::InvalidTenant,
                "Unbekannter Mandanten-Code",
            );
        }
        Err(e) => {
            warn!(tenant = %req.tenant_code, fehler = %e, "Mandant laden fehlgeschlagen");
            return ControlMessage::error(
                request_id,
                ErrorCode::PersistenceError,
                "Mandant konnte nicht geladen werden",
            );
        }
    };

    if let Err(e) = state
        .directory
        .abonnent_vermerken(&req.tenant_code, name)
        .await
    {
        warn!(tenant = %req.tenant_code, name, fehler = %e, "Abonnent vermerken fehlgeschlagen");
        return ControlMessage::error(
            request_id,
            ErrorCode::PersistenceError,
            "Abonnent konnte nicht vermerkt werden",
        );
    }

    let info = SitzungsInfo::neu(connection_id, req.tenant_code.clone(), Rolle::Abonnent, name);
    if let Some(alt) = state.registry.abonnent_registrieren(info) {
        info!(tenant = %req.tenant_code, name, verdraengt = %alt, "Abonnenten-Sitzung uebernommen");
        verdraengte_sitzung_schliessen(state, alt);
    }
    state
        .rooms
        .beitreten(connection_id, Raum::abonnenten(req.tenant_code.clone()));

    state.rooms.an_raum_senden(
        &Raum::moderatoren(req.tenant_code.clone()),
        ControlMessage::notification(ControlPayload::SubscriberConnected(SubscriberConnected {
            connection_id,
            name: name.to_string(),
        })),
    );

    let erlaubt = erlaubnis_oder_standard(state, &req.tenant_code).await;

    info!(tenant = %req.tenant_code, name, "Abonnent beigetreten");
    ControlMessage::new(
        request_id,
        ControlPayload::SubscriberJoinResponse(SubscriberJoinResponse {
            connection_id,
            tenant_name: mandant.name,
            allow_subscriber_messages: erlaubt,
        }),
    )
}

/// Liest das Erlaubnis-Flag, degradiert Lesefehler zum Standard (aus)
async fn erlaubnis_oder_standard<R>(state: &SignalingState<R>, code: &TenantCode) -> bool
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    match state.directory.erlaubnis(code).await {
        Ok(wert) => wert,
        Err(e) => {
            warn!(tenant = %code, fehler = %e, "Erlaubnis-Flag nicht lesbar, nehme Standard");
            false
        }
    }
}
