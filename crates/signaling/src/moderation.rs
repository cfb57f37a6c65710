//! ModerationController – Kick, Takedown und Erlaubnis-Umschaltung
//!
//! Die Funktionen hier pruefen die Moderator-Rolle, fuehren die
//! Operation aus und stellen die noetigen Benachrichtigungen zu. Die
//! Handler uebersetzen das Ergebnis anschliessend in Antwort-Frames.

use tracing::{info, warn};

use klassenruf_core::types::{ConnectionId, Rolle};
use klassenruf_db::{
    MessageRepository, SettingsRepository, SubscriberRepository, TenantRepository,
};
use klassenruf_protocol::control::{
    AllowStatus, ControlMessage, ControlPayload, KickReason, Kicked, MessageRemoved,
    SubscriberDisconnected,
};
use klassenruf_store::StoreError;

use crate::error::{SignalingError, SignalingResult};
use crate::registry::SitzungsInfo;
use crate::rooms::Raum;
use crate::server_state::SignalingState;

/// Prueft dass die Sitzung dem Moderator gehoert
fn moderator_pruefen(session: &SitzungsInfo) -> SignalingResult<()> {
    if session.rolle != Rolle::Moderator {
        return Err(SignalingError::ZugriffVerweigert(
            "Nur der Moderator darf diese Operation ausfuehren".into(),
        ));
    }
    Ok(())
}

/// Schaltet das Erlaubnis-Flag fuer Abonnenten-Nachrichten um
///
/// Alle Abonnenten des Mandanten erhalten den neuen Status als
/// Benachrichtigung.
pub async fn erlaubnis_setzen<R>(
    state: &SignalingState<R>,
    session: &SitzungsInfo,
    erlaubt: bool,
) -> SignalingResult<bool>
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    moderator_pruefen(session)?;

    state
        .directory
        .erlaubnis_setzen(&session.tenant_code, erlaubt)
        .await
        .map_err(|e| SignalingError::Persistenz(e.to_string()))?;

    state.rooms.an_raum_senden(
        &Raum::abonnenten(session.tenant_code.clone()),
        ControlMessage::notification(ControlPayload::AllowStatus(AllowStatus { allow: erlaubt })),
    );

    Ok(erlaubt)
}

/// Wirft eine Abonnenten-Sitzung vom Server
///
/// Das Ziel muss eine aktive Abonnenten-Sitzung desselben Mandanten
/// sein; gehoert es zu einem anderen Mandanten, fehlt die
/// Berechtigung. Der Betroffene erhaelt vor dem Trennen eine Kicked-
/// Benachrichtigung; der Moderator-Raum wird ueber den Abgang
/// informiert. Gibt den Namen des Entfernten zurueck.
pub async fn kicken<R>(
    state: &SignalingState<R>,
    session: &SitzungsInfo,
    ziel: ConnectionId,
) -> SignalingResult<String>
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    moderator_pruefen(session)?;

    let info = state
        .registry
        .nachschlagen(&ziel)
        .filter(|s| s.rolle == Rolle::Abonnent)
        .ok_or_else(|| {
            SignalingError::NichtGefunden("Ziel-Sitzung nicht vorhanden".into())
        })?;
    if info.tenant_code != session.tenant_code {
        return Err(SignalingError::ZugriffVerweigert(
            "Ziel-Sitzung gehoert zu einem anderen Mandanten".into(),
        ));
    }

    state.rooms.an_verbindung_senden(
        &ziel,
        ControlMessage::notification(ControlPayload::Kicked(Kicked {
            reason: KickReason::Moderator,
        })),
    );

    state.registry.entfernen(&ziel);
    state.rooms.verbindung_entfernen(&ziel);

    state.rooms.an_raum_senden(
        &Raum::moderatoren(session.tenant_code.clone()),
        ControlMessage::notification(ControlPayload::SubscriberDisconnected(
            SubscriberDisconnected {
                connection_id: ziel,
                name: info.name.clone(),
            },
        )),
    );

    // last_seen auffrischen, best effort
    if let Err(e) = state
        .directory
        .abonnent_vermerken(&session.tenant_code, &info.name)
        .await
    {
        warn!(tenant = %session.tenant_code, fehler = %e, "last_seen nach Kick nicht aktualisiert");
    }

    info!(tenant = %session.tenant_code, name = %info.name, "Abonnent entfernt");
    Ok(info.name)
}

/// Entfernt eine Nachricht endgueltig fuer alle Empfaenger
///
/// Nur innerhalb des eigenen Mandanten; alle Abonnenten erhalten eine
/// MessageRemoved-Benachrichtigung, damit die Nachricht auch aus
/// laufenden Sitzungen verschwindet.
pub async fn nachricht_entfernen<R>(
    state: &SignalingState<R>,
    session: &SitzungsInfo,
    message_id: i64,
) -> SignalingResult<i64>
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    moderator_pruefen(session)?;

    match state
        .store
        .endgueltig_loeschen(&session.tenant_code, message_id)
        .await
    {
        Ok(()) => {}
        Err(StoreError::NachrichtNichtGefunden(id)) => {
            return Err(SignalingError::NichtGefunden(format!(
                "Nachricht {id} nicht vorhanden"
            )));
        }
        Err(e) => return Err(SignalingError::Persistenz(e.to_string())),
    }

    state.rooms.an_raum_senden(
        &Raum::abonnenten(session.tenant_code.clone()),
        ControlMessage::notification(ControlPayload::MessageRemoved(MessageRemoved {
            message_id,
        })),
    );

    info!(tenant = %session.tenant_code, message_id, "Nachricht zurueckgezogen");
    Ok(message_id)
}
