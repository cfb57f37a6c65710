//! RoomRouter – stellt Benachrichtigungen an Raeume und Verbindungen zu
//!
//! Jede Verbindung bekommt eine begrenzte Sende-Queue (mpsc); die
//! Verbindungs-Task liest daraus und schreibt auf den Socket. Raeume
//! gruppieren Verbindungen pro Mandant und Publikum. Das Entfernen
//! einer Verbindung schliesst ihre Queue; die Verbindungs-Task erkennt
//! das als Aufforderung, den Socket zu schliessen.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use klassenruf_core::types::{ConnectionId, TenantCode};
use klassenruf_protocol::control::ControlMessage;

/// Groesse der Sende-Queue pro Verbindung
const SENDE_QUEUE_GROESSE: usize = 64;

/// Publikum eines Raums
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Publikum {
    /// Die Moderator-Sitzung(en) eines Mandanten
    Moderatoren,
    /// Alle Abonnenten-Sitzungen eines Mandanten
    Abonnenten,
}

/// Schluessel eines Raums: Mandant plus Publikum
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Raum {
    pub tenant: TenantCode,
    pub publikum: Publikum,
}

impl Raum {
    /// Moderator-Raum eines Mandanten
    pub fn moderatoren(tenant: TenantCode) -> Self {
        Self {
            tenant,
            publikum: Publikum::Moderatoren,
        }
    }

    /// Abonnenten-Raum eines Mandanten
    pub fn abonnenten(tenant: TenantCode) -> Self {
        Self {
            tenant,
            publikum: Publikum::Abonnenten,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomRouter
// ---------------------------------------------------------------------------

struct Inner {
    /// Sende-Queues aller registrierten Verbindungen
    verbindungen: DashMap<ConnectionId, mpsc::Sender<ControlMessage>>,
    /// Mitgliederlisten pro Raum
    mitglieder: DashMap<Raum, Vec<ConnectionId>>,
}

/// RoomRouter verteilt ControlMessages an Verbindungen und Raeume
#[derive(Clone)]
pub struct RoomRouter {
    inner: Arc<Inner>,
}

impl RoomRouter {
    /// Erstellt einen neuen, leeren Router
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(Inner {
                verbindungen: DashMap::new(),
                mitglieder: DashMap::new(),
            }),
        }
    }

    /// Registriert eine Verbindung und gibt das Empfangsende ihrer Queue
    /// zurueck
    ///
    /// Die Verbindungs-Task liest aus dem Receiver und schreibt jede
    /// Nachricht auf den Socket. Liefert der Receiver `None`, wurde die
    /// Verbindung serverseitig geschlossen (Kick oder Verdraengung).
    pub fn verbindung_registrieren(
        &self,
        connection_id: ConnectionId,
    ) -> mpsc::Receiver<ControlMessage> {
        let (tx, rx) = mpsc::channel(SENDE_QUEUE_GROESSE);
        self.inner.verbindungen.insert(connection_id, tx);
        rx
    }

    /// Entfernt eine Verbindung aus allen Raeumen und schliesst ihre Queue
    pub fn verbindung_entfernen(&self, connection_id: &ConnectionId) {
        self.inner.verbindungen.remove(connection_id);
        for mut eintrag in self.inner.mitglieder.iter_mut() {
            eintrag.value_mut().retain(|id| id != connection_id);
        }
    }

    /// Nimmt eine Verbindung in einen Raum auf
    pub fn beitreten(&self, connection_id: ConnectionId, raum: Raum) {
        let mut liste = self.inner.mitglieder.entry(raum).or_default();
        if !liste.contains(&connection_id) {
            liste.push(connection_id);
        }
    }

    /// Prueft ob eine Verbindung registriert ist
    pub fn ist_registriert(&self, connection_id: &ConnectionId) -> bool {
        self.inner.verbindungen.contains_key(connection_id)
    }

    /// Sendet eine Nachricht an genau eine Verbindung
    ///
    /// Gibt false zurueck wenn die Verbindung unbekannt ist oder ihre
    /// Queue voll war; eine volle Queue verwirft die Nachricht, damit
    /// ein haengender Client den Server nicht blockiert.
    pub fn an_verbindung_senden(
        &self,
        connection_id: &ConnectionId,
        nachricht: ControlMessage,
    ) -> bool {
        let Some(tx) = self.inner.verbindungen.get(connection_id) else {
            debug!(verbindung = %connection_id, "Sendeziel nicht registriert");
            return false;
        };
        match tx.try_send(nachricht) {
            Ok(()) => true,
            Err(e) => {
                warn!(verbindung = %connection_id, fehler = %e, "Sende-Queue voll, Nachricht verworfen");
                false
            }
        }
    }

    /// Sendet eine Nachricht an alle Mitglieder eines Raums
    ///
    /// Gibt die Anzahl erfolgreich zugestellter Nachrichten zurueck.
    pub fn an_raum_senden(&self, raum: &Raum, nachricht: ControlMessage) -> usize {
        let Some(liste) = self
            .inner
            .mitglieder
            .get(raum)
            .map(|eintrag| eintrag.value().clone())
        else {
            return 0;
        };

        let mut zugestellt = 0;
        for id in liste {
            if self.an_verbindung_senden(&id, nachricht.clone()) {
                zugestellt += 1;
            }
        }
        zugestellt
    }
}

impl Default for RoomRouter {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> TenantCode {
        TenantCode::parse(s).unwrap()
    }

    #[tokio::test]
    async fn senden_an_registrierte_verbindung() {
        let router = RoomRouter::neu();
        let id = ConnectionId::new();
        let mut rx = router.verbindung_registrieren(id);

        assert!(router.an_verbindung_senden(&id, ControlMessage::ping(0, 0)));
        let empfangen = rx.recv().await.unwrap();
        assert_eq!(empfangen.request_id, 0);
    }

    #[tokio::test]
    async fn raum_erreicht_alle_mitglieder() {
        let router = RoomRouter::neu();
        let c = code("111111");
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let mut rx_a = router.verbindung_registrieren(a);
        let mut rx_b = router.verbindung_registrieren(b);
        router.beitreten(a, Raum::abonnenten(c.clone()));
        router.beitreten(b, Raum::abonnenten(c.clone()));

        let zugestellt = router.an_raum_senden(&Raum::abonnenten(c), ControlMessage::ping(0, 0));
        assert_eq!(zugestellt, 2);
        assert!(rx_a.recv().await.is_some());
        assert!(rx_b.recv().await.is_some());
    }

    #[tokio::test]
    async fn raeume_sind_mandantengetrennt() {
        let router = RoomRouter::neu();
        let a = ConnectionId::new();
        let mut rx_a = router.verbindung_registrieren(a);
        router.beitreten(a, Raum::abonnenten(code("222222")));

        let zugestellt =
            router.an_raum_senden(&Raum::abonnenten(code("333333")), ControlMessage::ping(0, 0));
        assert_eq!(zugestellt, 0);
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn entfernen_schliesst_die_queue() {
        let router = RoomRouter::neu();
        let id = ConnectionId::new();
        let mut rx = router.verbindung_registrieren(id);
        router.beitreten(id, Raum::moderatoren(code("444444")));

        router.verbindung_entfernen(&id);

        // Die Verbindungs-Task sieht das Ende der Queue
        assert!(rx.recv().await.is_none());
        assert!(!router.ist_registriert(&id));
        assert!(!router.an_verbindung_senden(&id, ControlMessage::ping(0, 0)));
    }

    #[tokio::test]
    async fn volle_queue_verwirft_statt_zu_blockieren() {
        let router = RoomRouter::neu();
        let id = ConnectionId::new();
        let _rx = router.verbindung_registrieren(id);

        for _ in 0..SENDE_QUEUE_GROESSE {
            assert!(router.an_verbindung_senden(&id, ControlMessage::ping(0, 0)));
        }
        // Queue ist voll, naechster Versuch schlaegt fehl
        assert!(!router.an_verbindung_senden(&id, ControlMessage::ping(0, 0)));
    }
}
