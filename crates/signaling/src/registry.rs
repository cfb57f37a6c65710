//! SessionRegistry – verwaltet alle aktiven Sitzungen
//!
//! Pro Mandant gibt es hoechstens eine Moderator-Sitzung und pro
//! Abonnenten-Name hoechstens eine Abonnenten-Sitzung. Ein neuer
//! Beitritt mit demselben Namen gewinnt und verdraengt die alte
//! Sitzung; die verdraengte ConnectionId wird dem Aufrufer gemeldet,
//! damit er die alte Verbindung schliessen kann.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use klassenruf_core::types::{ConnectionId, Rolle, TenantCode};

/// Informationen ueber eine aktive Sitzung
#[derive(Debug, Clone)]
pub struct SitzungsInfo {
    /// Eindeutige Verbindungs-ID
    pub connection_id: ConnectionId,
    /// Mandant zu dem die Sitzung gehoert
    pub tenant_code: TenantCode,
    /// Rolle innerhalb des Mandanten
    pub rolle: Rolle,
    /// Anzeigename
    pub name: String,
    /// Beitrittszeitpunkt
    pub joined_at: DateTime<Utc>,
}

impl SitzungsInfo {
    /// Erstellt eine neue Sitzung mit aktuellem Beitrittszeitpunkt
    pub fn neu(
        connection_id: ConnectionId,
        tenant_code: TenantCode,
        rolle: Rolle,
        name: impl Into<String>,
    ) -> Self {
        Self {
            connection_id,
            tenant_code,
            rolle,
            name: name.into(),
            joined_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionRegistry
// ---------------------------------------------------------------------------

struct Inner {
    /// Alle Sitzungen, indiziert nach ConnectionId
    sitzungen: DashMap<ConnectionId, SitzungsInfo>,
    /// Moderator-Sitzung pro Mandant
    moderatoren: DashMap<TenantCode, ConnectionId>,
    /// Abonnenten-Sitzungen pro Mandant
    abonnenten: DashMap<TenantCode, Vec<ConnectionId>>,
}

/// SessionRegistry haelt die fluechtige Sitzungstabelle des Servers
///
/// Alle Zugriffe sind lock-frei ueber DashMap; die Registry ist die
/// alleinige Quelle fuer "wer ist gerade online".
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<Inner>,
}

impl SessionRegistry {
    /// Erstellt eine neue, leere Registry
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(Inner {
                sitzungen: DashMap::new(),
                moderatoren: DashMap::new(),
                abonnenten: DashMap::new(),
            }),
        }
    }

    /// Registriert eine Moderator-Sitzung
    ///
    /// Gibt die ConnectionId der verdraengten Sitzung zurueck, falls der
    /// Mandant bereits einen Moderator online hatte.
    pub fn moderator_registrieren(&self, info: SitzungsInfo) -> Option<ConnectionId> {
        let code = info.tenant_code.clone();
        let neu = info.connection_id;
        self.inner.sitzungen.insert(neu, info);

        let alt = self.inner.moderatoren.insert(code, neu);
        match alt {
            Some(alt) if alt != neu => {
                self.inner.sitzungen.remove(&alt);
                Some(alt)
            }
            _ => None,
        }
    }

    /// Registriert eine Abonnenten-Sitzung
    ///
    /// Gibt die ConnectionId der verdraengten Sitzung zurueck, falls
    /// derselbe Name im selben Mandanten bereits online war.
    pub fn abonnent_registrieren(&self, info: SitzungsInfo) -> Option<ConnectionId> {
        let code = info.tenant_code.clone();
        let neu = info.connection_id;
        let name = info.name.clone();
        self.inner.sitzungen.insert(neu, info);

        let mut eintrag = self.inner.abonnenten.entry(code).or_default();
        let alt = eintrag
            .iter()
            .copied()
            .find(|id| {
                *id != neu
                    && self
                        .inner
                        .sitzungen
                        .get(id)
                        .is_some_and(|s| s.name == name)
            });
        if let Some(alt) = alt {
            eintrag.retain(|id| *id != alt);
            self.inner.sitzungen.remove(&alt);
        }
        eintrag.push(neu);
        alt
    }

    /// Entfernt eine Sitzung und gibt ihre Informationen zurueck
    pub fn entfernen(&self, connection_id: &ConnectionId) -> Option<SitzungsInfo> {
        let (_, info) = self.inner.sitzungen.remove(connection_id)?;

        match info.rolle {
            Rolle::Moderator => {
                self.inner
                    .moderatoren
                    .remove_if(&info.tenant_code, |_, id| id == connection_id);
            }
            Rolle::Abonnent => {
                if let Some(mut liste) = self.inner.abonnenten.get_mut(&info.tenant_code) {
                    liste.retain(|id| id != connection_id);
                }
            }
        }

        Some(info)
    }

    /// Schlaegt eine Sitzung anhand ihrer ConnectionId nach
    pub fn nachschlagen(&self, connection_id: &ConnectionId) -> Option<SitzungsInfo> {
        self.inner
            .sitzungen
            .get(connection_id)
            .map(|s| s.clone())
    }

    /// Alle aktiven Abonnenten-Sitzungen eines Mandanten
    pub fn abonnenten_von(&self, code: &TenantCode) -> Vec<SitzungsInfo> {
        let Some(liste) = self.inner.abonnenten.get(code) else {
            return Vec::new();
        };
        liste
            .iter()
            .filter_map(|id| self.inner.sitzungen.get(id).map(|s| s.clone()))
            .collect()
    }

    /// Sucht die Abonnenten-Sitzung eines Namens innerhalb eines Mandanten
    pub fn abonnent_nach_name(&self, code: &TenantCode, name: &str) -> Option<SitzungsInfo> {
        self.abonnenten_von(code)
            .into_iter()
            .find(|s| s.name == name)
    }

    /// Die Moderator-Sitzung eines Mandanten, falls online
    pub fn moderator_von(&self, code: &TenantCode) -> Option<SitzungsInfo> {
        let id = *self.inner.moderatoren.get(code)?;
        self.nachschlagen(&id)
    }

    /// Anzahl aller aktiven Sitzungen
    pub fn online_anzahl(&self) -> usize {
        self.inner.sitzungen.len()
    }
}

impl Default for SessionRegistry {
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

    fn abonnent(c: &TenantCode, name: &str) -> SitzungsInfo {
        SitzungsInfo::neu(ConnectionId::new(), c.clone(), Rolle::Abonnent, name)
    }

    #[test]
    fn moderator_wird_registriert_und_gefunden() {
        let registry = SessionRegistry::neu();
        let c = code("111111");
        let info = SitzungsInfo::neu(ConnectionId::new(), c.clone(), Rolle::Moderator, "Herr M");

        assert!(registry.moderator_registrieren(info.clone()).is_none());
        let gefunden = registry.moderator_von(&c).unwrap();
        assert_eq!(gefunden.connection_id, info.connection_id);
        assert_eq!(registry.online_anzahl(), 1);
    }

    #[test]
    fn neuer_moderator_verdraengt_alten() {
        let registry = SessionRegistry::neu();
        let c = code("222222");
        let alt = SitzungsInfo::neu(ConnectionId::new(), c.clone(), Rolle::Moderator, "Herr M");
        let neu = SitzungsInfo::neu(ConnectionId::new(), c.clone(), Rolle::Moderator, "Herr M");

        registry.moderator_registrieren(alt.clone());
        let verdraengt = registry.moderator_registrieren(neu.clone());

        assert_eq!(verdraengt, Some(alt.connection_id));
        assert!(registry.nachschlagen(&alt.connection_id).is_none());
        assert_eq!(
            registry.moderator_von(&c).unwrap().connection_id,
            neu.connection_id
        );
    }

    #[test]
    fn abonnent_gleicher_name_verdraengt() {
        let registry = SessionRegistry::neu();
        let c = code("333333");
        let alt = abonnent(&c, "Alice");
        let neu = abonnent(&c, "Alice");

        registry.abonnent_registrieren(alt.clone());
        let verdraengt = registry.abonnent_registrieren(neu.clone());

        assert_eq!(verdraengt, Some(alt.connection_id));
        assert_eq!(registry.abonnenten_von(&c).len(), 1);
        assert_eq!(
            registry.abonnent_nach_name(&c, "Alice").unwrap().connection_id,
            neu.connection_id
        );
    }

    #[test]
    fn abonnenten_verschiedener_namen_koexistieren() {
        let registry = SessionRegistry::neu();
        let c = code("444444");

        registry.abonnent_registrieren(abonnent(&c, "Alice"));
        registry.abonnent_registrieren(abonnent(&c, "Bob"));

        assert_eq!(registry.abonnenten_von(&c).len(), 2);
    }

    #[test]
    fn gleicher_name_in_anderem_mandanten_bleibt() {
        let registry = SessionRegistry::neu();
        let c1 = code("555555");
        let c2 = code("666666");

        let a1 = abonnent(&c1, "Alice");
        registry.abonnent_registrieren(a1.clone());
        let verdraengt = registry.abonnent_registrieren(abonnent(&c2, "Alice"));

        assert!(verdraengt.is_none());
        assert!(registry.nachschlagen(&a1.connection_id).is_some());
    }

    #[test]
    fn entfernen_raeumt_indizes_auf() {
        let registry = SessionRegistry::neu();
        let c = code("777777");
        let a = abonnent(&c, "Alice");
        registry.abonnent_registrieren(a.clone());

        let info = registry.entfernen(&a.connection_id).unwrap();
        assert_eq!(info.name, "Alice");
        assert!(registry.abonnenten_von(&c).is_empty());
        assert_eq!(registry.online_anzahl(), 0);

        // Zweites Entfernen ist ein No-Op
        assert!(registry.entfernen(&a.connection_id).is_none());
    }
}
