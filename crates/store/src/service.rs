//! MessageStore – Nachrichten anhaengen, abfragen, verbergen, entfernen

use std::sync::Arc;

use tracing::debug;

use klassenruf_core::types::{Rolle, TenantCode};
use klassenruf_db::{models::NeueNachricht, MessageRepository};

use crate::{
    error::{StoreError, StoreResult},
    types::{record_to_nachricht, GesendeteNachricht, Nachricht},
};

/// Obergrenzen des Nachrichten-Logs
#[derive(Debug, Clone)]
pub struct StoreGrenzen {
    /// Maximale Nachrichtenlaenge in Zeichen
    pub max_laenge: usize,
    /// Pro Mandant behaltene Abonnenten-Nachrichten
    pub log_behalten: i64,
    /// Obergrenze der Abonnenten-History
    pub history_limit: i64,
    /// Obergrenze fuer Posteingang und Versand-History
    pub posteingang_limit: i64,
}

impl Default for StoreGrenzen {
    fn default() -> Self {
        Self {
            max_laenge: 2000,
            log_behalten: 1000,
            history_limit: 50,
            posteingang_limit: 100,
        }
    }
}

/// MessageStore verwaltet den persistierten Nachrichten-Log eines Mandanten
pub struct MessageStore<R: MessageRepository> {
    repo: Arc<R>,
    grenzen: StoreGrenzen,
}

impl<R: MessageRepository> MessageStore<R> {
    /// Erstellt einen neuen MessageStore mit Standard-Grenzen
    pub fn neu(repo: Arc<R>) -> Arc<Self> {
        Self::mit_grenzen(repo, StoreGrenzen::default())
    }

    /// Erstellt einen MessageStore mit eigenen Grenzen
    pub fn mit_grenzen(repo: Arc<R>, grenzen: StoreGrenzen) -> Arc<Self> {
        Arc::new(Self { repo, grenzen })
    }

    /// Haengt eine Nachricht an den Log an
    ///
    /// Bei `an_alle = false` bestimmt `empfaenger` die sichtbaren Namen;
    /// eine leere Liste legt die Nachricht nur fuer den Moderator-
    /// Posteingang ab (Abonnenten-Nachrichten). Nach jedem Abonnenten-
    /// Anhaengen wird der Posteingang auf die Obergrenze gekuerzt.
    pub async fn anhaengen(
        &self,
        tenant_code: &TenantCode,
        sender_role: Rolle,
        sender_name: &str,
        an_alle: bool,
        empfaenger: &[String],
        body: &str,
    ) -> StoreResult<Nachricht> {
        if body.trim().is_empty() {
            return Err(StoreError::UngueltigeEingabe(
                "Nachrichteninhalt darf nicht leer sein".into(),
            ));
        }

        if body.chars().count() > self.grenzen.max_laenge {
            return Err(StoreError::UngueltigeEingabe(format!(
                "Nachricht zu lang: {} Zeichen (Maximum: {})",
                body.chars().count(),
                self.grenzen.max_laenge
            )));
        }

        let record = self
            .repo
            .einfuegen(NeueNachricht {
                tenant_code,
                sender_role,
                sender_name,
                an_alle,
                body,
                empfaenger,
            })
            .await?;

        if sender_role == Rolle::Abonnent {
            let gekuerzt = self
                .repo
                .kuerzen(tenant_code, self.grenzen.log_behalten)
                .await?;
            if gekuerzt > 0 {
                debug!(tenant = %tenant_code, geloescht = gekuerzt, "Posteingang gekuerzt");
            }
        }

        Ok(record_to_nachricht(record))
    }

    /// History fuer einen Abonnenten: sichtbare Moderator-Nachrichten,
    /// neueste zuerst
    pub async fn abfragen(
        &self,
        tenant_code: &TenantCode,
        name: &str,
    ) -> StoreResult<Vec<Nachricht>> {
        let records = self
            .repo
            .fuer_abonnent(tenant_code, name, self.grenzen.history_limit)
            .await?;
        Ok(records.into_iter().map(record_to_nachricht).collect())
    }

    /// Verbirgt eine Nachricht aus der Sicht eines Abonnenten
    ///
    /// Wirkt nur auf die eigene Ansicht und ist idempotent. Die Nachricht
    /// muss existieren und zum Mandanten des Abonnenten gehoeren.
    pub async fn verbergen(
        &self,
        tenant_code: &TenantCode,
        name: &str,
        message_id: i64,
    ) -> StoreResult<()> {
        let nachricht = self
            .repo
            .laden(message_id)
            .await?
            .ok_or(StoreError::NachrichtNichtGefunden(message_id))?;

        if nachricht.tenant_code != *tenant_code {
            // Fremde Mandanten erfahren nicht, ob die ID existiert
            return Err(StoreError::NachrichtNichtGefunden(message_id));
        }

        self.repo.verbergen(message_id, name).await?;
        Ok(())
    }

    /// Entfernt eine Nachricht endgueltig fuer alle Empfaenger
    ///
    /// Nur innerhalb des eigenen Mandanten erlaubt.
    pub async fn endgueltig_loeschen(
        &self,
        tenant_code: &TenantCode,
        message_id: i64,
    ) -> StoreResult<()> {
        let nachricht = self
            .repo
            .laden(message_id)
            .await?
            .ok_or(StoreError::NachrichtNichtGefunden(message_id))?;

        if nachricht.tenant_code != *tenant_code {
            return Err(StoreError::NachrichtNichtGefunden(message_id));
        }

        let geloescht = self.repo.loeschen(message_id).await?;
        if !geloescht {
            return Err(StoreError::NachrichtNichtGefunden(message_id));
        }

        debug!(tenant = %tenant_code, message_id, "Nachricht endgueltig entfernt");
        Ok(())
    }

    /// Posteingang des Moderators: Abonnenten-Nachrichten, neueste zuerst
    pub async fn posteingang(&self, tenant_code: &TenantCode) -> StoreResult<Vec<Nachricht>> {
        let records = self
            .repo
            .posteingang(tenant_code, self.grenzen.posteingang_limit)
            .await?;
        Ok(records.into_iter().map(record_to_nachricht).collect())
    }

    /// Versand-History des Moderators samt Empfaengerlisten, neueste zuerst
    pub async fn gesendete(
        &self,
        tenant_code: &TenantCode,
    ) -> StoreResult<Vec<GesendeteNachricht>> {
        let records = self
            .repo
            .gesendete(tenant_code, self.grenzen.posteingang_limit)
            .await?;

        let mut ergebnis = Vec::with_capacity(records.len());
        for record in records {
            let empfaenger = if record.an_alle {
                Vec::new()
            } else {
                self.repo.empfaenger(record.id).await?
            };
            ergebnis.push(GesendeteNachricht {
                nachricht: record_to_nachricht(record),
                empfaenger,
            });
        }
        Ok(ergebnis)
    }
}
