//! TenantDirectory – Registrierung, Anmeldung und Einstellungen

use std::sync::Arc;

use dashmap::DashMap;
use rand::Rng;
use tracing::{debug, info};

use klassenruf_core::types::TenantCode;
use klassenruf_db::{
    models::{AbonnentRecord, MandantRecord, NeuerMandant},
    SettingsRepository, SubscriberRepository, TenantRepository,
};

use crate::error::{DirectoryError, DirectoryResult};

/// Maximale Versuche bei der Code-Vergabe bevor aufgegeben wird
const MAX_CODE_VERSUCHE: u32 = 64;

/// TenantDirectory verwaltet Mandanten und deren Einstellungen
///
/// Das Erlaubnis-Flag wird pro Mandant gecacht: Lesezugriffe gehen nur
/// beim ersten Mal zur Datenbank, Schreibzugriffe aktualisieren DB und
/// Cache gemeinsam.
pub struct TenantDirectory<R>
where
    R: TenantRepository + SettingsRepository + SubscriberRepository,
{
    repo: Arc<R>,
    erlaubnis_cache: DashMap<TenantCode, bool>,
}

impl<R> TenantDirectory<R>
where
    R: TenantRepository + SettingsRepository + SubscriberRepository,
{
    /// Erstellt ein neues TenantDirectory
    pub fn neu(repo: Arc<R>) -> Arc<Self> {
        Arc::new(Self {
            repo,
            erlaubnis_cache: DashMap::new(),
        })
    }

    /// Registriert einen neuen Mandanten und vergibt einen freien Code
    ///
    /// Der sechsstellige Code wird zufaellig gewuerfelt; bei einer
    /// Kollision wird neu gewuerfelt, mit fester Obergrenze an Versuchen.
    pub async fn registrieren(
        &self,
        name: &str,
        credential_hash: &str,
    ) -> DirectoryResult<MandantRecord> {
        if name.trim().is_empty() {
            return Err(DirectoryError::UngueltigeEingabe(
                "Name darf nicht leer sein".into(),
            ));
        }

        for versuch in 1..=MAX_CODE_VERSUCHE {
            let code = zufaelliger_code();
            match self
                .repo
                .erstellen(NeuerMandant {
                    code: &code,
                    name,
                    credential_hash,
                })
                .await
            {
                Ok(record) => {
                    info!(code = %record.code, versuch, "Mandant registriert");
                    return Ok(record);
                }
                Err(e) if e.ist_eindeutigkeit() => {
                    debug!(code = %code, versuch, "Mandanten-Code kollidiert, wuerfle neu");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(DirectoryError::CodeVergabeFehlgeschlagen(MAX_CODE_VERSUCHE))
    }

    /// Laedt einen Mandanten anhand seines Codes
    pub async fn laden(&self, code: &TenantCode) -> DirectoryResult<Option<MandantRecord>> {
        Ok(self.repo.laden(code).await?)
    }

    /// Meldet einen Moderator an und frischt den Login-Zeitpunkt auf
    pub async fn anmelden(
        &self,
        code: &TenantCode,
        credential_hash: &str,
    ) -> DirectoryResult<MandantRecord> {
        let record = self
            .repo
            .laden(code)
            .await?
            .ok_or_else(|| DirectoryError::MandantNichtGefunden(code.to_string()))?;

        if record.credential_hash != credential_hash {
            return Err(DirectoryError::AnmeldungFehlgeschlagen);
        }

        self.repo.login_vermerken(code).await?;
        Ok(record)
    }

    /// Frischt den Login-Zeitpunkt eines Mandanten auf
    pub async fn login_vermerken(&self, code: &TenantCode) -> DirectoryResult<()> {
        Ok(self.repo.login_vermerken(code).await?)
    }

    /// Vermerkt einen Abonnenten-Beitritt (Upsert auf last_seen)
    pub async fn abonnent_vermerken(
        &self,
        code: &TenantCode,
        name: &str,
    ) -> DirectoryResult<()> {
        if name.trim().is_empty() {
            return Err(DirectoryError::UngueltigeEingabe(
                "Name darf nicht leer sein".into(),
            ));
        }
        Ok(SubscriberRepository::vermerken(self.repo.as_ref(), code, name).await?)
    }

    /// Alle bekannten Abonnenten eines Mandanten
    pub async fn abonnenten(&self, code: &TenantCode) -> DirectoryResult<Vec<AbonnentRecord>> {
        Ok(SubscriberRepository::alle(self.repo.as_ref(), code).await?)
    }

    /// Liest das Erlaubnis-Flag fuer Abonnenten-Nachrichten (gecacht)
    pub async fn erlaubnis(&self, code: &TenantCode) -> DirectoryResult<bool> {
        if let Some(wert) = self.erlaubnis_cache.get(code) {
            return Ok(*wert);
        }

        let wert = self.repo.erlaubnis_laden(code).await?;
        self.erlaubnis_cache.insert(code.clone(), wert);
        Ok(wert)
    }

    /// Setzt das Erlaubnis-Flag (Datenbank und Cache gemeinsam)
    pub async fn erlaubnis_setzen(
        &self,
        code: &TenantCode,
        erlaubt: bool,
    ) -> DirectoryResult<()> {
        self.repo.erlaubnis_setzen(code, erlaubt).await?;
        self.erlaubnis_cache.insert(code.clone(), erlaubt);
        info!(tenant = %code, erlaubt, "Erlaubnis-Flag gesetzt");
        Ok(())
    }

    /// Prueft ob ein Mandanten-Code existiert
    pub async fn existiert(&self, code: &TenantCode) -> DirectoryResult<bool> {
        Ok(self.repo.laden(code).await?.is_some())
    }
}

/// Wuerfelt einen sechsstelligen Code (fuehrende Nullen erlaubt)
fn zufaelliger_code() -> TenantCode {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    TenantCode::unchecked(format!("{n:06}"))
}
