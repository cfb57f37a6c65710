//! Gemeinsamer Server-Zustand fuer den Signaling-Service
//!
//! Haelt alle geteilten Services und Zustands-Manager als Arc-Referenzen,
//! die sicher zwischen tokio-Tasks geteilt werden koennen.

use std::sync::Arc;
use std::time::Instant;

use klassenruf_db::{
    MessageRepository, SettingsRepository, SubscriberRepository, TenantRepository,
};
use klassenruf_directory::TenantDirectory;
use klassenruf_store::MessageStore;

use crate::registry::SessionRegistry;
use crate::rooms::RoomRouter;

/// Konfiguration des Signaling-Servers
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Anzeigename des Servers
    pub server_name: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen
    pub max_clients: u32,
    /// Keepalive-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Verbindungs-Timeout in Sekunden (keine Nachricht, kein Pong)
    pub verbindungs_timeout_sek: u64,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            server_name: "Klassenruf Server".to_string(),
            max_clients: 512,
            keepalive_sek: 30,
            verbindungs_timeout_sek: 90,
        }
    }
}

/// Gemeinsamer Zustand aller Verbindungs-Tasks
///
/// Generisch ueber das Repository, damit Tests eine In-Memory-Datenbank
/// einsetzen koennen.
pub struct SignalingState<R>
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    /// Server-Konfiguration
    pub config: SignalingConfig,
    /// Mandanten-Verzeichnis (Codes, Einstellungen, Abonnenten)
    pub directory: Arc<TenantDirectory<R>>,
    /// Persistierter Nachrichten-Log
    pub store: Arc<MessageStore<R>>,
    /// Aktive Sitzungen
    pub registry: SessionRegistry,
    /// Zustellung an Raeume und Verbindungen
    pub rooms: RoomRouter,
    /// Startzeitpunkt des Servers
    pub start_time: Instant,
}

impl<R> SignalingState<R>
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    /// Erstellt einen neuen SignalingState
    pub fn neu(
        config: SignalingConfig,
        directory: Arc<TenantDirectory<R>>,
        store: Arc<MessageStore<R>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            directory,
            store,
            registry: SessionRegistry::neu(),
            rooms: RoomRouter::neu(),
            start_time: Instant::now(),
        })
    }

    /// Laufzeit des Servers in Sekunden
    pub fn uptime_sek(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
