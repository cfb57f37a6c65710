//! klassenruf-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;

use std::sync::Arc;

use anyhow::Result;

use klassenruf_db::{DatabaseConfig, SqliteDb};
use klassenruf_directory::TenantDirectory;
use klassenruf_signaling::{SignalingConfig, SignalingServer, SignalingState};
use klassenruf_store::{MessageStore, StoreGrenzen};

use config::ServerConfig;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Datenbankverbindung herstellen, Migrationen ausfuehren
    /// 2. Directory und Store aufbauen
    /// 3. TCP-Listener starten (Control-Protokoll)
    /// 4. Auf Ctrl-C warten und den Shutdown durchreichen
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            server_name = %self.config.server.name,
            tcp = %self.config.tcp_bind_adresse(),
            "Server startet"
        );

        let db = Arc::new(
            SqliteDb::oeffnen(&DatabaseConfig {
                url: self.config.datenbank.url.clone(),
                max_verbindungen: self.config.datenbank.max_verbindungen,
                sqlite_wal: self.config.datenbank.wal,
            })
            .await?,
        );

        let directory = TenantDirectory::neu(Arc::clone(&db));
        let store = MessageStore::mit_grenzen(
            Arc::clone(&db),
            StoreGrenzen {
                max_laenge: self.config.grenzen.max_nachrichtenlaenge,
                log_behalten: self.config.grenzen.posteingang_behalten,
                history_limit: self.config.grenzen.history_limit,
                posteingang_limit: self.config.grenzen.posteingang_limit,
            },
        );

        let signaling_config = SignalingConfig {
            server_name: self.config.server.name.clone(),
            max_clients: self.config.server.max_clients,
            keepalive_sek: self.config.netzwerk.keepalive_sek,
            verbindungs_timeout_sek: self.config.netzwerk.verbindungs_timeout_sek,
        };
        let state = SignalingState::neu(signaling_config, directory, store);

        let bind_addr = self.config.tcp_bind_adresse().parse()?;
        let signaling = SignalingServer::neu(state, bind_addr);

        // Ctrl-C in ein watch-Signal uebersetzen, das alle
        // Verbindungs-Tasks mitbekommen
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
                let _ = shutdown_tx.send(true);
            }
        });

        signaling.starten(shutdown_rx).await?;

        tracing::info!("Server beendet");
        Ok(())
    }
}
