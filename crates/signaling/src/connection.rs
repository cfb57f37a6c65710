//! Client-Connection – Verwaltet eine einzelne TCP-Verbindung
//!
//! Jede TCP-Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task. Die Task liest Frames vom Socket, laesst sie vom
//! Dispatcher beantworten und schreibt Antworten sowie asynchrone
//! Benachrichtigungen aus der Sende-Queue zurueck. Schliesst der Server
//! die Sende-Queue (Kick, Verdraengung), beendet die Task die
//! Verbindung.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use klassenruf_core::types::ConnectionId;
use klassenruf_db::{
    MessageRepository, SettingsRepository, SubscriberRepository, TenantRepository,
};
use klassenruf_protocol::control::ControlMessage;
use klassenruf_protocol::wire::FrameCodec;

use crate::dispatcher::{DispatcherContext, MessageDispatcher};
use crate::server_state::SignalingState;

/// Eine einzelne Client-Verbindung
pub struct ClientConnection<R>
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    state: Arc<SignalingState<R>>,
    peer_addr: SocketAddr,
}

impl<R> ClientConnection<R>
where
    R: TenantRepository + SettingsRepository + SubscriberRepository + MessageRepository + 'static,
{
    /// Erstellt eine neue ClientConnection
    pub fn neu(state: Arc<SignalingState<R>>, peer_addr: SocketAddr) -> Self {
        Self { state, peer_addr }
    }

    /// Verarbeitet die Verbindung bis zum Ende
    ///
    /// Laeuft bis der Client die Verbindung schliesst, das Timeout
    /// ablaeuft, die Sende-Queue serverseitig geschlossen wird oder ein
    /// Shutdown-Signal eintrifft.
    pub async fn verarbeiten(
        self,
        stream: TcpStream,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) {
        let connection_id = ConnectionId::new();
        let mut framed = Framed::new(stream, FrameCodec::new());

        // Sende-Queue sofort registrieren, damit Handler schon waehrend
        // des Beitritts Benachrichtigungen zustellen koennen
        let mut sende_rx = self.state.rooms.verbindung_registrieren(connection_id);

        let ctx = DispatcherContext {
            peer_addr: self.peer_addr,
            connection_id,
        };
        let dispatcher = MessageDispatcher::neu(Arc::clone(&self.state));

        let keepalive = Duration::from_secs(self.state.config.keepalive_sek);
        let timeout = Duration::from_secs(self.state.config.verbindungs_timeout_sek);
        let mut letzte_aktivitaet = Instant::now();

        debug!(peer = %self.peer_addr, verbindung = %connection_id, "Verbindungs-Task gestartet");

        loop {
            tokio::select! {
                // Eingehendes Frame vom Client
                frame = framed.next() => {
                    match frame {
                        Some(Ok(msg)) => {
                            letzte_aktivitaet = Instant::now();
                            if let Some(antwort) = dispatcher.dispatch(msg, &ctx).await {
                                if let Err(e) = framed.send(antwort).await {
                                    warn!(peer = %self.peer_addr, fehler = %e, "Antwort senden fehlgeschlagen");
                                    break;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            warn!(peer = %self.peer_addr, fehler = %e, "Frame-Fehler, trenne Verbindung");
                            break;
                        }
                        None => {
                            debug!(peer = %self.peer_addr, "Client hat die Verbindung geschlossen");
                            break;
                        }
                    }
                }

                // Ausgehende Benachrichtigung aus der Sende-Queue
                ausgehend = sende_rx.recv() => {
                    match ausgehend {
                        Some(msg) => {
                            if let Err(e) = framed.send(msg).await {
                                warn!(peer = %self.peer_addr, fehler = %e, "Benachrichtigung senden fehlgeschlagen");
                                break;
                            }
                        }
                        // Queue geschlossen: Kick oder Verdraengung
                        None => {
                            debug!(peer = %self.peer_addr, "Verbindung serverseitig geschlossen");
                            break;
                        }
                    }
                }

                // Keepalive und Timeout
                _ = tokio::time::sleep(keepalive) => {
                    if letzte_aktivitaet.elapsed() > timeout {
                        warn!(peer = %self.peer_addr, "Verbindungs-Timeout, trenne Verbindung");
                        break;
                    }
                    let jetzt = chrono::Utc::now().timestamp_millis() as u64;
                    if framed.send(ControlMessage::ping(0, jetzt)).await.is_err() {
                        break;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        debug!(peer = %self.peer_addr, "Shutdown, trenne Verbindung");
                        break;
                    }
                }
            }
        }

        dispatcher.verbindung_cleanup(&ctx).await;
    }
}
