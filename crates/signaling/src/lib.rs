//! klassenruf-signaling – TCP Control Layer
//!
//! Dieser Crate implementiert den Signaling- und Session-Service fuer
//! Klassenruf. Er verwaltet TCP-Verbindungen, Beitritte von Moderatoren
//! und Abonnenten, die Zustellung von Benachrichtigungen an Raeume und
//! die Moderations-Operationen (Kick, Takedown, Erlaubnis-Flag).
//!
//! ## Architektur
//!
//! - [`tcp::SignalingServer`] akzeptiert Verbindungen und startet pro
//!   Verbindung eine Task in einer `LocalSet`
//! - [`connection::ClientConnection`] liest Frames, beantwortet sie
//!   ueber den Dispatcher und schreibt die Sende-Queue auf den Socket
//! - [`dispatcher::MessageDispatcher`] routet ControlMessages an die
//!   Handler und raeumt beim Verbindungsende auf
//! - [`registry::SessionRegistry`] ist die Quelle fuer "wer ist online"
//! - [`rooms::RoomRouter`] stellt Benachrichtigungen an Raeume zu
//! - [`moderation`] buendelt Kick, Takedown und Erlaubnis-Umschaltung

pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod moderation;
pub mod registry;
pub mod rooms;
pub mod server_state;
pub mod tcp;

pub use dispatcher::{DispatcherContext, MessageDispatcher};
pub use error::{SignalingError, SignalingResult};
pub use registry::{SessionRegistry, SitzungsInfo};
pub use rooms::{Publikum, Raum, RoomRouter};
pub use server_state::{SignalingConfig, SignalingState};
pub use tcp::SignalingServer;
