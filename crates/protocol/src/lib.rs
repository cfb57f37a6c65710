//! klassenruf-protocol – Netzwerkprotokoll-Definitionen
//!
//! Dieses Crate definiert alle Nachrichtentypen, Enums und Strukturen
//! die zwischen Client und Server ausgetauscht werden.

pub mod control;
pub mod wire;

pub use control::{ControlMessage, ControlPayload, ErrorCode};
pub use wire::FrameCodec;
