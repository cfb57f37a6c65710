//! klassenruf-store – Persistierter Nachrichten-Log
//!
//! Dieses Crate implementiert den MessageStore: Nachrichten anhaengen,
//! pro-Abonnent abfragen und verbergen, endgueltig entfernen sowie den
//! Moderator-Posteingang und die Versand-History. Der Log ist
//! mandantenweise partitioniert; der Posteingang wird nach jedem
//! Abonnenten-Anhaengen auf eine feste Obergrenze gekuerzt.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use error::{StoreError, StoreResult};
pub use service::{MessageStore, StoreGrenzen};
pub use types::{GesendeteNachricht, Nachricht};
