//! Handler fuer alle Control-Nachrichten
//!
//! Jeder Handler ist fuer einen bestimmten Nachrichtentyp zustaendig
//! und hat Zugriff auf den gemeinsamen SignalingState.

pub mod join_handler;
pub mod moderation_handler;
pub mod nachrichten_handler;
