//! Gemeinsame Identifikationstypen fuer Klassenruf
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige ID einer Live-Verbindung
///
/// Wird beim Verbindungsaufbau vergeben und gilt nur solange die
/// Verbindung lebt. Moderatoren und Abonnenten teilen denselben ID-Raum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Erstellt eine neue zufaellige ConnectionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}

/// Sechsstelliger Mandanten-Code
///
/// Global eindeutig und nach der Vergabe unveraenderlich. Der Code ist der
/// Namensraum eines Moderators: alle Sitzungen und Nachrichten haengen an
/// genau einem Code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantCode(String);

impl TenantCode {
    /// Laenge eines gueltigen Codes
    pub const LAENGE: usize = 6;

    /// Prueft und uebernimmt einen Code-String
    ///
    /// Gueltig sind genau sechs ASCII-Ziffern.
    pub fn parse(s: impl Into<String>) -> Result<Self, String> {
        let s = s.into();
        if s.len() == Self::LAENGE && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s))
        } else {
            Err(format!("Ungueltiger Mandanten-Code: '{s}'"))
        }
    }

    /// Uebernimmt einen Code ohne Pruefung (fuer Datensaetze aus der DB)
    pub fn unchecked(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Gibt den Code als &str zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rolle einer Sitzung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rolle {
    /// Der privilegierte Versender und Verwalter eines Mandanten
    Moderator,
    /// Ein beigetretener Empfaenger, an genau einen Mandanten gebunden
    Abonnent,
}

impl Rolle {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Moderator => "moderator",
            Self::Abonnent => "abonnent",
        }
    }
}

impl std::str::FromStr for Rolle {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "moderator" => Ok(Self::Moderator),
            "abonnent" => Ok(Self::Abonnent),
            other => Err(format!("Unbekannte Rolle: {other}")),
        }
    }
}

impl std::fmt::Display for Rolle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.als_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_eindeutig() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_ne!(a, b, "Zwei neue ConnectionIds muessen verschieden sein");
    }

    #[test]
    fn connection_id_display() {
        let id = ConnectionId(Uuid::nil());
        assert!(id.to_string().starts_with("conn:"));
    }

    #[test]
    fn tenant_code_gueltig() {
        let code = TenantCode::parse("123456").unwrap();
        assert_eq!(code.as_str(), "123456");
    }

    #[test]
    fn tenant_code_ungueltig() {
        assert!(TenantCode::parse("12345").is_err());
        assert!(TenantCode::parse("1234567").is_err());
        assert!(TenantCode::parse("12345a").is_err());
        assert!(TenantCode::parse("").is_err());
    }

    #[test]
    fn rolle_round_trip() {
        for rolle in [Rolle::Moderator, Rolle::Abonnent] {
            let geparst: Rolle = rolle.als_str().parse().unwrap();
            assert_eq!(rolle, geparst);
        }
    }

    #[test]
    fn ids_sind_serde_kompatibel() {
        let code = TenantCode::parse("654321").unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"654321\"");
        let code2: TenantCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, code2);
    }
}
