//! Unit-Tests fuer das TenantDirectory

use std::sync::Arc;

use klassenruf_db::SqliteDb;

use crate::{error::DirectoryError, service::TenantDirectory};

async fn test_db() -> Arc<SqliteDb> {
    Arc::new(
        SqliteDb::in_memory()
            .await
            .expect("In-Memory-DB konnte nicht geoeffnet werden"),
    )
}

#[tokio::test]
async fn registrieren_vergibt_gueltigen_code() {
    let directory = TenantDirectory::neu(test_db().await);

    let mandant = directory
        .registrieren("Frau Meier", "hash")
        .await
        .expect("Registrierung fehlgeschlagen");

    assert_eq!(mandant.code.as_str().len(), 6);
    assert_eq!(mandant.name, "Frau Meier");

    let geladen = directory.laden(&mandant.code).await.unwrap();
    assert!(geladen.is_some());
}

#[tokio::test]
async fn registrieren_leerer_name_abgelehnt() {
    let directory = TenantDirectory::neu(test_db().await);

    let err = directory.registrieren("  ", "hash").await;
    assert!(matches!(err, Err(DirectoryError::UngueltigeEingabe(_))));
}

#[tokio::test]
async fn codes_sind_eindeutig() {
    let directory = TenantDirectory::neu(test_db().await);

    let a = directory.registrieren("Eins", "h1").await.unwrap();
    let b = directory.registrieren("Zwei", "h2").await.unwrap();
    assert_ne!(a.code, b.code);
}

#[tokio::test]
async fn anmelden_prueft_credential() {
    let directory = TenantDirectory::neu(test_db().await);
    let mandant = directory.registrieren("Herr Schulz", "geheim").await.unwrap();

    let angemeldet = directory
        .anmelden(&mandant.code, "geheim")
        .await
        .expect("Anmeldung fehlgeschlagen");
    assert_eq!(angemeldet.code, mandant.code);

    // Login-Zeitpunkt wurde aufgefrischt
    let geladen = directory.laden(&mandant.code).await.unwrap().unwrap();
    assert!(geladen.last_login.is_some());

    let err = directory.anmelden(&mandant.code, "falsch").await;
    assert!(matches!(err, Err(DirectoryError::AnmeldungFehlgeschlagen)));
}

#[tokio::test]
async fn anmelden_unbekannter_code() {
    let directory = TenantDirectory::neu(test_db().await);
    let code = klassenruf_core::types::TenantCode::parse("000000").unwrap();

    let err = directory.anmelden(&code, "hash").await;
    assert!(matches!(err, Err(DirectoryError::MandantNichtGefunden(_))));
}

#[tokio::test]
async fn erlaubnis_standard_und_umschalten() {
    let directory = TenantDirectory::neu(test_db().await);
    let mandant = directory.registrieren("Frau Weber", "hash").await.unwrap();

    // Standard: deaktiviert
    assert!(!directory.erlaubnis(&mandant.code).await.unwrap());

    directory.erlaubnis_setzen(&mandant.code, true).await.unwrap();
    assert!(directory.erlaubnis(&mandant.code).await.unwrap());

    directory.erlaubnis_setzen(&mandant.code, false).await.unwrap();
    assert!(!directory.erlaubnis(&mandant.code).await.unwrap());
}

#[tokio::test]
async fn abonnenten_vermerken_und_auflisten() {
    let directory = TenantDirectory::neu(test_db().await);
    let mandant = directory.registrieren("Herr Lang", "hash").await.unwrap();

    directory
        .abonnent_vermerken(&mandant.code, "Alice")
        .await
        .unwrap();
    directory
        .abonnent_vermerken(&mandant.code, "Bob")
        .await
        .unwrap();
    // Wiederholter Beitritt erzeugt keine Dublette
    directory
        .abonnent_vermerken(&mandant.code, "Alice")
        .await
        .unwrap();

    let alle = directory.abonnenten(&mandant.code).await.unwrap();
    assert_eq!(alle.len(), 2);

    let err = directory.abonnent_vermerken(&mandant.code, " ").await;
    assert!(matches!(err, Err(DirectoryError::UngueltigeEingabe(_))));
}

#[tokio::test]
async fn existiert_prueft_code() {
    let directory = TenantDirectory::neu(test_db().await);
    let mandant = directory.registrieren("Check", "hash").await.unwrap();

    assert!(directory.existiert(&mandant.code).await.unwrap());

    let fremd = klassenruf_core::types::TenantCode::parse("000000").unwrap();
    // Kollision mit dem gewuerfelten Code ist praktisch ausgeschlossen
    if fremd != mandant.code {
        assert!(!directory.existiert(&fremd).await.unwrap());
    }
}
