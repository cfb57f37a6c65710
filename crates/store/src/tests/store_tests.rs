//! Unit-Tests fuer den MessageStore

use std::sync::Arc;

use klassenruf_core::types::{Rolle, TenantCode};
use klassenruf_db::{models::NeuerMandant, SqliteDb, TenantRepository};

use crate::{
    error::StoreError,
    service::{MessageStore, StoreGrenzen},
};

async fn test_db() -> Arc<SqliteDb> {
    Arc::new(
        SqliteDb::in_memory()
            .await
            .expect("In-Memory-DB konnte nicht geoeffnet werden"),
    )
}

fn code(s: &str) -> TenantCode {
    TenantCode::parse(s).unwrap()
}

async fn setup_mandant(db: &Arc<SqliteDb>, c: &TenantCode) {
    TenantRepository::erstellen(
        db.as_ref(),
        NeuerMandant {
            code: c,
            name: "Moderator",
            credential_hash: "hash",
        },
    )
    .await
    .expect("Mandant anlegen fehlgeschlagen");
}

#[tokio::test]
async fn anhaengen_und_abfragen() {
    let db = test_db().await;
    let c = code("111111");
    setup_mandant(&db, &c).await;
    let store = MessageStore::neu(db);

    let nachricht = store
        .anhaengen(&c, Rolle::Moderator, "Moderator", true, &[], "Hallo alle")
        .await
        .expect("anhaengen fehlgeschlagen");
    assert!(nachricht.an_alle);

    let history = store.abfragen(&c, "Alice").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].body, "Hallo alle");
}

#[tokio::test]
async fn leere_nachricht_abgelehnt() {
    let db = test_db().await;
    let c = code("222222");
    setup_mandant(&db, &c).await;
    let store = MessageStore::neu(db);

    let err = store
        .anhaengen(&c, Rolle::Moderator, "Moderator", true, &[], "   ")
        .await;
    assert!(matches!(err, Err(StoreError::UngueltigeEingabe(_))));
}

#[tokio::test]
async fn zu_lange_nachricht_abgelehnt() {
    let db = test_db().await;
    let c = code("333333");
    setup_mandant(&db, &c).await;
    let store = MessageStore::mit_grenzen(
        db,
        StoreGrenzen {
            max_laenge: 10,
            ..Default::default()
        },
    );

    let err = store
        .anhaengen(&c, Rolle::Moderator, "Moderator", true, &[], "viel zu lange nachricht")
        .await;
    assert!(matches!(err, Err(StoreError::UngueltigeEingabe(_))));
}

#[tokio::test]
async fn gezielte_nachricht_nur_fuer_empfaenger() {
    let db = test_db().await;
    let c = code("444444");
    setup_mandant(&db, &c).await;
    let store = MessageStore::neu(db);

    store
        .anhaengen(
            &c,
            Rolle::Moderator,
            "Moderator",
            false,
            &["Alice".into()],
            "nur alice",
        )
        .await
        .unwrap();

    assert_eq!(store.abfragen(&c, "Alice").await.unwrap().len(), 1);
    assert!(store.abfragen(&c, "Bob").await.unwrap().is_empty());
}

#[tokio::test]
async fn verbergen_wirkt_nur_auf_eigene_ansicht() {
    let db = test_db().await;
    let c = code("555555");
    setup_mandant(&db, &c).await;
    let store = MessageStore::neu(db);

    let nachricht = store
        .anhaengen(&c, Rolle::Moderator, "Moderator", true, &[], "sichtbar")
        .await
        .unwrap();

    store.verbergen(&c, "Alice", nachricht.id).await.unwrap();
    // Idempotent
    store.verbergen(&c, "Alice", nachricht.id).await.unwrap();

    assert!(store.abfragen(&c, "Alice").await.unwrap().is_empty());
    assert_eq!(store.abfragen(&c, "Bob").await.unwrap().len(), 1);
}

#[tokio::test]
async fn verbergen_unbekannte_nachricht_fehler() {
    let db = test_db().await;
    let c = code("666666");
    setup_mandant(&db, &c).await;
    let store = MessageStore::neu(db);

    let err = store.verbergen(&c, "Alice", 9999).await;
    assert!(matches!(err, Err(StoreError::NachrichtNichtGefunden(9999))));
}

#[tokio::test]
async fn endgueltig_loeschen_entfernt_fuer_alle() {
    let db = test_db().await;
    let c = code("777777");
    setup_mandant(&db, &c).await;
    let store = MessageStore::neu(db);

    let nachricht = store
        .anhaengen(&c, Rolle::Moderator, "Moderator", true, &[], "weg damit")
        .await
        .unwrap();

    store.endgueltig_loeschen(&c, nachricht.id).await.unwrap();

    assert!(store.abfragen(&c, "Alice").await.unwrap().is_empty());
    assert!(store.abfragen(&c, "Bob").await.unwrap().is_empty());
}

#[tokio::test]
async fn loeschen_fremder_mandant_abgelehnt() {
    let db = test_db().await;
    let c1 = code("888888");
    let c2 = code("999999");
    setup_mandant(&db, &c1).await;
    setup_mandant(&db, &c2).await;
    let store = MessageStore::neu(db);

    let nachricht = store
        .anhaengen(&c1, Rolle::Moderator, "Moderator", true, &[], "gehoert eins")
        .await
        .unwrap();

    // Mandant zwei darf weder loeschen noch von der Existenz erfahren
    let err = store.endgueltig_loeschen(&c2, nachricht.id).await;
    assert!(matches!(err, Err(StoreError::NachrichtNichtGefunden(_))));

    // Nachricht ist unveraendert sichtbar
    assert_eq!(store.abfragen(&c1, "Alice").await.unwrap().len(), 1);
}

#[tokio::test]
async fn posteingang_wird_auf_obergrenze_gekuerzt() {
    let db = test_db().await;
    let c = code("121212");
    setup_mandant(&db, &c).await;
    let store = MessageStore::mit_grenzen(
        db,
        StoreGrenzen {
            log_behalten: 5,
            ..Default::default()
        },
    );

    store
        .anhaengen(&c, Rolle::Moderator, "Moderator", true, &[], "ansage")
        .await
        .unwrap();
    for i in 0..8 {
        store
            .anhaengen(&c, Rolle::Abonnent, "Alice", false, &[], &format!("n{i}"))
            .await
            .unwrap();
    }

    let posteingang = store.posteingang(&c).await.unwrap();
    assert_eq!(posteingang.len(), 5);
    assert_eq!(posteingang[0].body, "n7");

    // Moderator-Nachrichten werden nicht gekuerzt
    assert_eq!(store.gesendete(&c).await.unwrap().len(), 1);
}

#[tokio::test]
async fn posteingang_sammelt_abonnenten_nachrichten() {
    let db = test_db().await;
    let c = code("343434");
    setup_mandant(&db, &c).await;
    let store = MessageStore::neu(db);

    store
        .anhaengen(&c, Rolle::Abonnent, "Alice", false, &[], "frage von alice")
        .await
        .unwrap();
    store
        .anhaengen(&c, Rolle::Moderator, "Moderator", true, &[], "ansage")
        .await
        .unwrap();

    let posteingang = store.posteingang(&c).await.unwrap();
    assert_eq!(posteingang.len(), 1);
    assert_eq!(posteingang[0].sender_name, "Alice");

    // Die Abonnenten-Nachricht taucht in keiner History auf
    let history = store.abfragen(&c, "Bob").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].body, "ansage");
}

#[tokio::test]
async fn gesendete_enthaelt_empfaengerliste() {
    let db = test_db().await;
    let c = code("565656");
    setup_mandant(&db, &c).await;
    let store = MessageStore::neu(db);

    store
        .anhaengen(
            &c,
            Rolle::Moderator,
            "Moderator",
            false,
            &["Alice".into(), "Bob".into()],
            "an zwei",
        )
        .await
        .unwrap();

    let gesendet = store.gesendete(&c).await.unwrap();
    assert_eq!(gesendet.len(), 1);
    assert_eq!(gesendet[0].empfaenger, vec!["Alice".to_string(), "Bob".to_string()]);
}
