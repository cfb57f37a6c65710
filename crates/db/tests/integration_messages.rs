//! Integration-Tests fuer MessageRepository (In-Memory SQLite)

use klassenruf_core::types::{Rolle, TenantCode};
use klassenruf_db::{
    models::{NeueNachricht, NeuerMandant},
    MessageRepository, SqliteDb, TenantRepository,
};

async fn db() -> SqliteDb {
    SqliteDb::in_memory()
        .await
        .expect("In-Memory DB konnte nicht erstellt werden")
}

fn code(s: &str) -> TenantCode {
    TenantCode::parse(s).unwrap()
}

async fn mandant_anlegen(db: &SqliteDb, c: &TenantCode) {
    TenantRepository::erstellen(
        db,
        NeuerMandant {
            code: c,
            name: "Moderator",
            credential_hash: "hash",
        },
    )
    .await
    .expect("Mandant erstellen fehlgeschlagen");
}

async fn nachricht_an_alle(db: &SqliteDb, c: &TenantCode, body: &str) -> i64 {
    MessageRepository::einfuegen(
        db,
        NeueNachricht {
            tenant_code: c,
            sender_role: Rolle::Moderator,
            sender_name: "Moderator",
            an_alle: true,
            body,
            empfaenger: &[],
        },
    )
    .await
    .expect("einfuegen fehlgeschlagen")
    .id
}

async fn nachricht_an(db: &SqliteDb, c: &TenantCode, empfaenger: &[String], body: &str) -> i64 {
    MessageRepository::einfuegen(
        db,
        NeueNachricht {
            tenant_code: c,
            sender_role: Rolle::Moderator,
            sender_name: "Moderator",
            an_alle: false,
            body,
            empfaenger,
        },
    )
    .await
    .expect("einfuegen fehlgeschlagen")
    .id
}

#[tokio::test]
async fn einfuegen_und_laden() {
    let db = db().await;
    let c = code("111111");
    mandant_anlegen(&db, &c).await;

    let id = nachricht_an_alle(&db, &c, "Hallo alle").await;

    let geladen = MessageRepository::laden(&db, id)
        .await
        .unwrap()
        .expect("Nachricht sollte gefunden werden");
    assert_eq!(geladen.body, "Hallo alle");
    assert!(geladen.an_alle);
    assert_eq!(geladen.sender_role, Rolle::Moderator);
}

#[tokio::test]
async fn history_sieht_an_alle_und_gezielte() {
    let db = db().await;
    let c = code("222222");
    mandant_anlegen(&db, &c).await;

    nachricht_an_alle(&db, &c, "fuer alle").await;
    nachricht_an(&db, &c, &["Alice".into()], "nur alice").await;
    nachricht_an(&db, &c, &["Bob".into()], "nur bob").await;

    let alice = MessageRepository::fuer_abonnent(&db, &c, "Alice", 50)
        .await
        .unwrap();
    let texte: Vec<&str> = alice.iter().map(|m| m.body.as_str()).collect();
    // Neueste zuerst
    assert_eq!(texte, vec!["nur alice", "fuer alle"]);

    let bob = MessageRepository::fuer_abonnent(&db, &c, "Bob", 50)
        .await
        .unwrap();
    assert_eq!(bob.len(), 2);
}

#[tokio::test]
async fn empfaenger_matching_ist_exakt() {
    let db = db().await;
    let c = code("333333");
    mandant_anlegen(&db, &c).await;

    // "Ann" darf die Nachricht an "Anna" nicht sehen
    nachricht_an(&db, &c, &["Anna".into()], "fuer anna").await;

    let ann = MessageRepository::fuer_abonnent(&db, &c, "Ann", 50)
        .await
        .unwrap();
    assert!(ann.is_empty());

    let anna = MessageRepository::fuer_abonnent(&db, &c, "Anna", 50)
        .await
        .unwrap();
    assert_eq!(anna.len(), 1);
}

#[tokio::test]
async fn abonnenten_nachrichten_unsichtbar_in_history() {
    let db = db().await;
    let c = code("444444");
    mandant_anlegen(&db, &c).await;

    // Abonnenten-Nachricht: leere Empfaengerliste, nur im Posteingang sichtbar
    MessageRepository::einfuegen(
        &db,
        NeueNachricht {
            tenant_code: &c,
            sender_role: Rolle::Abonnent,
            sender_name: "Alice",
            an_alle: false,
            body: "Frage an den Moderator",
            empfaenger: &[],
        },
    )
    .await
    .unwrap();

    let history = MessageRepository::fuer_abonnent(&db, &c, "Alice", 50)
        .await
        .unwrap();
    assert!(history.is_empty());

    let posteingang = MessageRepository::posteingang(&db, &c, 100).await.unwrap();
    assert_eq!(posteingang.len(), 1);
    assert_eq!(posteingang[0].sender_name, "Alice");
}

#[tokio::test]
async fn verbergen_ist_pro_abonnent_und_idempotent() {
    let db = db().await;
    let c = code("555555");
    mandant_anlegen(&db, &c).await;

    let id = nachricht_an_alle(&db, &c, "peinlich").await;

    MessageRepository::verbergen(&db, id, "Alice").await.unwrap();
    // Doppeltes Verbergen ist ein No-Op
    MessageRepository::verbergen(&db, id, "Alice").await.unwrap();

    let alice = MessageRepository::fuer_abonnent(&db, &c, "Alice", 50)
        .await
        .unwrap();
    assert!(alice.is_empty());

    // Bob sieht die Nachricht weiterhin
    let bob = MessageRepository::fuer_abonnent(&db, &c, "Bob", 50)
        .await
        .unwrap();
    assert_eq!(bob.len(), 1);
}

#[tokio::test]
async fn loeschen_entfernt_fuer_alle() {
    let db = db().await;
    let c = code("666666");
    mandant_anlegen(&db, &c).await;

    let id = nachricht_an_alle(&db, &c, "weg damit").await;

    let geloescht = MessageRepository::loeschen(&db, id).await.unwrap();
    assert!(geloescht);

    assert!(MessageRepository::laden(&db, id).await.unwrap().is_none());
    let alice = MessageRepository::fuer_abonnent(&db, &c, "Alice", 50)
        .await
        .unwrap();
    assert!(alice.is_empty());

    // Zweites Loeschen meldet false
    assert!(!MessageRepository::loeschen(&db, id).await.unwrap());
}

#[tokio::test]
async fn kuerzen_trifft_nur_abonnenten_nachrichten() {
    let db = db().await;
    let c = code("777777");
    mandant_anlegen(&db, &c).await;

    nachricht_an_alle(&db, &c, "moderator ansage").await;
    for i in 0..10 {
        MessageRepository::einfuegen(
            &db,
            NeueNachricht {
                tenant_code: &c,
                sender_role: Rolle::Abonnent,
                sender_name: "Alice",
                an_alle: false,
                body: &format!("frage {i}"),
                empfaenger: &[],
            },
        )
        .await
        .unwrap();
    }

    let geloescht = MessageRepository::kuerzen(&db, &c, 3).await.unwrap();
    assert_eq!(geloescht, 7);

    let posteingang = MessageRepository::posteingang(&db, &c, 100).await.unwrap();
    let texte: Vec<&str> = posteingang.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(texte, vec!["frage 9", "frage 8", "frage 7"]);

    // Die Moderator-Nachricht ueberlebt das Kuerzen
    let gesendet = MessageRepository::gesendete(&db, &c, 100).await.unwrap();
    assert_eq!(gesendet.len(), 1);
}

#[tokio::test]
async fn gesendete_mit_empfaengerliste() {
    let db = db().await;
    let c = code("888888");
    mandant_anlegen(&db, &c).await;

    let id = nachricht_an(&db, &c, &["Bob".into(), "Alice".into()], "an zwei").await;

    let namen = MessageRepository::empfaenger(&db, id).await.unwrap();
    assert_eq!(namen, vec!["Alice".to_string(), "Bob".to_string()]);

    let gesendet = MessageRepository::gesendete(&db, &c, 100).await.unwrap();
    assert_eq!(gesendet.len(), 1);
    assert!(!gesendet[0].an_alle);
}

#[tokio::test]
async fn nachrichten_sind_mandantengetrennt() {
    let db = db().await;
    let c1 = code("121212");
    let c2 = code("343434");
    mandant_anlegen(&db, &c1).await;
    mandant_anlegen(&db, &c2).await;

    nachricht_an_alle(&db, &c1, "nur mandant eins").await;

    let fremd = MessageRepository::fuer_abonnent(&db, &c2, "Alice", 50)
        .await
        .unwrap();
    assert!(fremd.is_empty());
    assert!(MessageRepository::gesendete(&db, &c2, 100)
        .await
        .unwrap()
        .is_empty());
}
