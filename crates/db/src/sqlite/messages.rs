//! SQLite-Implementierung des MessageRepository
//!
//! Der Nachrichten-Log ist mandantenweise partitioniert. Gezielte
//! Nachrichten tragen ihre Empfaenger als exakte Namen in
//! `message_recipients`; verborgene Nachrichten stehen pro Abonnent
//! in `hidden_messages`.

use chrono::Utc;
use klassenruf_core::types::{Rolle, TenantCode};

use crate::error::DbError;
use crate::models::{NachrichtRecord, NeueNachricht};
use crate::repository::{DbResult, MessageRepository};
use crate::sqlite::pool::SqliteDb;

const NACHRICHT_SPALTEN: &str =
    "id, tenant_code, sender_role, sender_name, an_alle, body, created_at";

impl MessageRepository for SqliteDb {
    async fn einfuegen(&self, data: NeueNachricht<'_>) -> DbResult<NachrichtRecord> {
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        // Nachricht und Empfaengerliste atomar ablegen
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            "INSERT INTO messages (tenant_code, sender_role, sender_name, an_alle, body, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(data.tenant_code.as_str())
        .bind(data.sender_role.als_str())
        .bind(data.sender_name)
        .bind(data.an_alle as i64)
        .bind(data.body)
        .bind(&now_str)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        if !data.an_alle {
            for name in data.empfaenger {
                sqlx::query(
                    "INSERT INTO message_recipients (message_id, name)
                     VALUES (?, ?)
                     ON CONFLICT (message_id, name) DO NOTHING",
                )
                .bind(id)
                .bind(name)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        Ok(NachrichtRecord {
            id,
            tenant_code: data.tenant_code.clone(),
            sender_role: data.sender_role,
            sender_name: data.sender_name.to_string(),
            an_alle: data.an_alle,
            body: data.body.to_string(),
            created_at: now,
        })
    }

    async fn laden(&self, message_id: i64) -> DbResult<Option<NachrichtRecord>> {
        let sql = format!("SELECT {NACHRICHT_SPALTEN} FROM messages WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_nachricht(&r)).transpose()
    }

    async fn fuer_abonnent(
        &self,
        code: &TenantCode,
        name: &str,
        limit: i64,
    ) -> DbResult<Vec<NachrichtRecord>> {
        let sql = format!(
            "SELECT {NACHRICHT_SPALTEN} FROM messages m
             WHERE m.tenant_code = ?
               AND m.sender_role = 'moderator'
               AND (m.an_alle = 1 OR EXISTS (
                   SELECT 1 FROM message_recipients r
                   WHERE r.message_id = m.id AND r.name = ?))
               AND NOT EXISTS (
                   SELECT 1 FROM hidden_messages h
                   WHERE h.message_id = m.id AND h.subscriber_name = ?)
             ORDER BY m.created_at DESC, m.id DESC
             LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(code.as_str())
            .bind(name)
            .bind(name)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_nachricht).collect()
    }

    async fn verbergen(&self, message_id: i64, name: &str) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO hidden_messages (message_id, subscriber_name)
             VALUES (?, ?)
             ON CONFLICT (message_id, subscriber_name) DO NOTHING",
        )
        .bind(message_id)
        .bind(name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn loeschen(&self, message_id: i64) -> DbResult<bool> {
        // Empfaenger- und Verborgen-Zeilen fallen per ON DELETE CASCADE weg
        let affected = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(message_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn kuerzen(&self, code: &TenantCode, behalten: i64) -> DbResult<u64> {
        let affected = sqlx::query(
            "DELETE FROM messages
             WHERE tenant_code = ? AND sender_role = 'abonnent'
               AND id NOT IN (
                   SELECT id FROM messages
                   WHERE tenant_code = ? AND sender_role = 'abonnent'
                   ORDER BY created_at DESC, id DESC
                   LIMIT ?)",
        )
        .bind(code.as_str())
        .bind(code.as_str())
        .bind(behalten)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected)
    }

    async fn posteingang(&self, code: &TenantCode, limit: i64) -> DbResult<Vec<NachrichtRecord>> {
        let sql = format!(
            "SELECT {NACHRICHT_SPALTEN} FROM messages
             WHERE tenant_code = ? AND sender_role = 'abonnent'
             ORDER BY created_at DESC, id DESC
             LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(code.as_str())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_nachricht).collect()
    }

    async fn gesendete(&self, code: &TenantCode, limit: i64) -> DbResult<Vec<NachrichtRecord>> {
        let sql = format!(
            "SELECT {NACHRICHT_SPALTEN} FROM messages
             WHERE tenant_code = ? AND sender_role = 'moderator'
             ORDER BY created_at DESC, id DESC
             LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(code.as_str())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_nachricht).collect()
    }

    async fn empfaenger(&self, message_id: i64) -> DbResult<Vec<String>> {
        use sqlx::Row as _;

        let rows = sqlx::query(
            "SELECT name FROM message_recipients WHERE message_id = ? ORDER BY name",
        )
        .bind(message_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| r.try_get::<String, _>("name").map_err(DbError::from))
            .collect()
    }
}

fn row_to_nachricht(row: &sqlx::sqlite::SqliteRow) -> DbResult<NachrichtRecord> {
    use sqlx::Row as _;

    let code_str: String = row.try_get("tenant_code")?;

    let role_str: String = row.try_get("sender_role")?;
    let sender_role: Rolle = role_str
        .parse()
        .map_err(|e: String| DbError::intern(e))?;

    let created_at_str: String = row.try_get("created_at")?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|e| DbError::intern(format!("Ungueltige created_at '{created_at_str}': {e}")))?
        .with_timezone(&Utc);

    let an_alle: i64 = row.try_get("an_alle")?;

    Ok(NachrichtRecord {
        id: row.try_get("id")?,
        tenant_code: TenantCode::unchecked(code_str),
        sender_role,
        sender_name: row.try_get("sender_name")?,
        an_alle: an_alle != 0,
        body: row.try_get("body")?,
        created_at,
    })
}
