//! SQLite-Implementierung des TenantRepository

use chrono::Utc;
use klassenruf_core::types::TenantCode;

use crate::error::DbError;
use crate::models::{MandantRecord, NeuerMandant};
use crate::repository::{DbResult, TenantRepository};
use crate::sqlite::pool::SqliteDb;

impl TenantRepository for SqliteDb {
    async fn erstellen(&self, data: NeuerMandant<'_>) -> DbResult<MandantRecord> {
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        sqlx::query(
            "INSERT INTO tenants (code, name, credential_hash, created_at, last_login)
             VALUES (?, ?, ?, ?, NULL)",
        )
        .bind(data.code.as_str())
        .bind(data.name)
        .bind(data.credential_hash)
        .bind(&now_str)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE") || msg.contains("unique") {
                DbError::Eindeutigkeit(format!("Mandanten-Code '{}' bereits vergeben", data.code))
            } else {
                DbError::Sqlx(e)
            }
        })?;

        Ok(MandantRecord {
            code: data.code.clone(),
            name: data.name.to_string(),
            credential_hash: data.credential_hash.to_string(),
            created_at: now,
            last_login: None,
        })
    }

    async fn laden(&self, code: &TenantCode) -> DbResult<Option<MandantRecord>> {
        let row = sqlx::query(
            "SELECT code, name, credential_hash, created_at, last_login
             FROM tenants WHERE code = ?",
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_mandant(&r)).transpose()
    }

    async fn login_vermerken(&self, code: &TenantCode) -> DbResult<()> {
        let now = Utc::now().to_rfc3339();
        let affected = sqlx::query("UPDATE tenants SET last_login = ? WHERE code = ?")
            .bind(&now)
            .bind(code.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("Mandant {code}")));
        }
        Ok(())
    }
}

fn row_to_mandant(row: &sqlx::sqlite::SqliteRow) -> DbResult<MandantRecord> {
    use sqlx::Row as _;

    let code_str: String = row.try_get("code")?;

    let created_at_str: String = row.try_get("created_at")?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|e| DbError::intern(format!("Ungueltige created_at '{created_at_str}': {e}")))?
        .with_timezone(&Utc);

    let last_login: Option<String> = row.try_get("last_login")?;
    let last_login = last_login
        .as_deref()
        .map(|s| {
            chrono::DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| DbError::intern(format!("Ungueltige last_login '{s}': {e}")))
        })
        .transpose()?;

    Ok(MandantRecord {
        code: TenantCode::unchecked(code_str),
        name: row.try_get("name")?,
        credential_hash: row.try_get("credential_hash")?,
        created_at,
        last_login,
    })
}
