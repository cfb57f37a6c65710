//! SQLite-Implementierung des SubscriberRepository

use chrono::Utc;
use klassenruf_core::types::TenantCode;

use crate::error::DbError;
use crate::models::AbonnentRecord;
use crate::repository::{DbResult, SubscriberRepository};
use crate::sqlite::pool::SqliteDb;

impl SubscriberRepository for SqliteDb {
    async fn vermerken(&self, code: &TenantCode, name: &str) -> DbResult<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO subscriber_records (tenant_code, name, last_seen)
             VALUES (?, ?, ?)
             ON CONFLICT (tenant_code, name) DO UPDATE SET
                 last_seen = excluded.last_seen",
        )
        .bind(code.as_str())
        .bind(name)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn alle(&self, code: &TenantCode) -> DbResult<Vec<AbonnentRecord>> {
        let rows = sqlx::query(
            "SELECT tenant_code, name, last_seen
             FROM subscriber_records WHERE tenant_code = ? ORDER BY name",
        )
        .bind(code.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_abonnent).collect()
    }
}

fn row_to_abonnent(row: &sqlx::sqlite::SqliteRow) -> DbResult<AbonnentRecord> {
    use sqlx::Row as _;

    let code_str: String = row.try_get("tenant_code")?;

    let last_seen_str: String = row.try_get("last_seen")?;
    let last_seen = chrono::DateTime::parse_from_rfc3339(&last_seen_str)
        .map_err(|e| DbError::intern(format!("Ungueltige last_seen '{last_seen_str}': {e}")))?
        .with_timezone(&Utc);

    Ok(AbonnentRecord {
        tenant_code: TenantCode::unchecked(code_str),
        name: row.try_get("name")?,
        last_seen,
    })
}
