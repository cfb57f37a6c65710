//! SQLite-Implementierung des SettingsRepository

use chrono::Utc;
use klassenruf_core::types::TenantCode;

use crate::repository::{DbResult, SettingsRepository};
use crate::sqlite::pool::SqliteDb;

impl SettingsRepository for SqliteDb {
    async fn erlaubnis_laden(&self, code: &TenantCode) -> DbResult<bool> {
        use sqlx::Row as _;

        let row = sqlx::query(
            "SELECT allow_subscriber_messages FROM tenant_settings WHERE tenant_code = ?",
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(r) = row {
            let erlaubt: i64 = r.try_get("allow_subscriber_messages")?;
            return Ok(erlaubt != 0);
        }

        // Erster Zugriff: Standardzeile (deaktiviert) anlegen
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO tenant_settings (tenant_code, allow_subscriber_messages, updated_at)
             VALUES (?, 0, ?)
             ON CONFLICT (tenant_code) DO NOTHING",
        )
        .bind(code.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(false)
    }

    async fn erlaubnis_setzen(&self, code: &TenantCode, erlaubt: bool) -> DbResult<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO tenant_settings (tenant_code, allow_subscriber_messages, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT (tenant_code) DO UPDATE SET
                 allow_subscriber_messages = excluded.allow_subscriber_messages,
                 updated_at = excluded.updated_at",
        )
        .bind(code.as_str())
        .bind(erlaubt as i64)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
