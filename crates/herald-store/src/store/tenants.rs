//! Directory of authenticated users and the tenant schema each belongs to.

use super::{now_ts, Store};
use herald_core::{error::HeraldError, tenant::SchemaName};
use serde_json::Value;

impl Store {
    /// Register (or move) a user to a tenant schema.
    pub async fn register_user_schema(
        &self,
        auth_user_id: &str,
        schema: &SchemaName,
        custom_settings: Option<&Value>,
    ) -> Result<(), HeraldError> {
        let settings = custom_settings.map(serde_json::to_string).transpose()?;
        sqlx::query(
            "INSERT INTO user_schemas (auth_user_id, schema_name, custom_settings, created_date) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT(auth_user_id) DO UPDATE SET \
                 schema_name = excluded.schema_name, \
                 custom_settings = COALESCE(excluded.custom_settings, user_schemas.custom_settings)",
        )
        .bind(auth_user_id)
        .bind(schema.as_str())
        .bind(settings)
        .bind(now_ts())
        .execute(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("register_user_schema failed: {e}")))?;
        Ok(())
    }

    /// The schema a user belongs to, or `NotFound`.
    pub async fn get_user_schema(&self, auth_user_id: &str) -> Result<SchemaName, HeraldError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT schema_name FROM user_schemas WHERE auth_user_id = ?")
                .bind(auth_user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| HeraldError::Store(format!("get_user_schema failed: {e}")))?;

        let (schema,) = row.ok_or_else(|| HeraldError::NotFound("User schema not found".into()))?;
        SchemaName::parse(&schema)
    }

    /// Schema plus the user's custom settings (`{}` when none are stored).
    pub async fn get_custom_settings(
        &self,
        auth_user_id: &str,
    ) -> Result<(SchemaName, Value), HeraldError> {
        let row: Option<(String, Option<String>)> = sqlx::query_as(
            "SELECT schema_name, custom_settings FROM user_schemas WHERE auth_user_id = ?",
        )
        .bind(auth_user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("get_custom_settings failed: {e}")))?;

        let (schema, settings) =
            row.ok_or_else(|| HeraldError::NotFound("User schema not found".into()))?;
        let settings = match settings.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => serde_json::from_str(raw)?,
            _ => Value::Object(Default::default()),
        };
        Ok((SchemaName::parse(&schema)?, settings))
    }
}
