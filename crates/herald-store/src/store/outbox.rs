//! Webhook outbox: payloads whose delivery failed, kept for redelivery.

use super::{new_id, now_ts, parse_ts, Store};
use chrono::{Duration, SecondsFormat, Utc};
use std::time::Duration as StdDuration;
use herald_core::{
    error::HeraldError,
    tenant::{SchemaName, TenantContext},
    traits::WebhookTarget,
};
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboxStatus {
    Pending,
    Delivered,
    Failed,
}

impl FromStr for OutboxStatus {
    type Err = HeraldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "delivered" => Ok(Self::Delivered),
            "failed" => Ok(Self::Failed),
            other => Err(HeraldError::Store(format!("unknown outbox status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboxEntry {
    pub id: String,
    pub schema_name: SchemaName,
    pub target: WebhookTarget,
    pub campaign_id: Option<String>,
    pub payload: Value,
    pub status: OutboxStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub created_date: chrono::DateTime<chrono::Utc>,
    pub updated_date: chrono::DateTime<chrono::Utc>,
}

#[derive(sqlx::FromRow)]
struct OutboxRow {
    id: String,
    schema_name: String,
    target: String,
    campaign_id: Option<String>,
    payload: String,
    status: String,
    attempts: i64,
    last_error: Option<String>,
    created_date: String,
    updated_date: String,
}

impl TryFrom<OutboxRow> for OutboxEntry {
    type Error = HeraldError;

    fn try_from(row: OutboxRow) -> Result<Self, Self::Error> {
        Ok(OutboxEntry {
            schema_name: SchemaName::parse(&row.schema_name)?,
            target: row.target.parse()?,
            payload: serde_json::from_str(&row.payload)?,
            status: row.status.parse()?,
            attempts: row.attempts.max(0) as u32,
            created_date: parse_ts(&row.created_date)?,
            updated_date: parse_ts(&row.updated_date)?,
            id: row.id,
            campaign_id: row.campaign_id,
            last_error: row.last_error,
        })
    }
}

const OUTBOX_COLUMNS: &str = "id, schema_name, target, campaign_id, payload, status, attempts, \
     last_error, created_date, updated_date";

impl Store {
    /// Persist a payload whose first delivery attempt failed with `error`.
    pub async fn enqueue_outbox(
        &self,
        tenant: &TenantContext,
        target: WebhookTarget,
        campaign_id: Option<&str>,
        payload: &Value,
        error: &str,
    ) -> Result<OutboxEntry, HeraldError> {
        let id = new_id();
        let now = now_ts();
        sqlx::query(
            "INSERT INTO webhook_outbox \
             (id, schema_name, target, campaign_id, payload, status, attempts, last_error, \
              created_date, updated_date) \
             VALUES (?, ?, ?, ?, ?, 'pending', 1, ?, ?, ?)",
        )
        .bind(&id)
        .bind(tenant.schema_name())
        .bind(target.as_str())
        .bind(campaign_id)
        .bind(serde_json::to_string(payload)?)
        .bind(error)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("enqueue_outbox failed: {e}")))?;

        self.get_outbox_entry(&id).await
    }

    async fn get_outbox_entry(&self, id: &str) -> Result<OutboxEntry, HeraldError> {
        let row: Option<OutboxRow> = sqlx::query_as(&format!(
            "SELECT {OUTBOX_COLUMNS} FROM webhook_outbox WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("get_outbox_entry failed: {e}")))?;

        row.ok_or_else(|| HeraldError::NotFound("Outbox entry not found".into()))?
            .try_into()
    }

    /// Pending entries, oldest first. `schema` limits the scan to one tenant.
    pub async fn pending_outbox(
        &self,
        schema: Option<&SchemaName>,
        limit: i64,
    ) -> Result<Vec<OutboxEntry>, HeraldError> {
        let rows: Vec<OutboxRow> = match schema {
            Some(schema) => sqlx::query_as(&format!(
                "SELECT {OUTBOX_COLUMNS} FROM webhook_outbox \
                 WHERE status = 'pending' AND schema_name = ? \
                 ORDER BY created_date ASC, rowid ASC LIMIT ?"
            ))
            .bind(schema.as_str())
            .bind(limit)
            .fetch_all(&self.pool)
            .await,
            None => sqlx::query_as(&format!(
                "SELECT {OUTBOX_COLUMNS} FROM webhook_outbox \
                 WHERE status = 'pending' \
                 ORDER BY created_date ASC, rowid ASC LIMIT ?"
            ))
            .bind(limit)
            .fetch_all(&self.pool)
            .await,
        }
        .map_err(|e| HeraldError::Store(format!("pending_outbox failed: {e}")))?;

        rows.into_iter().map(OutboxEntry::try_from).collect()
    }

    /// Every outbox entry for the tenant, newest first.
    pub async fn list_outbox(&self, tenant: &TenantContext) -> Result<Vec<OutboxEntry>, HeraldError> {
        let rows: Vec<OutboxRow> = sqlx::query_as(&format!(
            "SELECT {OUTBOX_COLUMNS} FROM webhook_outbox WHERE schema_name = ? \
             ORDER BY created_date DESC, rowid DESC"
        ))
        .bind(tenant.schema_name())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("list_outbox failed: {e}")))?;

        rows.into_iter().map(OutboxEntry::try_from).collect()
    }

    /// Take a delivery lease on a pending entry. Returns `false` when the
    /// entry is no longer pending or another drainer holds an unexpired lease.
    pub async fn claim_outbox(&self, id: &str, lease: StdDuration) -> Result<bool, HeraldError> {
        let lease = Duration::from_std(lease)
            .map_err(|e| HeraldError::Store(format!("invalid outbox lease: {e}")))?;
        let now = Utc::now();
        let until = (now + lease).to_rfc3339_opts(SecondsFormat::Micros, true);
        let result = sqlx::query(
            "UPDATE webhook_outbox SET claimed_until = ? \
             WHERE id = ? AND status = 'pending' \
               AND (claimed_until IS NULL OR claimed_until < ?)",
        )
        .bind(until)
        .bind(id)
        .bind(now.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("claim_outbox failed: {e}")))?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn mark_outbox_delivered(&self, id: &str) -> Result<(), HeraldError> {
        sqlx::query(
            "UPDATE webhook_outbox SET status = 'delivered', attempts = attempts + 1, \
             last_error = NULL, claimed_until = NULL, updated_date = ? \
             WHERE id = ? AND status = 'pending'",
        )
        .bind(now_ts())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("mark_outbox_delivered failed: {e}")))?;
        Ok(())
    }

    /// Record a failed redelivery and release the lease. Returns `true` if
    /// the entry stays pending, `false` once `max_attempts` is reached and it
    /// is marked failed.
    pub async fn fail_outbox(
        &self,
        id: &str,
        error: &str,
        max_attempts: u32,
    ) -> Result<bool, HeraldError> {
        let row: Option<(String,)> = sqlx::query_as(
            "UPDATE webhook_outbox SET attempts = attempts + 1, \
                 status = CASE WHEN attempts + 1 >= ? THEN 'failed' ELSE 'pending' END, \
                 last_error = ?, claimed_until = NULL, updated_date = ? \
             WHERE id = ? AND status = 'pending' \
             RETURNING status",
        )
        .bind(i64::from(max_attempts))
        .bind(error)
        .bind(now_ts())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("fail_outbox failed: {e}")))?;

        let (status,) =
            row.ok_or_else(|| HeraldError::NotFound("Outbox entry not found".into()))?;
        Ok(status == "pending")
    }
}
