//! Conversation history per lead.

use super::{new_id, now_ts, parse_ts, Store};
use herald_core::{
    error::HeraldError,
    model::{ContactWithHistory, MessageDirection, MessageHistory, NewMessage},
    tenant::TenantContext,
};
use sqlx::{QueryBuilder, Sqlite};

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: String,
    message_id: Option<String>,
    from_number: String,
    to_number: String,
    message_text: String,
    message_type: String,
    status: String,
    lead_id: String,
    is_read: bool,
    created_date: String,
    campaign_id: Option<String>,
}

impl TryFrom<MessageRow> for MessageHistory {
    type Error = HeraldError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(MessageHistory {
            message_type: row.message_type.parse()?,
            status: row.status.parse()?,
            created_date: parse_ts(&row.created_date)?,
            id: row.id,
            message_id: row.message_id,
            from_number: row.from_number,
            to_number: row.to_number,
            message_text: row.message_text,
            lead_id: row.lead_id,
            is_read: row.is_read,
            campaign_id: row.campaign_id,
        })
    }
}

/// A contact joined with its latest message (all `m_*` columns null when
/// there is none).
#[derive(sqlx::FromRow)]
struct ConversationRow {
    name: String,
    lead_id: String,
    phone_number: String,
    lead_status: String,
    m_id: Option<String>,
    m_message_id: Option<String>,
    m_from_number: Option<String>,
    m_to_number: Option<String>,
    m_message_text: Option<String>,
    m_message_type: Option<String>,
    m_status: Option<String>,
    m_is_read: Option<bool>,
    m_created_date: Option<String>,
    m_campaign_id: Option<String>,
    unread_count: i64,
}

impl TryFrom<ConversationRow> for ContactWithHistory {
    type Error = HeraldError;

    fn try_from(row: ConversationRow) -> Result<Self, Self::Error> {
        let last_message = match row.m_id {
            Some(id) => Some(MessageHistory::try_from(MessageRow {
                id,
                message_id: row.m_message_id,
                from_number: row.m_from_number.unwrap_or_default(),
                to_number: row.m_to_number.unwrap_or_default(),
                message_text: row.m_message_text.unwrap_or_default(),
                message_type: row.m_message_type.unwrap_or_default(),
                status: row.m_status.unwrap_or_default(),
                lead_id: row.lead_id.clone(),
                is_read: row.m_is_read.unwrap_or(false),
                created_date: row.m_created_date.unwrap_or_default(),
                campaign_id: row.m_campaign_id,
            })?),
            None => None,
        };
        Ok(ContactWithHistory {
            name: row.name,
            lead_id: row.lead_id,
            phone_number: row.phone_number,
            lead_status: row.lead_status,
            last_message,
            unread_count: row.unread_count,
        })
    }
}

const MESSAGE_COLUMNS: &str = "id, message_id, from_number, to_number, message_text, \
     message_type, status, lead_id, is_read, created_date, campaign_id";

impl Store {
    /// A lead's messages, oldest first.
    pub async fn list_messages(
        &self,
        tenant: &TenantContext,
        lead_id: &str,
    ) -> Result<Vec<MessageHistory>, HeraldError> {
        let rows: Vec<MessageRow> = sqlx::query_as(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM message_history \
             WHERE schema_name = ? AND lead_id = ? \
             ORDER BY created_date ASC, rowid ASC"
        ))
        .bind(tenant.schema_name())
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("list_messages failed: {e}")))?;

        rows.into_iter().map(MessageHistory::try_from).collect()
    }

    /// Append a history entry. Outgoing messages are stored as already read.
    pub async fn record_message(
        &self,
        tenant: &TenantContext,
        lead_id: &str,
        message: &NewMessage,
    ) -> Result<MessageHistory, HeraldError> {
        let id = new_id();
        sqlx::query(
            "INSERT INTO message_history \
             (id, schema_name, message_id, from_number, to_number, message_text, message_type, \
              status, lead_id, is_read, campaign_id, created_date) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(tenant.schema_name())
        .bind(&message.message_id)
        .bind(&message.from_number)
        .bind(&message.to_number)
        .bind(&message.message_text)
        .bind(message.message_type.as_str())
        .bind(message.status.as_str())
        .bind(lead_id)
        .bind(message.message_type == MessageDirection::Outgoing)
        .bind(&message.campaign_id)
        .bind(now_ts())
        .execute(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("record_message failed: {e}")))?;

        let row: MessageRow = sqlx::query_as(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM message_history WHERE id = ?"
        ))
        .bind(&id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("record_message fetch failed: {e}")))?;
        row.try_into()
    }

    /// Mark a lead's messages read: all of them, or only `message_ids`.
    /// Returns how many rows changed.
    pub async fn mark_messages_read(
        &self,
        tenant: &TenantContext,
        lead_id: &str,
        message_ids: Option<&[String]>,
    ) -> Result<u64, HeraldError> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE message_history SET is_read = 1 WHERE schema_name = ");
        qb.push_bind(tenant.schema_name());
        qb.push(" AND lead_id = ");
        qb.push_bind(lead_id);
        qb.push(" AND is_read = 0");

        if let Some(ids) = message_ids {
            if ids.is_empty() {
                return Ok(0);
            }
            qb.push(" AND id IN (");
            let mut sep = qb.separated(", ");
            for id in ids {
                sep.push_bind(id);
            }
            sep.push_unseparated(")");
        }

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| HeraldError::Store(format!("mark_messages_read failed: {e}")))?;
        Ok(result.rows_affected())
    }

    /// Conversation list: every contact with its latest message and unread
    /// count, most recent activity first. Contacts without messages come last,
    /// newest contact first.
    pub async fn contacts_with_history(
        &self,
        tenant: &TenantContext,
    ) -> Result<Vec<ContactWithHistory>, HeraldError> {
        let rows: Vec<ConversationRow> = sqlx::query_as(
            "WITH ranked AS ( \
                 SELECT m.*, m.rowid AS msg_rowid, ROW_NUMBER() OVER ( \
                     PARTITION BY m.lead_id ORDER BY m.created_date DESC, m.rowid DESC \
                 ) AS rn \
                 FROM message_history m WHERE m.schema_name = ? \
             ), unread AS ( \
                 SELECT lead_id, COUNT(*) AS unread_count FROM message_history \
                 WHERE schema_name = ? AND is_read = 0 GROUP BY lead_id \
             ) \
             SELECT c.name, c.lead_id, c.phone_number, c.lead_status, \
                 r.id AS m_id, r.message_id AS m_message_id, r.from_number AS m_from_number, \
                 r.to_number AS m_to_number, r.message_text AS m_message_text, \
                 r.message_type AS m_message_type, r.status AS m_status, \
                 r.is_read AS m_is_read, r.created_date AS m_created_date, \
                 r.campaign_id AS m_campaign_id, \
                 COALESCE(u.unread_count, 0) AS unread_count \
             FROM contacts c \
             LEFT JOIN ranked r ON r.lead_id = c.lead_id AND r.rn = 1 \
             LEFT JOIN unread u ON u.lead_id = c.lead_id \
             WHERE c.schema_name = ? \
             ORDER BY r.created_date IS NULL, r.created_date DESC, r.msg_rowid DESC, \
                 c.created_date DESC, c.rowid DESC",
        )
        .bind(tenant.schema_name())
        .bind(tenant.schema_name())
        .bind(tenant.schema_name())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("contacts_with_history failed: {e}")))?;

        rows.into_iter().map(ContactWithHistory::try_from).collect()
    }
}
