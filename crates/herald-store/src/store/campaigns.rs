//! Campaign rows.

use super::{new_id, now_ts, parse_ts, Store};
use herald_core::{
    error::HeraldError,
    model::{Campaign, CampaignStatus, NewCampaign},
    tenant::TenantContext,
};

#[derive(sqlx::FromRow)]
struct CampaignRow {
    id: String,
    name: String,
    description: Option<String>,
    template_name: String,
    template_language: String,
    template_id: Option<String>,
    status: String,
    scheduled_at: Option<String>,
    prompt_id: Option<String>,
    auto_reply: bool,
    created_date: String,
    updated_date: String,
}

impl TryFrom<CampaignRow> for Campaign {
    type Error = HeraldError;

    fn try_from(row: CampaignRow) -> Result<Self, Self::Error> {
        Ok(Campaign {
            status: row.status.parse::<CampaignStatus>()?,
            created_date: parse_ts(&row.created_date)?,
            updated_date: parse_ts(&row.updated_date)?,
            id: row.id,
            name: row.name,
            description: row.description,
            template_name: row.template_name,
            template_language: row.template_language,
            template_id: row.template_id,
            scheduled_at: row.scheduled_at,
            prompt_id: row.prompt_id,
            auto_reply: row.auto_reply,
        })
    }
}

const CAMPAIGN_COLUMNS: &str = "id, name, description, template_name, template_language, \
     template_id, status, scheduled_at, prompt_id, auto_reply, created_date, updated_date";

impl Store {
    /// Insert a campaign with status `draft`.
    pub async fn create_campaign(
        &self,
        tenant: &TenantContext,
        campaign: &NewCampaign,
    ) -> Result<Campaign, HeraldError> {
        let id = new_id();
        let now = now_ts();

        sqlx::query(
            "INSERT INTO campaigns \
             (id, schema_name, name, description, template_name, template_language, \
              template_id, status, scheduled_at, prompt_id, auto_reply, created_date, updated_date) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(tenant.schema_name())
        .bind(&campaign.name)
        .bind(&campaign.description)
        .bind(&campaign.template_name)
        .bind(&campaign.template_language)
        .bind(&campaign.template_id)
        .bind(CampaignStatus::Draft.as_str())
        .bind(&campaign.scheduled_at)
        .bind(&campaign.prompt_id)
        .bind(campaign.auto_reply)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("create_campaign failed: {e}")))?;

        self.get_campaign(tenant, &id).await
    }

    /// Fetch one campaign; `NotFound` if it does not exist for this tenant.
    pub async fn get_campaign(
        &self,
        tenant: &TenantContext,
        id: &str,
    ) -> Result<Campaign, HeraldError> {
        let row: Option<CampaignRow> = sqlx::query_as(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE schema_name = ? AND id = ?"
        ))
        .bind(tenant.schema_name())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("get_campaign failed: {e}")))?;

        row.ok_or_else(|| HeraldError::NotFound("Campaign not found".into()))?
            .try_into()
    }

    /// All campaigns for the tenant, newest first.
    pub async fn list_campaigns(&self, tenant: &TenantContext) -> Result<Vec<Campaign>, HeraldError> {
        let rows: Vec<CampaignRow> = sqlx::query_as(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE schema_name = ? \
             ORDER BY created_date DESC, rowid DESC"
        ))
        .bind(tenant.schema_name())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("list_campaigns failed: {e}")))?;

        rows.into_iter().map(Campaign::try_from).collect()
    }

    /// Toggle AI auto-reply for a campaign and bump `updated_date`.
    pub async fn set_auto_reply(
        &self,
        tenant: &TenantContext,
        id: &str,
        auto_reply: bool,
    ) -> Result<Campaign, HeraldError> {
        let result = sqlx::query(
            "UPDATE campaigns SET auto_reply = ?, updated_date = ? \
             WHERE schema_name = ? AND id = ?",
        )
        .bind(auto_reply)
        .bind(now_ts())
        .bind(tenant.schema_name())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("set_auto_reply failed: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(HeraldError::NotFound("Campaign not found".into()));
        }
        self.get_campaign(tenant, id).await
    }
}
