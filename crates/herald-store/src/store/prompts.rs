//! AI auto-reply prompt CRUD.

use super::{new_id, now_ts, parse_ts, Store};
use herald_core::{
    error::HeraldError,
    model::{Prompt, ValidPrompt, PROMPT_LIST_LIMIT},
    tenant::TenantContext,
};

#[derive(sqlx::FromRow)]
struct PromptRow {
    id: String,
    name: String,
    gpt_model: String,
    prompt_message: String,
    created_date: String,
    updated_date: String,
}

impl TryFrom<PromptRow> for Prompt {
    type Error = HeraldError;

    fn try_from(row: PromptRow) -> Result<Self, Self::Error> {
        Ok(Prompt {
            created_date: parse_ts(&row.created_date)?,
            updated_date: parse_ts(&row.updated_date)?,
            id: row.id,
            name: row.name,
            gpt_model: row.gpt_model,
            prompt_message: row.prompt_message,
        })
    }
}

const PROMPT_COLUMNS: &str =
    "id, name, gpt_model, prompt_message, created_date, updated_date";

impl Store {
    pub async fn create_prompt(
        &self,
        tenant: &TenantContext,
        prompt: &ValidPrompt,
    ) -> Result<Prompt, HeraldError> {
        let id = new_id();
        let now = now_ts();
        sqlx::query(
            "INSERT INTO prompts \
             (id, schema_name, name, gpt_model, prompt_message, created_date, updated_date) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(tenant.schema_name())
        .bind(&prompt.name)
        .bind(&prompt.gpt_model)
        .bind(&prompt.prompt_message)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("create_prompt failed: {e}")))?;

        self.get_prompt(tenant, &id).await
    }

    pub async fn get_prompt(&self, tenant: &TenantContext, id: &str) -> Result<Prompt, HeraldError> {
        let row: Option<PromptRow> = sqlx::query_as(&format!(
            "SELECT {PROMPT_COLUMNS} FROM prompts WHERE schema_name = ? AND id = ?"
        ))
        .bind(tenant.schema_name())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("get_prompt failed: {e}")))?;

        row.ok_or_else(|| HeraldError::NotFound("Prompt not found".into()))?
            .try_into()
    }

    /// Newest prompts first, capped at [`PROMPT_LIST_LIMIT`].
    pub async fn list_prompts(&self, tenant: &TenantContext) -> Result<Vec<Prompt>, HeraldError> {
        let rows: Vec<PromptRow> = sqlx::query_as(&format!(
            "SELECT {PROMPT_COLUMNS} FROM prompts WHERE schema_name = ? \
             ORDER BY created_date DESC, rowid DESC LIMIT ?"
        ))
        .bind(tenant.schema_name())
        .bind(PROMPT_LIST_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("list_prompts failed: {e}")))?;

        rows.into_iter().map(Prompt::try_from).collect()
    }

    pub async fn update_prompt(
        &self,
        tenant: &TenantContext,
        id: &str,
        prompt: &ValidPrompt,
    ) -> Result<Prompt, HeraldError> {
        let result = sqlx::query(
            "UPDATE prompts SET name = ?, gpt_model = ?, prompt_message = ?, updated_date = ? \
             WHERE schema_name = ? AND id = ?",
        )
        .bind(&prompt.name)
        .bind(&prompt.gpt_model)
        .bind(&prompt.prompt_message)
        .bind(now_ts())
        .bind(tenant.schema_name())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("update_prompt failed: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(HeraldError::NotFound("Prompt not found".into()));
        }
        self.get_prompt(tenant, id).await
    }

    pub async fn delete_prompt(&self, tenant: &TenantContext, id: &str) -> Result<(), HeraldError> {
        let result = sqlx::query("DELETE FROM prompts WHERE schema_name = ? AND id = ?")
            .bind(tenant.schema_name())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| HeraldError::Store(format!("delete_prompt failed: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(HeraldError::NotFound("Prompt not found".into()));
        }
        Ok(())
    }
}
