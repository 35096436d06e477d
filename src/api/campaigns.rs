use super::{authorize, bad_request, fail, parse_body, ApiResult, ApiState, JsonBody};
use crate::campaign::{CampaignError, WebhookOutcome};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use herald_core::model::CreateCampaignRequest;
use serde_json::{json, Value};

/// `GET /api/campaigns`
pub(super) async fn list(headers: HeaderMap, State(state): State<ApiState>) -> ApiResult {
    let tenant = authorize(&headers, &state)?;
    let campaigns = state
        .store
        .list_campaigns(&tenant)
        .await
        .map_err(|e| fail("Failed to fetch campaigns", e))?;
    Ok(Json(json!({"success": true, "data": campaigns})))
}

/// `GET /api/campaigns/{id}`
pub(super) async fn get_one(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult {
    let tenant = authorize(&headers, &state)?;
    let campaign = state
        .store
        .get_campaign(&tenant, &id)
        .await
        .map_err(|e| fail("Failed to fetch campaign", e))?;
    Ok(Json(json!({"success": true, "data": campaign})))
}

/// `POST /api/campaigns`: Create a campaign, reconcile its contacts and
/// hand it to the automation webhook.
pub(super) async fn create(
    headers: HeaderMap,
    State(state): State<ApiState>,
    body: JsonBody<CreateCampaignRequest>,
) -> ApiResult {
    let tenant = authorize(&headers, &state)?;
    let request = parse_body(body)?;

    let created = match state.campaigns.create(&tenant, request).await {
        Ok(created) => created,
        Err(CampaignError::Rejected(e)) => return Err(fail("Invalid campaign", e)),
        Err(CampaignError::CampaignInsert(e)) => {
            return Err(fail("Failed to create campaign", e));
        }
        Err(CampaignError::Contacts { campaign, error }) => {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": "Campaign created but failed to insert new contacts",
                    "campaign": campaign,
                    "contactsError": error.to_string(),
                })),
            ));
        }
    };

    let mut body = json!({
        "success": true,
        "campaign": created.campaign,
        "contactStats": created.contact_stats,
    });
    match created.webhook {
        WebhookOutcome::Delivered(result) => {
            body["webhookResult"] = result;
        }
        WebhookOutcome::NotConfigured => {
            body["webhookError"] = json!("Webhook URL not configured but campaign was created");
        }
        WebhookOutcome::Failed { error, outbox_id } => {
            body["webhookError"] = json!(error);
            if let Some(id) = outbox_id {
                body["outboxId"] = json!(id);
            }
        }
    }
    Ok(Json(body))
}

/// `PATCH /api/campaigns/{id}/auto-reply`
pub(super) async fn auto_reply(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Path(id): Path<String>,
    body: JsonBody<Value>,
) -> ApiResult {
    let tenant = authorize(&headers, &state)?;
    let body = parse_body(body)?;
    let Some(enabled) = body.get("auto_reply").and_then(Value::as_bool) else {
        return Err(bad_request("auto_reply must be a boolean value"));
    };

    let campaign = state
        .store
        .set_auto_reply(&tenant, &id, enabled)
        .await
        .map_err(|e| fail("Failed to update auto reply setting", e))?;
    Ok(Json(json!({"success": true, "data": campaign})))
}
