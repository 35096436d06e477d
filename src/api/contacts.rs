use super::{authorize, bad_request, fail, parse_body, ApiResult, ApiState, JsonBody};
use crate::import::{run as run_import, ImportOptions};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
};
use serde::Deserialize;
use serde_json::json;

/// `GET /api/contacts`: Contacts with their latest message and unread count.
pub(super) async fn list(headers: HeaderMap, State(state): State<ApiState>) -> ApiResult {
    let tenant = authorize(&headers, &state)?;
    let contacts = state
        .store
        .contacts_with_history(&tenant)
        .await
        .map_err(|e| fail("Failed to fetch contacts", e))?;
    Ok(Json(json!({"success": true, "data": contacts})))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ImportRequest {
    #[serde(default)]
    text: String,
    /// Overrides the configured default; an empty string disables it.
    #[serde(default)]
    default_country_code: Option<String>,
    #[serde(default = "default_update_names")]
    update_names: bool,
}

fn default_update_names() -> bool {
    true
}

/// `POST /api/contacts/import`
pub(super) async fn import(
    headers: HeaderMap,
    State(state): State<ApiState>,
    body: JsonBody<ImportRequest>,
) -> ApiResult {
    let tenant = authorize(&headers, &state)?;
    let request = parse_body(body)?;
    if request.text.trim().is_empty() {
        return Err(bad_request("No contact data provided"));
    }

    let options = ImportOptions {
        default_country_code: request
            .default_country_code
            .or_else(|| state.default_country_code.clone()),
        update_names: request.update_names,
    };
    let summary = run_import(&state.store, &tenant, &request.text, &options)
        .await
        .map_err(|e| fail("Failed to import contacts", e))?;
    Ok(Json(json!({"success": true, "data": summary})))
}

#[derive(Debug, Deserialize)]
pub(super) struct StatusRequest {
    #[serde(default)]
    lead_status: Option<String>,
}

/// `PUT /api/contacts/{lead_id}/status`
pub(super) async fn update_status(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Path(lead_id): Path<String>,
    body: JsonBody<StatusRequest>,
) -> ApiResult {
    let tenant = authorize(&headers, &state)?;
    let request = parse_body(body)?;
    let Some(status) = request.lead_status.filter(|s| !s.trim().is_empty()) else {
        return Err(bad_request("lead_status is required"));
    };

    let contact = state
        .store
        .update_lead_status(&tenant, &lead_id, status.trim())
        .await
        .map_err(|e| fail("Failed to update lead status", e))?;
    Ok(Json(json!({"success": true, "data": contact})))
}

/// `GET /api/contacts/{lead_id}/verify`: Stored contact plus the custom
/// field keys a template mapping can use.
pub(super) async fn verify(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Path(lead_id): Path<String>,
) -> ApiResult {
    let tenant = authorize(&headers, &state)?;
    let contact = state
        .store
        .get_contact(&tenant, &lead_id)
        .await
        .map_err(|e| fail("Failed to verify contact", e))?;

    let keys = contact.custom_field_keys();
    Ok(Json(json!({
        "success": true,
        "data": {
            "contact": contact,
            "custom_fields_keys": keys,
            "custom_fields_count": keys.len(),
        }
    })))
}
