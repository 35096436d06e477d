use super::{authorize, fail, ApiResult, ApiState};
use axum::{extract::State, http::HeaderMap, response::Json};
use herald_core::template::{default_mappings, extract_placeholders, FIXED_FIELDS};
use serde_json::{json, Value};

/// `GET /api/templates`: Approved catalog templates with their placeholders
/// and a starting parameter mapping for each.
pub(super) async fn list(headers: HeaderMap, State(state): State<ApiState>) -> ApiResult {
    authorize(&headers, &state)?;
    let templates = state
        .dispatcher
        .fetch_templates()
        .await
        .map_err(|e| fail("Failed to fetch templates", e))?;

    let data: Vec<Value> = templates
        .iter()
        .filter(|t| t.is_approved())
        .map(|t| {
            json!({
                "template": t,
                "template_type": t.template_type(),
                "placeholders": extract_placeholders(t),
                "parameter_mappings": default_mappings(t),
            })
        })
        .collect();
    Ok(Json(json!({
        "success": true,
        "data": data,
        "fixed_fields": FIXED_FIELDS,
    })))
}
