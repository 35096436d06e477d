use super::{authorize, fail, ApiResult, ApiState};
use crate::outbox::drain_once;
use axum::{extract::State, http::HeaderMap, response::Json};
use serde_json::json;

/// `GET /api/outbox`: The tenant's parked webhook deliveries.
pub(super) async fn list(headers: HeaderMap, State(state): State<ApiState>) -> ApiResult {
    let tenant = authorize(&headers, &state)?;
    let entries = state
        .store
        .list_outbox(&tenant)
        .await
        .map_err(|e| fail("Failed to fetch outbox", e))?;
    Ok(Json(json!({"success": true, "data": entries})))
}

/// `POST /api/outbox/retry`: Drain the tenant's pending entries now.
pub(super) async fn retry(headers: HeaderMap, State(state): State<ApiState>) -> ApiResult {
    let tenant = authorize(&headers, &state)?;
    let summary = drain_once(
        &state.store,
        state.dispatcher.as_ref(),
        Some(&tenant.schema),
        state.max_attempts,
    )
    .await
    .map_err(|e| fail("Failed to retry outbox", e))?;
    Ok(Json(json!({"success": true, "data": summary})))
}
