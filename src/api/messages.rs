use super::{authorize, bad_request, fail, parse_body, ApiResult, ApiState, JsonBody};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
};
use herald_core::{model::NewMessage, traits::WebhookTarget};
use herald_webhook::SendMessageRequest;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

/// `GET /api/messages/{lead_id}`: Conversation, oldest first.
pub(super) async fn list(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Path(lead_id): Path<String>,
) -> ApiResult {
    let tenant = authorize(&headers, &state)?;
    let messages = state
        .store
        .list_messages(&tenant, &lead_id)
        .await
        .map_err(|e| fail("Failed to fetch messages", e))?;
    Ok(Json(json!({"success": true, "data": messages})))
}

/// `POST /api/messages/{lead_id}`: Callback used by the automation backend
/// to report sent and received messages.
pub(super) async fn record(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Path(lead_id): Path<String>,
    body: JsonBody<NewMessage>,
) -> ApiResult {
    let tenant = authorize(&headers, &state)?;
    let message = parse_body(body)?;
    let entry = state
        .store
        .record_message(&tenant, &lead_id, &message)
        .await
        .map_err(|e| fail("Failed to record message", e))?;
    Ok(Json(json!({"success": true, "data": entry})))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarkReadRequest {
    #[serde(default)]
    message_ids: Option<Vec<String>>,
}

/// `PUT /api/messages/{lead_id}/read`: An empty body marks everything read.
pub(super) async fn mark_read(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Path(lead_id): Path<String>,
    body: Bytes,
) -> ApiResult {
    let tenant = authorize(&headers, &state)?;
    let request: MarkReadRequest = if body.iter().all(u8::is_ascii_whitespace) {
        MarkReadRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|_| bad_request("Invalid JSON body"))?
    };

    let updated = state
        .store
        .mark_messages_read(&tenant, &lead_id, request.message_ids.as_deref())
        .await
        .map_err(|e| fail("Failed to mark messages as read", e))?;
    Ok(Json(json!({"success": true, "data": {"updated": updated}})))
}

/// `POST /api/messages/send`: Forward one free-text message to the
/// single-message webhook. Failures are reported, not queued.
pub(super) async fn send(
    headers: HeaderMap,
    State(state): State<ApiState>,
    body: JsonBody<SendMessageRequest>,
) -> ApiResult {
    authorize(&headers, &state)?;
    let request = parse_body(body)?;
    let dispatch = request
        .into_dispatch()
        .map_err(|e| fail("Invalid message", e))?;
    let payload = serde_json::to_value(&dispatch).map_err(|e| fail("Failed to send message", e.into()))?;

    let result = state
        .dispatcher
        .deliver(WebhookTarget::SingleMessage, &payload)
        .await
        .map_err(|e| fail("Failed to send message", e))?;
    info!("messages: sent single message to {}", dispatch.lead_id);
    Ok(Json(json!({"success": true, "data": result})))
}
