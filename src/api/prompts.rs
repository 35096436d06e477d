use super::{authorize, fail, parse_body, ApiResult, ApiState, JsonBody};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
};
use herald_core::model::PromptInput;
use serde_json::json;

/// `GET /api/prompts`
pub(super) async fn list(headers: HeaderMap, State(state): State<ApiState>) -> ApiResult {
    let tenant = authorize(&headers, &state)?;
    let prompts = state
        .store
        .list_prompts(&tenant)
        .await
        .map_err(|e| fail("Failed to fetch prompts", e))?;
    Ok(Json(json!({"success": true, "data": prompts})))
}

/// `POST /api/prompts`
pub(super) async fn create(
    headers: HeaderMap,
    State(state): State<ApiState>,
    body: JsonBody<PromptInput>,
) -> ApiResult {
    let tenant = authorize(&headers, &state)?;
    let input = parse_body(body)?;
    let valid = input.validate().map_err(|e| fail("Invalid prompt", e))?;
    let prompt = state
        .store
        .create_prompt(&tenant, &valid)
        .await
        .map_err(|e| fail("Failed to create prompt", e))?;
    Ok(Json(json!({"success": true, "data": prompt})))
}

/// `GET /api/prompts/{id}`
pub(super) async fn get_one(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult {
    let tenant = authorize(&headers, &state)?;
    let prompt = state
        .store
        .get_prompt(&tenant, &id)
        .await
        .map_err(|e| fail("Failed to fetch prompt", e))?;
    Ok(Json(json!({"success": true, "data": prompt})))
}

/// `PUT /api/prompts/{id}`
pub(super) async fn update(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Path(id): Path<String>,
    body: JsonBody<PromptInput>,
) -> ApiResult {
    let tenant = authorize(&headers, &state)?;
    let input = parse_body(body)?;
    let valid = input.validate().map_err(|e| fail("Invalid prompt", e))?;
    let prompt = state
        .store
        .update_prompt(&tenant, &id, &valid)
        .await
        .map_err(|e| fail("Failed to update prompt", e))?;
    Ok(Json(json!({"success": true, "data": prompt})))
}

/// `DELETE /api/prompts/{id}`
pub(super) async fn delete(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult {
    let tenant = authorize(&headers, &state)?;
    state
        .store
        .delete_prompt(&tenant, &id)
        .await
        .map_err(|e| fail("Failed to delete prompt", e))?;
    Ok(Json(json!({"success": true, "message": "Prompt deleted successfully"})))
}
