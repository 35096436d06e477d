use super::{bad_request, check_auth, fail, ApiResult, ApiState};
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Json,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserQuery {
    #[serde(default)]
    user_id: Option<String>,
}

impl UserQuery {
    fn user_id(self) -> Result<String, super::ApiError> {
        self.user_id
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| bad_request("User ID is required"))
    }
}

/// `GET /api/user-schema?userId=`
pub(super) async fn user_schema(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Query(query): Query<UserQuery>,
) -> ApiResult {
    if let Some(err) = check_auth(&headers, &state.api_key) {
        return Err(err);
    }
    let user_id = query.user_id()?;
    let schema = state
        .store
        .get_user_schema(&user_id)
        .await
        .map_err(|e| fail("Failed to fetch user schema", e))?;
    Ok(Json(json!({"success": true, "data": {"schema_name": schema}})))
}

/// `GET /api/user-schema/custom-settings?userId=`
pub(super) async fn custom_settings(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Query(query): Query<UserQuery>,
) -> ApiResult {
    if let Some(err) = check_auth(&headers, &state.api_key) {
        return Err(err);
    }
    let user_id = query.user_id()?;
    let (schema, settings) = state
        .store
        .get_custom_settings(&user_id)
        .await
        .map_err(|e| fail("Failed to fetch custom settings", e))?;
    Ok(Json(json!({
        "success": true,
        "data": {"schema_name": schema, "custom_settings": settings}
    })))
}
