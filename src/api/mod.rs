//! HTTP JSON API.
//!
//! Every tenant-scoped route resolves a [`TenantContext`] from the
//! `user_schema` cookie (or `x-user-schema` header) and the optional
//! `x-auth-user-id` header. When an API key is configured, all routes except
//! the health check also require `Authorization: Bearer <key>`.

mod campaigns;
mod contacts;
mod messages;
mod outbox;
mod prompts;
mod templates;
mod tenants;


use crate::campaign::CampaignService;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, patch, post, put},
    Router,
};
use herald_core::{
    config::{ApiConfig, Config},
    error::HeraldError,
    tenant::{SchemaName, TenantContext},
    traits::Dispatcher,
};
use herald_store::Store;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

pub(crate) type ApiError = (StatusCode, Json<Value>);
pub(crate) type ApiResult = Result<Json<Value>, ApiError>;

const SCHEMA_COOKIE: &str = "user_schema";
const SCHEMA_HEADER: &str = "x-user-schema";
const USER_HEADER: &str = "x-auth-user-id";

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    store: Store,
    dispatcher: Arc<dyn Dispatcher>,
    campaigns: CampaignService,
    api_key: Option<String>,
    default_country_code: Option<String>,
    max_attempts: u32,
    uptime: Instant,
}

impl ApiState {
    pub fn new(store: Store, dispatcher: Arc<dyn Dispatcher>, config: &Config) -> Self {
        Self {
            campaigns: CampaignService::new(store.clone(), Arc::clone(&dispatcher)),
            store,
            dispatcher,
            api_key: Some(config.api.api_key.clone()).filter(|k| !k.is_empty()),
            default_country_code: Some(config.import.default_country_code.clone())
                .filter(|c| !c.trim().is_empty()),
            max_attempts: config.outbox.max_attempts,
            uptime: Instant::now(),
        }
    }
}

/// Constant-time string comparison to prevent timing attacks on API token validation.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

fn unauthorized(message: &str) -> ApiError {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"success": false, "error": message})),
    )
}

/// Check bearer token auth. Returns `None` if authorized, `Some(response)` if rejected.
fn check_auth(headers: &HeaderMap, api_key: &Option<String>) -> Option<ApiError> {
    let key = api_key.as_ref()?;

    let Some(header) = headers.get("authorization") else {
        return Some(unauthorized("missing Authorization header"));
    };
    let Ok(value) = header.to_str() else {
        return Some(unauthorized("invalid Authorization header"));
    };

    match value.strip_prefix("Bearer ") {
        Some(token) if constant_time_eq(token, key) => None,
        _ => Some(unauthorized("invalid token")),
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all("cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim().to_string())
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the caller's tenant from cookie or header.
fn tenant_from_headers(headers: &HeaderMap) -> Result<TenantContext, ApiError> {
    let raw = cookie_value(headers, SCHEMA_COOKIE)
        .filter(|v| !v.is_empty())
        .or_else(|| header_value(headers, SCHEMA_HEADER))
        .ok_or_else(|| unauthorized("No tenant schema found for this session"))?;
    let schema = SchemaName::parse(&raw).map_err(|_| unauthorized("Invalid tenant schema"))?;

    let mut tenant = TenantContext::new(schema);
    if let Some(user) = header_value(headers, USER_HEADER) {
        tenant = tenant.with_user(user);
    }
    Ok(tenant)
}

/// Bearer check plus tenant resolution; the guard for tenant-scoped routes.
pub(crate) fn authorize(headers: &HeaderMap, state: &ApiState) -> Result<TenantContext, ApiError> {
    if let Some(err) = check_auth(headers, &state.api_key) {
        return Err(err);
    }
    tenant_from_headers(headers)
}

fn status_for(e: &HeraldError) -> StatusCode {
    match e {
        HeraldError::Validation(_) | HeraldError::Import(_) => StatusCode::BAD_REQUEST,
        HeraldError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        HeraldError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map an error to a response. Client errors carry their own message;
/// server errors use `context` and put the cause in `details`.
pub(crate) fn fail(context: &str, e: HeraldError) -> ApiError {
    let status = status_for(&e);
    let body = match &e {
        HeraldError::Validation(m)
        | HeraldError::Import(m)
        | HeraldError::Unauthorized(m)
        | HeraldError::NotFound(m) => json!({"success": false, "error": m}),
        other => {
            error!("{context}: {other}");
            json!({"success": false, "error": context, "details": other.to_string()})
        }
    };
    (status, Json(body))
}

/// A JSON body whose rejection the handler reports itself, after auth.
pub(crate) type JsonBody<T> = Result<Json<T>, JsonRejection>;

/// Unwrap a [`JsonBody`], turning malformed or mistyped JSON into a 400.
pub(crate) fn parse_body<T>(body: JsonBody<T>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|e| bad_request(&format!("invalid request: {}", e.body_text())))
}

pub(crate) fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"success": false, "error": message})),
    )
}

/// `GET /api/health`: Liveness with uptime and webhook configuration.
async fn health(State(state): State<ApiState>) -> Json<Value> {
    use herald_core::traits::WebhookTarget;
    Json(json!({
        "status": "ok",
        "uptime_secs": state.uptime.elapsed().as_secs(),
        "campaign_webhook": state.dispatcher.is_configured(WebhookTarget::Campaign),
        "single_message_webhook": state.dispatcher.is_configured(WebhookTarget::SingleMessage),
    }))
}

/// Build the axum router with shared state.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/campaigns",
            get(campaigns::list).post(campaigns::create),
        )
        .route("/api/campaigns/{id}", get(campaigns::get_one))
        .route("/api/campaigns/{id}/auto-reply", patch(campaigns::auto_reply))
        .route("/api/contacts", get(contacts::list))
        .route("/api/contacts/import", post(contacts::import))
        .route("/api/contacts/{lead_id}/status", put(contacts::update_status))
        .route("/api/contacts/{lead_id}/verify", get(contacts::verify))
        .route("/api/messages/send", post(messages::send))
        .route(
            "/api/messages/{lead_id}",
            get(messages::list).post(messages::record),
        )
        .route("/api/messages/{lead_id}/read", put(messages::mark_read))
        .route("/api/prompts", get(prompts::list).post(prompts::create))
        .route(
            "/api/prompts/{id}",
            get(prompts::get_one)
                .put(prompts::update)
                .delete(prompts::delete),
        )
        .route("/api/user-schema", get(tenants::user_schema))
        .route("/api/user-schema/custom-settings", get(tenants::custom_settings))
        .route("/api/templates", get(templates::list))
        .route("/api/outbox", get(outbox::list))
        .route("/api/outbox/retry", post(outbox::retry))
        .layer(axum::extract::DefaultBodyLimit::max(5 * 1024 * 1024)) // 5 MB for CSV imports
        .with_state(state)
}

/// Start the API server.
pub async fn serve(config: ApiConfig, state: ApiState) -> Result<(), HeraldError> {
    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| HeraldError::Config(format!("API server failed to bind to {addr}: {e}")))?;

    info!("API server listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
