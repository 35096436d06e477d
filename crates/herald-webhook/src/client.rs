//! reqwest-backed [`Dispatcher`].

use async_trait::async_trait;
use herald_core::{
    config::WebhookConfig,
    error::HeraldError,
    template::{TemplateCatalog, WhatsAppTemplate},
    traits::{Dispatcher, WebhookTarget},
};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub struct WebhookClient {
    client: reqwest::Client,
    campaign_endpoint: Option<String>,
    single_message_endpoint: Option<String>,
    template_catalog_url: Option<String>,
}

fn configured(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl WebhookClient {
    pub fn from_config(config: &WebhookConfig) -> Result<Self, HeraldError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| HeraldError::Webhook(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            campaign_endpoint: configured(&config.campaign_endpoint),
            single_message_endpoint: configured(&config.single_message_endpoint),
            template_catalog_url: configured(&config.template_catalog_url),
        })
    }

    fn endpoint(&self, target: WebhookTarget) -> Option<&str> {
        match target {
            WebhookTarget::Campaign => self.campaign_endpoint.as_deref(),
            WebhookTarget::SingleMessage => self.single_message_endpoint.as_deref(),
        }
    }
}

#[async_trait]
impl Dispatcher for WebhookClient {
    fn is_configured(&self, target: WebhookTarget) -> bool {
        self.endpoint(target).is_some()
    }

    async fn deliver(&self, target: WebhookTarget, payload: &Value) -> Result<Value, HeraldError> {
        let url = self.endpoint(target).ok_or_else(|| {
            HeraldError::Webhook(format!("{} webhook not configured", target.as_str()))
        })?;
        debug!(
            "webhook: POST {url} target={} entries={}",
            target.as_str(),
            payload.as_array().map(Vec::len).unwrap_or(1)
        );

        let resp = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| HeraldError::Webhook(format!("request failed: {e}")))?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            warn!("webhook: {url} returned {status}");
            return Err(HeraldError::Webhook(format!("webhook returned {status}: {text}")));
        }

        // Automation endpoints are not consistent about JSON replies.
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }

    async fn fetch_templates(&self) -> Result<Vec<WhatsAppTemplate>, HeraldError> {
        let url = self
            .template_catalog_url
            .as_deref()
            .ok_or_else(|| HeraldError::Webhook("template catalog not configured".into()))?;
        debug!("webhook: GET {url}");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HeraldError::Webhook(format!("catalog request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(HeraldError::Webhook(format!(
                "catalog returned {status}: {text}"
            )));
        }

        let catalog: TemplateCatalog = resp
            .json()
            .await
            .map_err(|e| HeraldError::Webhook(format!("failed to parse catalog: {e}")))?;
        Ok(catalog.data)
    }
}
