//! Shared test fixtures: in-memory store and a recording dispatcher.

use async_trait::async_trait;
use herald_core::config::StoreConfig;
use herald_core::error::HeraldError;
use herald_core::template::{TemplateComponent, TemplateStatus, WhatsAppTemplate};
use herald_core::tenant::{SchemaName, TenantContext};
use herald_core::traits::{Dispatcher, WebhookTarget};
use herald_store::Store;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub async fn test_store() -> Store {
    Store::new(&StoreConfig::in_memory()).await.unwrap()
}

pub fn tenant(schema: &str) -> TenantContext {
    TenantContext::new(SchemaName::parse(schema).unwrap()).with_user("user-1")
}

pub fn template(name: &str, format: &str, body: &str) -> WhatsAppTemplate {
    WhatsAppTemplate {
        id: format!("tpl-{name}"),
        name: name.to_string(),
        language: "en_US".to_string(),
        status: TemplateStatus::Approved,
        category: "MARKETING".to_string(),
        components: vec![TemplateComponent {
            kind: "BODY".to_string(),
            format: None,
            text: Some(body.to_string()),
            example: None,
            buttons: vec![],
        }],
        parameter_format: Some(format.to_string()),
    }
}

/// Records every delivered payload. Failure is switchable at runtime.
pub struct MockDispatcher {
    pub sent: Arc<Mutex<Vec<(WebhookTarget, Value)>>>,
    pub fail: Arc<Mutex<bool>>,
    pub configured: bool,
    pub templates: Vec<WhatsAppTemplate>,
    /// Simulated network latency per delivery.
    pub delay: Duration,
}

impl MockDispatcher {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: Arc::new(Mutex::new(false)),
            configured: true,
            templates: vec![template("promo", "NAMED", "Hi {{first_name}}")],
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing() -> Self {
        let d = Self::new();
        *d.fail.lock().unwrap() = true;
        d
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }
}

#[async_trait]
impl Dispatcher for MockDispatcher {
    fn is_configured(&self, _target: WebhookTarget) -> bool {
        self.configured
    }

    async fn deliver(&self, target: WebhookTarget, payload: &Value) -> Result<Value, HeraldError> {
        if !self.configured {
            return Err(HeraldError::Webhook(format!("{} webhook not configured", target.as_str())));
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if *self.fail.lock().unwrap() {
            return Err(HeraldError::Webhook(
                "webhook returned 502 Bad Gateway: upstream down".into(),
            ));
        }
        self.sent.lock().unwrap().push((target, payload.clone()));
        Ok(json!({"status": "queued"}))
    }

    async fn fetch_templates(&self) -> Result<Vec<WhatsAppTemplate>, HeraldError> {
        if !self.configured {
            return Err(HeraldError::Webhook("template catalog not configured".into()));
        }
        Ok(self.templates.clone())
    }
}
