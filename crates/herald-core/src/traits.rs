use crate::{error::HeraldError, template::WhatsAppTemplate};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Which automation endpoint a payload is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookTarget {
    /// Bulk campaign hand-off: an array with one entry per contact.
    Campaign,
    /// A single free-text message to one lead.
    SingleMessage,
}

impl WebhookTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Campaign => "campaign",
            Self::SingleMessage => "single_message",
        }
    }
}

impl FromStr for WebhookTarget {
    type Err = HeraldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "campaign" => Ok(Self::Campaign),
            "single_message" => Ok(Self::SingleMessage),
            other => Err(HeraldError::Webhook(format!("unknown webhook target '{other}'"))),
        }
    }
}

/// Outbound hand-off to the automation backend that performs actual
/// WhatsApp delivery.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Whether an endpoint is configured for this target.
    fn is_configured(&self, target: WebhookTarget) -> bool;

    /// POST a JSON payload. Returns the endpoint's response body.
    async fn deliver(&self, target: WebhookTarget, payload: &Value) -> Result<Value, HeraldError>;

    /// Fetch the WhatsApp template catalog.
    async fn fetch_templates(&self) -> Result<Vec<WhatsAppTemplate>, HeraldError>;
}
