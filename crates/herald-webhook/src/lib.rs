//! # herald-webhook
//!
//! Outbound JSON hand-off to the automation backend (campaign and
//! single-message webhooks) and the template catalog client.

pub mod client;
pub mod payload;

pub use client::WebhookClient;
pub use payload::{CampaignDispatch, CampaignTarget, SendMessageRequest, SingleMessageDispatch};
