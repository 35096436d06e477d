use crate::error::HeraldError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageDirection {
    Outgoing,
    Incoming,
}

impl MessageDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Outgoing => "Outgoing",
            Self::Incoming => "Incoming",
        }
    }
}

impl FromStr for MessageDirection {
    type Err = HeraldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Outgoing" => Ok(Self::Outgoing),
            "Incoming" => Ok(Self::Incoming),
            other => Err(HeraldError::Validation(format!(
                "unknown message type '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    #[default]
    Sent,
    Delivered,
    Read,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = HeraldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "read" => Ok(Self::Read),
            "failed" => Ok(Self::Failed),
            other => Err(HeraldError::Validation(format!(
                "unknown delivery status '{other}'"
            ))),
        }
    }
}

/// One entry of a lead's conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageHistory {
    pub id: String,
    pub message_id: Option<String>,
    pub from_number: String,
    pub to_number: String,
    pub message_text: String,
    pub message_type: MessageDirection,
    pub status: DeliveryStatus,
    pub lead_id: String,
    pub is_read: bool,
    pub created_date: DateTime<Utc>,
    pub campaign_id: Option<String>,
}

/// A history entry reported by the automation backend.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    #[serde(default)]
    pub message_id: Option<String>,
    pub from_number: String,
    pub to_number: String,
    pub message_text: String,
    pub message_type: MessageDirection,
    #[serde(default)]
    pub status: DeliveryStatus,
    #[serde(default)]
    pub campaign_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serializes_capitalized() {
        assert_eq!(
            serde_json::to_string(&MessageDirection::Incoming).unwrap(),
            "\"Incoming\""
        );
        assert_eq!(
            "Outgoing".parse::<MessageDirection>().unwrap(),
            MessageDirection::Outgoing
        );
        assert!("outgoing".parse::<MessageDirection>().is_err());
    }

    #[test]
    fn test_new_message_defaults_to_sent() {
        let msg: NewMessage = serde_json::from_str(
            r#"{"from_number":"+1","to_number":"+2","message_text":"hi","message_type":"Outgoing"}"#,
        )
        .unwrap();
        assert_eq!(msg.status, DeliveryStatus::Sent);
        assert_eq!(msg.campaign_id, None);
    }
}
