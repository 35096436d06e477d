//! Webhook payload shapes expected by the automation backend.

use herald_core::{
    error::HeraldError,
    model::Contact,
    template::{resolve_params, ParameterMapping, TemplateParam},
};
use serde::{Deserialize, Serialize};

/// Campaign-wide values shared by every contact's payload entry.
#[derive(Debug, Clone)]
pub struct CampaignTarget<'a> {
    pub campaign_id: &'a str,
    pub template_name: &'a str,
    pub template_id: &'a str,
    /// Lowercased `parameter_format` of the template, or empty.
    pub template_type: &'a str,
    pub mappings: &'a [ParameterMapping],
    pub schema_name: &'a str,
    pub auth_user_id: &'a str,
}

/// One contact's entry in the campaign webhook array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignDispatch {
    pub name: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    pub campaign_id: String,
    pub template_name: String,
    pub lead_id: String,
    pub template_id: String,
    pub template_type: String,
    pub template_params: Vec<TemplateParam>,
    pub schema_name: String,
    pub auth_user_id: String,
}

impl CampaignDispatch {
    pub fn for_contact(contact: &Contact, target: &CampaignTarget<'_>) -> Self {
        Self {
            name: contact.name.clone(),
            phone: contact.phone_number.clone(),
            campaign_id: target.campaign_id.to_string(),
            template_name: target.template_name.to_string(),
            lead_id: contact.lead_id.clone(),
            template_id: target.template_id.to_string(),
            template_type: target.template_type.to_string(),
            template_params: resolve_params(contact, target.mappings),
            schema_name: target.schema_name.to_string(),
            auth_user_id: target.auth_user_id.to_string(),
        }
    }

    /// The full campaign payload: one entry per contact, in order.
    pub fn batch(contacts: &[Contact], target: &CampaignTarget<'_>) -> Vec<Self> {
        contacts
            .iter()
            .map(|c| Self::for_contact(c, target))
            .collect()
    }
}

/// Body of `POST /api/messages/send`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub lead_id: Option<String>,
    #[serde(default)]
    pub message_content: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub campaign_id: Option<String>,
}

/// Payload for the single-message webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleMessageDispatch {
    pub name: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    pub campaign_id: Option<String>,
    pub lead_id: String,
    pub message_content: String,
}

impl SendMessageRequest {
    /// `lead_id` and `message_content` are required.
    pub fn into_dispatch(self) -> Result<SingleMessageDispatch, HeraldError> {
        let lead_id = self.lead_id.filter(|v| !v.trim().is_empty());
        let content = self.message_content.filter(|v| !v.trim().is_empty());
        let (Some(lead_id), Some(message_content)) = (lead_id, content) else {
            return Err(HeraldError::Validation(
                "Missing required fields: lead_id and message_content are required".into(),
            ));
        };
        Ok(SingleMessageDispatch {
            name: self.name.unwrap_or_default(),
            phone: self.phone_number.unwrap_or_default(),
            campaign_id: self.campaign_id.filter(|v| !v.is_empty()),
            lead_id,
            message_content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use herald_core::model::CustomFields;
    use serde_json::json;

    fn contact() -> Contact {
        Contact {
            id: "c1".into(),
            lead_id: "lead_abc".into(),
            name: "Ann".into(),
            phone_number: "+15551234567".into(),
            custom_fields: [("city".to_string(), "Austin".to_string())]
                .into_iter()
                .collect::<CustomFields>(),
            lead_status: "new".into(),
            created_date: Utc::now(),
            updated_date: Utc::now(),
        }
    }

    #[test]
    fn test_campaign_dispatch_wire_shape() {
        let mappings = vec![ParameterMapping {
            placeholder: "{{city}}".into(),
            parameter_name: "city".into(),
            mapped_field: "city".into(),
            kind: "text".into(),
        }];
        let target = CampaignTarget {
            campaign_id: "camp-1",
            template_name: "promo",
            template_id: "",
            template_type: "named",
            mappings: &mappings,
            schema_name: "acme",
            auth_user_id: "user-1",
        };
        let value = serde_json::to_value(CampaignDispatch::batch(&[contact()], &target)).unwrap();
        assert_eq!(
            value,
            json!([{
                "name": "Ann",
                "Phone": "+15551234567",
                "campaign_id": "camp-1",
                "template_name": "promo",
                "lead_id": "lead_abc",
                "template_id": "",
                "template_type": "named",
                "template_params": [{"type": "text", "parameter_name": "city", "text": "Austin"}],
                "schema_name": "acme",
                "auth_user_id": "user-1",
            }])
        );
    }

    #[test]
    fn test_send_request_requires_lead_and_content() {
        let err = SendMessageRequest {
            lead_id: Some("L1".into()),
            ..Default::default()
        }
        .into_dispatch()
        .unwrap_err();
        assert!(err.to_string().contains("lead_id and message_content"));
    }

    #[test]
    fn test_single_message_wire_shape() {
        let d = SendMessageRequest {
            lead_id: Some("L1".into()),
            message_content: Some("Hello!".into()),
            phone_number: Some("+15551234567".into()),
            ..Default::default()
        }
        .into_dispatch()
        .unwrap();
        assert_eq!(
            serde_json::to_value(&d).unwrap(),
            json!({
                "name": "",
                "Phone": "+15551234567",
                "campaign_id": null,
                "lead_id": "L1",
                "message_content": "Hello!",
            })
        );
    }
}
