use crate::error::HeraldError;
use crate::model::SubmittedContact;
use crate::template::ParameterMapping;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Language used when a campaign request does not name one.
pub const DEFAULT_TEMPLATE_LANGUAGE: &str = "en_US";

/// Campaign lifecycle label. New campaigns start as `draft`; later
/// transitions are owned by the automation backend.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Queued,
    Running,
    Paused,
    Done,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Done => "done",
        }
    }
}

impl FromStr for CampaignStatus {
    type Err = HeraldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "paused" => Ok(Self::Paused),
            "done" => Ok(Self::Done),
            other => Err(HeraldError::Validation(format!(
                "unknown campaign status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub template_name: String,
    pub template_language: String,
    pub template_id: Option<String>,
    pub status: CampaignStatus,
    pub scheduled_at: Option<String>,
    pub prompt_id: Option<String>,
    pub auto_reply: bool,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

/// Validated insert data for a campaign row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCampaign {
    pub name: String,
    pub description: Option<String>,
    pub template_name: String,
    pub template_language: String,
    pub template_id: Option<String>,
    pub scheduled_at: Option<String>,
    pub prompt_id: Option<String>,
    pub auto_reply: bool,
}

/// Body of `POST /api/campaigns`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCampaignRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub template_name: String,
    #[serde(default)]
    pub template_language: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub contacts: Vec<SubmittedContact>,
    #[serde(default)]
    pub scheduled_at: Option<String>,
    #[serde(default)]
    pub prompt_id: Option<String>,
    #[serde(default)]
    pub auto_reply: Option<bool>,
    #[serde(default)]
    pub parameter_mappings: Vec<ParameterMapping>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl CreateCampaignRequest {
    /// Check required fields and produce the row to insert.
    pub fn validate(&self) -> Result<NewCampaign, HeraldError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(HeraldError::Validation("campaign name is required".into()));
        }
        let template_name = self.template_name.trim();
        if template_name.is_empty() {
            return Err(HeraldError::Validation("template_name is required".into()));
        }

        Ok(NewCampaign {
            name: name.to_string(),
            description: non_blank(&self.description),
            template_name: template_name.to_string(),
            template_language: non_blank(&self.template_language)
                .unwrap_or_else(|| DEFAULT_TEMPLATE_LANGUAGE.to_string()),
            template_id: non_blank(&self.template_id),
            scheduled_at: non_blank(&self.scheduled_at),
            prompt_id: non_blank(&self.prompt_id),
            auto_reply: self.auto_reply.unwrap_or(false),
        })
    }
}
