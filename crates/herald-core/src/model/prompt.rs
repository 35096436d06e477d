use crate::error::HeraldError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Models a prompt may target.
pub const GPT_MODELS: &[&str] = &["gpt-4.1"];

/// Maximum number of prompts returned by a list call.
pub const PROMPT_LIST_LIMIT: i64 = 100;

/// AI auto-reply prompt configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: String,
    pub name: String,
    pub gpt_model: String,
    pub prompt_message: String,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

/// Create/update body for a prompt, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub gpt_model: Option<String>,
    #[serde(default)]
    pub prompt_message: Option<String>,
}

/// A prompt that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPrompt {
    pub name: String,
    pub gpt_model: String,
    pub prompt_message: String,
}

impl PromptInput {
    /// All three fields are required. The name is trimmed; the message is
    /// kept verbatim.
    pub fn validate(&self) -> Result<ValidPrompt, HeraldError> {
        let name = self.name.as_deref().map(str::trim).unwrap_or("");
        let model = self.gpt_model.as_deref().map(str::trim).unwrap_or("");
        let message = self.prompt_message.as_deref().unwrap_or("");

        if name.is_empty() || model.is_empty() || message.trim().is_empty() {
            return Err(HeraldError::Validation(
                "Name, GPT model, and prompt message are required".into(),
            ));
        }
        if !GPT_MODELS.contains(&model) {
            return Err(HeraldError::Validation(format!(
                "Invalid GPT model. Must be one of: {}",
                GPT_MODELS.join(", ")
            )));
        }

        Ok(ValidPrompt {
            name: name.to_string(),
            gpt_model: model.to_string(),
            prompt_message: message.to_string(),
        })
    }
}
