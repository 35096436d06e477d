use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Free-form per-contact attributes (e.g. `city`, `plan`).
pub type CustomFields = BTreeMap<String, String>;

/// Status given to every newly created contact.
pub const DEFAULT_LEAD_STATUS: &str = "new";

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub lead_id: String,
    pub name: String,
    pub phone_number: String,
    pub custom_fields: CustomFields,
    pub lead_status: String,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

impl Contact {
    pub fn custom_field_keys(&self) -> Vec<String> {
        self.custom_fields.keys().cloned().collect()
    }
}

/// A contact row ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContact {
    pub lead_id: String,
    pub name: String,
    pub phone_number: String,
    pub custom_fields: CustomFields,
}

/// One contact produced by the CSV/text importer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportContact {
    #[serde(default)]
    pub name: String,
    pub phone_number: String,
    #[serde(default)]
    pub custom_fields: CustomFields,
}

/// A contact as submitted with a campaign. Phone may arrive under
/// `phone_number`, `phone` or `Phone`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmittedContact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "phone", alias = "Phone")]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub lead_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_custom_fields")]
    pub custom_fields: CustomFields,
}

impl SubmittedContact {
    /// Storage shape, generating a lead id when none was supplied.
    /// Returns `None` when there is no phone number.
    pub fn into_new_contact(self) -> Option<NewContact> {
        let phone = self.phone_number.as_deref().map(str::trim).unwrap_or("");
        if phone.is_empty() {
            return None;
        }
        let lead_id = self
            .lead_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(generate_lead_id);
        Some(NewContact {
            lead_id,
            name: self.name.unwrap_or_default().trim().to_string(),
            phone_number: phone.to_string(),
            custom_fields: self.custom_fields,
        })
    }
}

/// Accept any JSON scalar as a custom field value.
fn lenient_custom_fields<'de, D>(deserializer: D) -> Result<CustomFields, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| {
            let text = match v {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (k, text)
        })
        .collect())
}

/// Merge imported custom fields into existing ones. Incoming values win;
/// existing keys absent from the import are kept.
pub fn merge_custom_fields(existing: &CustomFields, incoming: &CustomFields) -> CustomFields {
    let mut merged = existing.clone();
    for (key, value) in incoming {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Opaque lead identifier: `lead_<millis base36>_<6 random base36 chars>`.
pub fn generate_lead_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("lead_{}_{suffix}", to_base36(millis))
}

/// Contact row for the conversation list: latest message and unread count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactWithHistory {
    pub name: String,
    pub lead_id: String,
    pub phone_number: String,
    pub lead_status: String,
    pub last_message: Option<crate::model::MessageHistory>,
    pub unread_count: i64,
}
