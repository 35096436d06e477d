//! WhatsApp template catalog types and per-contact parameter resolution.
//!
//! Templates embed positional (`{{1}}`) or named (`{{first_name}}`)
//! placeholders. A campaign carries a mapping table from each placeholder to
//! a contact field; [`resolve_params`] turns that table into the concrete
//! parameter list sent with every contact.

use crate::model::{Contact, ImportContact};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Contact fields every mapping may target besides custom fields.
pub const FIXED_FIELDS: &[&str] = &["name", "phone_number"];

/// Template review state as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TemplateStatus {
    Approved,
    Pending,
    Rejected,
    Disabled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateButton {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateComponent {
    /// `HEADER`, `BODY`, `FOOTER` or `BUTTONS`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<TemplateButton>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatsAppTemplate {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub language: String,
    pub status: TemplateStatus,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub components: Vec<TemplateComponent>,
    /// `POSITIONAL` or `NAMED` when the catalog reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_format: Option<String>,
}

impl WhatsAppTemplate {
    pub fn is_approved(&self) -> bool {
        self.status == TemplateStatus::Approved
    }

    /// Lowercased parameter format, or empty when unknown.
    pub fn template_type(&self) -> String {
        self.parameter_format
            .as_deref()
            .unwrap_or("")
            .to_lowercase()
    }
}

/// Catalog response body: `{ "data": [...] }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateCatalog {
    #[serde(default)]
    pub data: Vec<WhatsAppTemplate>,
}

/// Maps one template placeholder to a contact field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterMapping {
    pub placeholder: String,
    pub parameter_name: String,
    /// `name`, `phone_number`, or a custom field key. Empty = unmapped.
    #[serde(default)]
    pub mapped_field: String,
    #[serde(rename = "type", default = "text_kind")]
    pub kind: String,
}

fn text_kind() -> String {
    "text".to_string()
}

/// One resolved template parameter for one contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateParam {
    #[serde(rename = "type")]
    pub kind: String,
    pub parameter_name: String,
    pub text: String,
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([^}]+?)\s*\}\}").expect("static placeholder regex"))
}

/// Unique placeholders across all components, in order of first appearance.
/// Whitespace inside the braces is dropped: `{{ name }}` becomes `{{name}}`.
pub fn extract_placeholders(template: &WhatsAppTemplate) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for text in template.components.iter().filter_map(|c| c.text.as_deref()) {
        for caps in placeholder_regex().captures_iter(text) {
            let token = format!("{{{{{}}}}}", caps[1].trim());
            if !found.contains(&token) {
                found.push(token);
            }
        }
    }
    found
}

/// Default parameter name for a placeholder: positional `{{3}}` becomes
/// `param_3`, named `{{first_name}}` stays `first_name`.
pub fn parameter_name_for(placeholder: &str) -> String {
    let key: String = placeholder
        .chars()
        .filter(|c| *c != '{' && *c != '}')
        .collect();
    let key = key.trim();
    if !key.is_empty() && key.chars().all(|c| c.is_ascii_digit()) {
        format!("param_{key}")
    } else {
        key.to_string()
    }
}

/// Unmapped starting table for a template's placeholders.
pub fn default_mappings(template: &WhatsAppTemplate) -> Vec<ParameterMapping> {
    extract_placeholders(template)
        .into_iter()
        .map(|placeholder| ParameterMapping {
            parameter_name: parameter_name_for(&placeholder),
            placeholder,
            mapped_field: String::new(),
            kind: text_kind(),
        })
        .collect()
}

/// Fields a mapping can target for this contact list: the fixed fields
/// followed by every custom field key seen, sorted.
pub fn available_fields(contacts: &[ImportContact]) -> Vec<String> {
    let mut custom: Vec<String> = contacts
        .iter()
        .flat_map(|c| c.custom_fields.keys().cloned())
        .filter(|k| !FIXED_FIELDS.contains(&k.as_str()))
        .collect();
    custom.sort();
    custom.dedup();

    FIXED_FIELDS
        .iter()
        .map(|f| f.to_string())
        .chain(custom)
        .collect()
}

/// Resolve every mapping against one contact. Unknown or unmapped fields
/// resolve to empty text.
pub fn resolve_params(contact: &Contact, mappings: &[ParameterMapping]) -> Vec<TemplateParam> {
    mappings
        .iter()
        .map(|m| {
            let text = match m.mapped_field.as_str() {
                "name" => contact.name.clone(),
                "phone_number" => contact.phone_number.clone(),
                field => contact.custom_fields.get(field).cloned().unwrap_or_default(),
            };
            TemplateParam {
                kind: text_kind(),
                parameter_name: m.parameter_name.clone(),
                text,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CustomFields;
    use chrono::Utc;

    fn template(texts: &[&str]) -> WhatsAppTemplate {
        WhatsAppTemplate {
            id: "t1".into(),
            name: "promo".into(),
            language: "en_US".into(),
            status: TemplateStatus::Approved,
            category: "MARKETING".into(),
            components: texts
                .iter()
                .map(|t| TemplateComponent {
                    kind: "BODY".into(),
                    format: None,
                    text: Some(t.to_string()),
                    example: None,
                    buttons: vec![],
                })
                .collect(),
            parameter_format: Some("NAMED".into()),
        }
    }

    fn contact(custom: &[(&str, &str)]) -> Contact {
        Contact {
            id: "c1".into(),
            lead_id: "lead_1".into(),
            name: "Ann".into(),
            phone_number: "+15551234567".into(),
            custom_fields: custom
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<CustomFields>(),
            lead_status: "new".into(),
            created_date: Utc::now(),
            updated_date: Utc::now(),
        }
    }

    #[test]
    fn test_extract_placeholders_dedupes_in_order() {
        let t = template(&[
            "Hi {{ first_name }}, your code is {{1}}.",
            "Thanks {{first_name}}! Offer ends {{2}} {{1}}",
        ]);
        assert_eq!(
            extract_placeholders(&t),
            vec!["{{first_name}}", "{{1}}", "{{2}}"]
        );
    }

    #[test]
    fn test_extract_placeholders_skips_components_without_text() {
        let mut t = template(&["Hello {{1}}"]);
        t.components.push(TemplateComponent {
            kind: "BUTTONS".into(),
            format: None,
            text: None,
            example: None,
            buttons: vec![],
        });
        assert_eq!(extract_placeholders(&t), vec!["{{1}}"]);
    }

    #[test]
    fn test_parameter_name_for() {
        assert_eq!(parameter_name_for("{{1}}"), "param_1");
        assert_eq!(parameter_name_for("{{12}}"), "param_12");
        assert_eq!(parameter_name_for("{{client_name}}"), "client_name");
    }

    #[test]
    fn test_default_mappings_are_unmapped() {
        let maps = default_mappings(&template(&["{{1}} and {{city}}"]));
        assert_eq!(maps.len(), 2);
        assert_eq!(maps[0].parameter_name, "param_1");
        assert_eq!(maps[1].parameter_name, "city");
        assert!(maps.iter().all(|m| m.mapped_field.is_empty() && m.kind == "text"));
    }

    #[test]
    fn test_resolve_params_fixed_custom_and_missing() {
        let c = contact(&[("city", "Lisbon")]);
        let mappings = vec![
            ParameterMapping {
                placeholder: "{{1}}".into(),
                parameter_name: "param_1".into(),
                mapped_field: "name".into(),
                kind: "text".into(),
            },
            ParameterMapping {
                placeholder: "{{city}}".into(),
                parameter_name: "city".into(),
                mapped_field: "city".into(),
                kind: "text".into(),
            },
            ParameterMapping {
                placeholder: "{{plan}}".into(),
                parameter_name: "plan".into(),
                mapped_field: "plan".into(),
                kind: "text".into(),
            },
        ];
        let params = resolve_params(&c, &mappings);
        let texts: Vec<&str> = params.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["Ann", "Lisbon", ""]);
        assert_eq!(
            serde_json::to_value(&params[0]).unwrap(),
            serde_json::json!({"type": "text", "parameter_name": "param_1", "text": "Ann"})
        );
    }

    #[test]
    fn test_available_fields() {
        let contacts = vec![
            ImportContact {
                name: "A".into(),
                phone_number: "+1".into(),
                custom_fields: [("plan".to_string(), "pro".to_string())].into(),
            },
            ImportContact {
                name: "B".into(),
                phone_number: "+2".into(),
                custom_fields: [
                    ("city".to_string(), "x".to_string()),
                    ("plan".to_string(), "basic".to_string()),
                ]
                .into(),
            },
        ];
        assert_eq!(
            available_fields(&contacts),
            vec!["name", "phone_number", "city", "plan"]
        );
    }

    #[test]
    fn test_catalog_parses_unknown_status() {
        let json = r#"{"data":[{"name":"a","status":"APPROVED","components":[]},
                               {"name":"b","status":"IN_APPEAL"}]}"#;
        let catalog: TemplateCatalog = serde_json::from_str(json).unwrap();
        assert!(catalog.data[0].is_approved());
        assert_eq!(catalog.data[1].status, TemplateStatus::Unknown);
        assert_eq!(catalog.data[0].template_type(), "");
    }
}
