//! Contact import pipeline: parse, normalize, then upsert into the store.

use herald_core::{
    error::HeraldError,
    model::Contact,
    template::available_fields,
    tenant::TenantContext,
};
use herald_import::{normalize_country_code, parse_contacts, ParseOptions};
use herald_store::Store;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Country code for numbers written without `+`. Empty or `None` means
    /// such numbers are skipped.
    pub default_country_code: Option<String>,
    /// Replace stored names with imported ones.
    pub update_names: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            default_country_code: None,
            update_names: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub contacts: Vec<Contact>,
    pub created: usize,
    pub updated: usize,
    pub skipped_count: usize,
    pub skipped_message: Option<String>,
    pub duplicates_merged: usize,
    /// Fields available for template parameter mapping.
    pub available_fields: Vec<String>,
    /// Per-contact storage failures.
    pub errors: Vec<String>,
}

pub async fn run(
    store: &Store,
    tenant: &TenantContext,
    text: &str,
    options: &ImportOptions,
) -> Result<ImportSummary, HeraldError> {
    let default_country_code = match options.default_country_code.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(code) => Some(normalize_country_code(code).ok_or_else(|| {
            HeraldError::Validation(format!("invalid default country code '{code}'"))
        })?),
    };

    let parsed = parse_contacts(
        text,
        &ParseOptions {
            default_country_code,
        },
    )?;
    let report = store
        .import_contacts(tenant, &parsed.contacts, options.update_names)
        .await;

    info!(
        "import: {} created, {} updated, {} skipped, {} failed for {}",
        report.created,
        report.updated,
        parsed.skipped_count,
        report.errors.len(),
        tenant.schema
    );

    Ok(ImportSummary {
        available_fields: available_fields(&parsed.contacts),
        contacts: report.contacts,
        created: report.created,
        updated: report.updated,
        skipped_count: parsed.skipped_count,
        skipped_message: parsed.skipped_message,
        duplicates_merged: parsed.duplicates_merged,
        errors: report.errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{tenant, test_store};

    #[tokio::test]
    async fn test_import_twice_keeps_one_row_per_phone() {
        let store = test_store().await;
        let t = tenant("acme");

        let first = run(
            &store,
            &t,
            "name,phone,city\nAnn,+15551234567,Austin\n",
            &ImportOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(first.created, 1);
        let lead_id = first.contacts[0].lead_id.clone();

        let second = run(
            &store,
            &t,
            "name,phone,plan\nAnn,+15551234567,pro\nBo,+15557654321,basic\n",
            &ImportOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(second.created, 1);
        assert_eq!(second.updated, 1);
        let ann = second
            .contacts
            .iter()
            .find(|c| c.phone_number == "+15551234567")
            .unwrap();
        assert_eq!(ann.lead_id, lead_id);
        assert_eq!(ann.custom_fields["city"], "Austin");
        assert_eq!(ann.custom_fields["plan"], "pro");
        assert_eq!(store.list_contacts(&t).await.unwrap().len(), 2);
        assert_eq!(second.available_fields, vec!["name", "phone_number", "plan"]);
    }

    #[tokio::test]
    async fn test_import_with_default_country() {
        let store = test_store().await;
        let t = tenant("acme");
        let opts = ImportOptions {
            default_country_code: Some("1".into()),
            update_names: true,
        };
        let summary = run(&store, &t, "phone\n555 123 4567\n12345\n", &opts)
            .await
            .unwrap();
        assert_eq!(summary.contacts[0].phone_number, "+15551234567");
        assert_eq!(summary.skipped_count, 1);
    }

    #[tokio::test]
    async fn test_import_rejects_bad_country_code() {
        let store = test_store().await;
        let opts = ImportOptions {
            default_country_code: Some("abc".into()),
            update_names: true,
        };
        let err = run(&store, &tenant("acme"), "phone\n+15551234567\n", &opts)
            .await
            .unwrap_err();
        assert!(matches!(err, HeraldError::Validation(_)));
    }

    #[tokio::test]
    async fn test_import_too_many_columns_stores_nothing() {
        let store = test_store().await;
        let t = tenant("acme");
        let header = (0..13).map(|i| format!("c{i}")).collect::<Vec<_>>().join(",");
        let text = format!("name,phone,{header}\nAnn,+15551234567\n");
        let err = run(&store, &t, &text, &ImportOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, HeraldError::Import(_)));
        assert!(store.list_contacts(&t).await.unwrap().is_empty());
    }
}
