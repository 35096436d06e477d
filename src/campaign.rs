//! Campaign creation: campaign row, contact reconciliation, webhook hand-off.
//!
//! Each stage fails independently. A webhook failure never undoes the
//! campaign or its contacts; the payload is parked in the outbox instead.

use herald_core::{
    error::HeraldError,
    model::{Campaign, CreateCampaignRequest, NewContact},
    tenant::TenantContext,
    traits::{Dispatcher, WebhookTarget},
};
use herald_store::{ContactStats, Store};
use herald_webhook::{CampaignDispatch, CampaignTarget};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What happened to the webhook hand-off.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    Delivered(Value),
    NotConfigured,
    Failed {
        error: String,
        /// Outbox entry holding the payload, when it could be saved.
        outbox_id: Option<String>,
    },
}

/// Result of a campaign submission whose campaign row and contacts exist.
#[derive(Debug, Clone)]
pub struct CampaignCreated {
    pub campaign: Campaign,
    pub contact_stats: ContactStats,
    pub webhook: WebhookOutcome,
}

/// Failures before the webhook stage.
#[derive(Debug)]
pub enum CampaignError {
    /// Caller error: missing fields or no authenticated user.
    Rejected(HeraldError),
    /// The campaign row could not be created.
    CampaignInsert(HeraldError),
    /// The campaign exists but its contacts could not be stored.
    Contacts {
        campaign: Box<Campaign>,
        error: HeraldError,
    },
}

#[derive(Clone)]
pub struct CampaignService {
    store: Store,
    dispatcher: Arc<dyn Dispatcher>,
}

impl CampaignService {
    pub fn new(store: Store, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self { store, dispatcher }
    }

    pub async fn create(
        &self,
        tenant: &TenantContext,
        request: CreateCampaignRequest,
    ) -> Result<CampaignCreated, CampaignError> {
        let auth_user_id = tenant
            .require_user()
            .map_err(CampaignError::Rejected)?
            .to_string();
        let new_campaign = request.validate().map_err(CampaignError::Rejected)?;

        let campaign = self
            .store
            .create_campaign(tenant, &new_campaign)
            .await
            .map_err(|e| {
                error!("campaign: insert failed for {}: {e}", tenant.schema);
                CampaignError::CampaignInsert(e)
            })?;
        info!(
            "campaign: created {} '{}' for {}",
            campaign.id, campaign.name, tenant.schema
        );

        let submitted: Vec<NewContact> = request
            .contacts
            .into_iter()
            .filter_map(|c| c.into_new_contact())
            .collect();
        let (contacts, contact_stats) = match self.store.ensure_contacts(tenant, submitted).await {
            Ok(result) => result,
            Err(e) => {
                error!("campaign: contacts failed for {}: {e}", campaign.id);
                return Err(CampaignError::Contacts {
                    campaign: Box::new(campaign),
                    error: e,
                });
            }
        };
        info!(
            "campaign: {} contacts ({} new, {} existing)",
            contact_stats.total, contact_stats.new, contact_stats.existing
        );

        if !self.dispatcher.is_configured(WebhookTarget::Campaign) {
            warn!("campaign: webhook not configured, {} not dispatched", campaign.id);
            return Ok(CampaignCreated {
                campaign,
                contact_stats,
                webhook: WebhookOutcome::NotConfigured,
            });
        }

        let template_type = self.template_type(&campaign.template_name).await;
        let target = CampaignTarget {
            campaign_id: &campaign.id,
            template_name: &campaign.template_name,
            template_id: campaign.template_id.as_deref().unwrap_or(""),
            template_type: &template_type,
            mappings: &request.parameter_mappings,
            schema_name: tenant.schema_name(),
            auth_user_id: &auth_user_id,
        };
        let payload = match serde_json::to_value(CampaignDispatch::batch(&contacts, &target)) {
            Ok(v) => v,
            Err(e) => {
                return Ok(CampaignCreated {
                    campaign,
                    contact_stats,
                    webhook: WebhookOutcome::Failed {
                        error: format!("failed to encode payload: {e}"),
                        outbox_id: None,
                    },
                })
            }
        };
        debug!("campaign: dispatching {} entries", contacts.len());

        let webhook = match self
            .dispatcher
            .deliver(WebhookTarget::Campaign, &payload)
            .await
        {
            Ok(result) => WebhookOutcome::Delivered(result),
            Err(e) => {
                let error = e.to_string();
                warn!("campaign: webhook failed for {}: {error}", campaign.id);
                let outbox_id = match self
                    .store
                    .enqueue_outbox(
                        tenant,
                        WebhookTarget::Campaign,
                        Some(&campaign.id),
                        &payload,
                        &error,
                    )
                    .await
                {
                    Ok(entry) => Some(entry.id),
                    Err(e) => {
                        error!("campaign: could not save payload to outbox: {e}");
                        None
                    }
                };
                WebhookOutcome::Failed { error, outbox_id }
            }
        };

        Ok(CampaignCreated {
            campaign,
            contact_stats,
            webhook,
        })
    }

    /// The template's lowercased parameter format, or empty if the catalog
    /// is unavailable or does not list the template.
    async fn template_type(&self, template_name: &str) -> String {
        match self.dispatcher.fetch_templates().await {
            Ok(templates) => templates
                .iter()
                .find(|t| t.name == template_name)
                .map(|t| t.template_type())
                .unwrap_or_default(),
            Err(e) => {
                debug!("campaign: template catalog unavailable: {e}");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{tenant, test_store, MockDispatcher};
    use herald_core::tenant::{SchemaName, TenantContext};
    use serde_json::json;

    fn request(contacts: Value) -> CreateCampaignRequest {
        serde_json::from_value(json!({
            "name": "Spring sale",
            "template_name": "promo",
            "template_id": "tpl-promo",
            "contacts": contacts,
            "parameter_mappings": [{
                "placeholder": "{{first_name}}",
                "parameter_name": "first_name",
                "mapped_field": "name",
                "type": "text"
            }]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_dispatches_new_and_existing_contacts() {
        let store = test_store().await;
        let t = tenant("acme");
        store
            .insert_contacts(
                &t,
                &[NewContact {
                    lead_id: "lead_old".into(),
                    name: "Old".into(),
                    phone_number: "+15550000001".into(),
                    custom_fields: Default::default(),
                }],
            )
            .await
            .unwrap();

        let dispatcher = Arc::new(MockDispatcher::new());
        let sent = Arc::clone(&dispatcher.sent);
        let service = CampaignService::new(store.clone(), dispatcher);

        let created = service
            .create(
                &t,
                request(json!([
                    {"name": "Ann", "phone_number": "+15551234567"},
                    {"name": "Old again", "Phone": "+15550000001"},
                    {"name": "No phone"}
                ])),
            )
            .await
            .unwrap();

        assert_eq!(created.campaign.status.as_str(), "draft");
        assert_eq!(created.contact_stats.total, 2);
        assert_eq!(created.contact_stats.new, 1);
        assert_eq!(created.contact_stats.existing, 1);
        assert!(matches!(created.webhook, WebhookOutcome::Delivered(_)));

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (target, payload) = &sent[0];
        assert_eq!(*target, WebhookTarget::Campaign);
        let entries = payload.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["name"], "Ann");
        assert_eq!(entries[0]["template_type"], "named");
        assert_eq!(entries[0]["template_id"], "tpl-promo");
        assert_eq!(entries[0]["schema_name"], "acme");
        assert_eq!(entries[0]["auth_user_id"], "user-1");
        assert_eq!(entries[0]["campaign_id"], created.campaign.id.as_str());
        assert_eq!(entries[0]["template_params"][0]["text"], "Ann");
        assert_eq!(entries[1]["lead_id"], "lead_old");
        assert_eq!(entries[1]["template_params"][0]["text"], "Old");
    }

    #[tokio::test]
    async fn test_zero_contacts_still_posts_empty_array() {
        let store = test_store().await;
        let dispatcher = Arc::new(MockDispatcher::new());
        let sent = Arc::clone(&dispatcher.sent);
        let service = CampaignService::new(store.clone(), dispatcher);
        let t = tenant("acme");

        let created = service.create(&t, request(json!([]))).await.unwrap();
        assert_eq!(created.contact_stats.total, 0);
        assert_eq!(store.list_campaigns(&t).await.unwrap().len(), 1);
        assert_eq!(sent.lock().unwrap()[0].1, json!([]));
    }

    #[tokio::test]
    async fn test_webhook_failure_keeps_campaign_and_queues_payload() {
        let store = test_store().await;
        let service = CampaignService::new(store.clone(), Arc::new(MockDispatcher::failing()));
        let t = tenant("acme");

        let created = service
            .create(&t, request(json!([{"phone": "+15551234567"}])))
            .await
            .unwrap();

        let WebhookOutcome::Failed { error, outbox_id } = created.webhook else {
            panic!("expected webhook failure");
        };
        assert!(error.contains("502"));
        let outbox = store.list_outbox(&t).await.unwrap();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox_id.as_deref(), Some(outbox[0].id.as_str()));
        assert_eq!(outbox[0].campaign_id.as_deref(), Some(created.campaign.id.as_str()));
        assert_eq!(store.list_contacts(&t).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_webhook_not_configured() {
        let store = test_store().await;
        let service = CampaignService::new(store.clone(), Arc::new(MockDispatcher::unconfigured()));
        let created = service
            .create(&tenant("acme"), request(json!([{"phone": "+15551234567"}])))
            .await
            .unwrap();
        assert_eq!(created.webhook, WebhookOutcome::NotConfigured);
        assert_eq!(created.contact_stats.new, 1);
    }

    #[tokio::test]
    async fn test_requires_authenticated_user() {
        let store = test_store().await;
        let service = CampaignService::new(store.clone(), Arc::new(MockDispatcher::new()));
        let anon = TenantContext::new(SchemaName::parse("acme").unwrap());
        let err = service.create(&anon, request(json!([]))).await.unwrap_err();
        assert!(matches!(
            err,
            CampaignError::Rejected(HeraldError::Unauthorized(_))
        ));
        assert!(store.list_campaigns(&anon).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_contact_failure_reports_created_campaign() {
        let store = test_store().await;
        let service = CampaignService::new(store.clone(), Arc::new(MockDispatcher::new()));
        let t = tenant("acme");
        // Same lead id on two different phones violates the per-tenant unique key.
        let err = service
            .create(
                &t,
                request(json!([
                    {"phone": "+15550000001", "lead_id": "dup"},
                    {"phone": "+15550000002", "lead_id": "dup"}
                ])),
            )
            .await
            .unwrap_err();

        let CampaignError::Contacts { campaign, .. } = err else {
            panic!("expected contacts failure");
        };
        assert_eq!(store.get_campaign(&t, &campaign.id).await.unwrap().id, campaign.id);
        assert!(store.list_contacts(&t).await.unwrap().is_empty());
    }
}
