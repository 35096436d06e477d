//! Redelivery of campaign webhooks that failed at submission time.

use herald_core::{tenant::SchemaName, traits::Dispatcher};
use herald_store::Store;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Entries examined per drain pass.
const DRAIN_BATCH: i64 = 50;

/// How long a claimed entry stays reserved for one drainer.
const CLAIM_LEASE: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainSummary {
    pub delivered: usize,
    /// Failed again but still pending.
    pub retrying: usize,
    /// Reached the attempt limit on this pass.
    pub exhausted: usize,
}

/// Retry pending outbox entries once. `schema` restricts the pass to one
/// tenant.
pub async fn drain_once(
    store: &Store,
    dispatcher: &dyn Dispatcher,
    schema: Option<&SchemaName>,
    max_attempts: u32,
) -> Result<DrainSummary, herald_core::error::HeraldError> {
    let mut summary = DrainSummary::default();
    let entries = store.pending_outbox(schema, DRAIN_BATCH).await?;

    for entry in &entries {
        if !store.claim_outbox(&entry.id, CLAIM_LEASE).await? {
            debug!("outbox: {} claimed elsewhere, skipping", entry.id);
            continue;
        }
        match dispatcher.deliver(entry.target, &entry.payload).await {
            Ok(_) => {
                store.mark_outbox_delivered(&entry.id).await?;
                info!(
                    "outbox: delivered {} ({}) after {} attempt(s)",
                    entry.id,
                    entry.schema_name,
                    entry.attempts + 1
                );
                summary.delivered += 1;
            }
            Err(e) => {
                let still_pending = store
                    .fail_outbox(&entry.id, &e.to_string(), max_attempts)
                    .await?;
                if still_pending {
                    warn!("outbox: {} failed again: {e}", entry.id);
                    summary.retrying += 1;
                } else {
                    error!("outbox: {} gave up after {max_attempts} attempts: {e}", entry.id);
                    summary.exhausted += 1;
                }
            }
        }
    }
    Ok(summary)
}

/// Background task: drain the outbox every `poll_secs`.
pub async fn outbox_loop(
    store: Store,
    dispatcher: Arc<dyn Dispatcher>,
    poll_secs: u64,
    max_attempts: u32,
) {
    loop {
        tokio::time::sleep(Duration::from_secs(poll_secs.max(1))).await;

        match drain_once(&store, dispatcher.as_ref(), None, max_attempts).await {
            Ok(s) if s.delivered + s.retrying + s.exhausted > 0 => {
                info!(
                    "outbox: pass done ({} delivered, {} retrying, {} exhausted)",
                    s.delivered, s.retrying, s.exhausted
                );
            }
            Ok(_) => {}
            Err(e) => error!("outbox: failed to drain: {e}"),
        }
    }
}
