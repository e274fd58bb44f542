use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::dto::audit_dto::{AuditFilter, AuditPage, PageRequest};
use crate::error::Result;
use crate::models::audit_log::{AuditDraft, AuditEntry};
use crate::store::AuditStore;
use crate::utils::time;

/// Immutable log of every mutating action. Writes never block or fail
/// the mutation they describe; retention is enforced at the store.
#[derive(Clone)]
pub struct AuditService {
    store: Arc<dyn AuditStore>,
    retention_days: i64,
}

impl AuditService {
    pub fn new(store: Arc<dyn AuditStore>, retention_days: i64) -> Self {
        Self {
            store,
            retention_days,
        }
    }

    /// Record one entry. A draft missing its actor, action, or resource
    /// is dropped with a log line; store failures are dropped the same
    /// way. This function never returns an error.
    pub async fn record(&self, draft: AuditDraft) {
        let (Some(actor_id), Some(action), Some(resource_id)) =
            (draft.actor_id, draft.action, draft.resource_id)
        else {
            tracing::warn!(
                resource_type = %draft.resource_type,
                "malformed audit draft dropped"
            );
            return;
        };
        if draft.resource_type.trim().is_empty() {
            tracing::warn!(action = %action, "audit draft without resource type dropped");
            return;
        }

        let entry = AuditEntry {
            id: Uuid::new_v4(),
            actor_id,
            action,
            resource_type: draft.resource_type,
            resource_id,
            detail: draft.detail,
            severity: draft.severity,
            outcome: draft.outcome,
            created_at: time::now(),
        };
        if let Err(err) = self.store.insert_entry(entry).await {
            tracing::warn!(error = %err, action = %action, "audit write dropped");
        }
    }

    /// Dispatch the write off the caller's critical path.
    pub fn record_detached(&self, draft: AuditDraft) {
        let service = self.clone();
        tokio::spawn(async move {
            service.record(draft).await;
        });
    }

    pub async fn query(&self, filter: AuditFilter, page: PageRequest) -> Result<AuditPage> {
        let (page_no, per_page, _) = page.normalize();
        let (items, total) = self.store.query_entries(&filter, &page).await?;
        Ok(AuditPage {
            items,
            total,
            page: page_no,
            per_page,
        })
    }

    /// Delete entries older than the retention window. Returns the count
    /// removed; meant to be driven by a periodic worker.
    pub async fn run_retention_once(&self) -> Result<u64> {
        let cutoff = time::now() - Duration::days(self.retention_days);
        let removed = self.store.purge_expired(cutoff).await?;
        if removed > 0 {
            tracing::info!(removed, "expired audit entries purged");
        }
        Ok(removed)
    }
}
