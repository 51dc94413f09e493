//! Append-only audit trail for demand status transitions.
//!
//! Every accepted transition produces exactly one immutable record; a
//! self-transition produces none. Storage is pluggable through the
//! [`AuditStore`] trait, with [`InMemoryAuditStore`] provided for tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{DemandId, DemandStatus, MemberId, OrgRole};

/// Actor display name recorded when no name is supplied.
pub const SYSTEM_ACTOR_NAME: &str = "Sistema";

/// Default limit for per-actor history queries.
pub const DEFAULT_ACTOR_HISTORY_LIMIT: i64 = 50;

/// One immutable record of a demand status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandAuditRecord {
    /// Unique identifier for the record.
    pub id: Uuid,
    /// The demand that changed.
    pub demand_id: DemandId,
    /// Status before the change.
    pub previous_status: DemandStatus,
    /// Status after the change.
    pub new_status: DemandStatus,
    /// User who performed the change.
    pub changed_by_user_id: Uuid,
    /// The actor's member identity, when acting inside a unit.
    pub changed_by_member_id: Option<MemberId>,
    /// Actor display name at the time of the change.
    pub changed_by_user_name: String,
    /// The actor's effective role at the time of the change.
    pub changed_by_role: OrgRole,
    /// Optional free-text justification.
    pub reason: Option<String>,
    /// Structured key-value context; serialized only at the storage boundary.
    pub metadata: Option<serde_json::Value>,
    /// When the change happened.
    pub changed_at: DateTime<Utc>,
}

/// Input for recording a status change.
#[derive(Debug, Clone)]
pub struct AuditRecordInput {
    /// The demand that changed.
    pub demand_id: DemandId,
    /// Status before the change.
    pub previous_status: DemandStatus,
    /// Status after the change.
    pub new_status: DemandStatus,
    /// User who performed the change.
    pub changed_by_user_id: Uuid,
    /// The actor's member identity, when acting inside a unit.
    pub changed_by_member_id: Option<MemberId>,
    /// Actor display name; defaults to [`SYSTEM_ACTOR_NAME`] when absent.
    pub changed_by_user_name: Option<String>,
    /// The actor's effective role.
    pub changed_by_role: OrgRole,
    /// Optional free-text justification.
    pub reason: Option<String>,
    /// Structured key-value context.
    pub metadata: Option<serde_json::Value>,
}

/// Trait for audit record storage backends.
///
/// Implementations must treat records as append-only: no update, no delete.
#[async_trait::async_trait]
pub trait AuditStore: Send + Sync {
    /// Append one record. Insertion failures propagate unchanged.
    async fn append(&self, record: DemandAuditRecord) -> Result<DemandAuditRecord>;

    /// All records for a demand, ordered by `changed_at` descending.
    async fn history_for_demand(&self, demand_id: DemandId) -> Result<Vec<DemandAuditRecord>>;

    /// Records produced by one actor, `changed_at` descending, at most `limit`.
    async fn history_for_actor(&self, user_id: Uuid, limit: i64)
        -> Result<Vec<DemandAuditRecord>>;
}

/// In-memory audit store for testing.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    records: Arc<RwLock<Vec<DemandAuditRecord>>>,
}

impl InMemoryAuditStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in the store.
    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }

    /// All records in insertion order (for assertions).
    pub async fn get_all(&self) -> Vec<DemandAuditRecord> {
        self.records.read().await.clone()
    }

    /// Clear all records.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

fn sorted_desc(mut records: Vec<DemandAuditRecord>) -> Vec<DemandAuditRecord> {
    records.sort_by(|a, b| b.changed_at.cmp(&a.changed_at));
    records
}

#[async_trait::async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, record: DemandAuditRecord) -> Result<DemandAuditRecord> {
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn history_for_demand(&self, demand_id: DemandId) -> Result<Vec<DemandAuditRecord>> {
        let records = self.records.read().await;
        Ok(sorted_desc(
            records
                .iter()
                .filter(|r| r.demand_id == demand_id)
                .cloned()
                .collect(),
        ))
    }

    async fn history_for_actor(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<DemandAuditRecord>> {
        let records = self.records.read().await;
        let matching = sorted_desc(
            records
                .iter()
                .filter(|r| r.changed_by_user_id == user_id)
                .cloned()
                .collect(),
        );
        Ok(matching.into_iter().take(limit.max(0) as usize).collect())
    }
}

/// Service wrapping an [`AuditStore`] with the recording rules.
#[derive(Clone)]
pub struct AuditTrail {
    store: Arc<dyn AuditStore>,
}

impl AuditTrail {
    /// Create a new audit trail over a storage backend.
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Build the normalized record for an input, without writing it.
    ///
    /// Returns `None` when `previous_status == new_status`: an effective
    /// no-op never produces a record. The lifecycle service uses this to
    /// hand the record to the demand store so status update and audit insert
    /// commit atomically.
    #[must_use]
    pub fn prepare(&self, input: AuditRecordInput) -> Option<DemandAuditRecord> {
        if input.previous_status == input.new_status {
            return None;
        }
        Some(DemandAuditRecord {
            id: Uuid::new_v4(),
            demand_id: input.demand_id,
            previous_status: input.previous_status,
            new_status: input.new_status,
            changed_by_user_id: input.changed_by_user_id,
            changed_by_member_id: input.changed_by_member_id,
            changed_by_user_name: input
                .changed_by_user_name
                .unwrap_or_else(|| SYSTEM_ACTOR_NAME.to_string()),
            changed_by_role: input.changed_by_role,
            reason: input.reason,
            metadata: input.metadata,
            changed_at: Utc::now(),
        })
    }

    /// Record one status change; returns `None` (writing nothing) when the
    /// input describes a no-op transition.
    pub async fn record(&self, input: AuditRecordInput) -> Result<Option<DemandAuditRecord>> {
        match self.prepare(input) {
            Some(record) => Ok(Some(self.store.append(record).await?)),
            None => Ok(None),
        }
    }

    /// Ordered history for one demand, newest first.
    pub async fn history_for_demand(
        &self,
        demand_id: DemandId,
    ) -> Result<Vec<DemandAuditRecord>> {
        self.store.history_for_demand(demand_id).await
    }

    /// Ordered history for one actor, newest first, bounded by `limit`
    /// (default [`DEFAULT_ACTOR_HISTORY_LIMIT`]).
    pub async fn history_for_actor(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<DemandAuditRecord>> {
        self.store
            .history_for_actor(user_id, limit.unwrap_or(DEFAULT_ACTOR_HISTORY_LIMIT))
            .await
    }
}
