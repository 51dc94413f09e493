//! Demand lifecycle orchestration.
//!
//! The service composes the transition validator, availability checker,
//! visibility filter and audit trail in the order the lifecycle rules
//! require. Persistence is reached through the [`DemandStore`] trait;
//! [`InMemoryDemandStore`] backs the integration tests.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::audit::{AuditRecordInput, AuditStore, AuditTrail, DemandAuditRecord};
use crate::error::{DemandError, Result};
use crate::services::availability::AvailabilityChecker;
use crate::services::member::MemberStore;
use crate::types::{DemandId, DemandPriority, DemandStatus, MemberId, OrgRole};
use crate::validator::TransitionValidator;
use crate::visibility::VisibilityFilter;

// ============================================================================
// Domain Types
// ============================================================================

/// A unit of requested service work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Demand {
    /// Unique identifier.
    pub id: DemandId,
    /// The organizational unit this demand belongs to.
    pub unit_id: Uuid,
    /// The applicant who raised the demand.
    pub applicant_id: Uuid,
    /// Short title.
    pub title: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Current lifecycle status.
    pub status: DemandStatus,
    /// Priority classification.
    pub priority: DemandPriority,
    /// Free-text category.
    pub category: Option<String>,
    /// Booked calendar date, when assigned.
    pub scheduled_date: Option<NaiveDate>,
    /// Booked time of day, when assigned.
    pub scheduled_time: Option<NaiveTime>,
    /// The staff member responsible, when assigned.
    pub responsible_member_id: Option<MemberId>,
    /// When created.
    pub created_at: DateTime<Utc>,
    /// When last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDemandInput {
    /// The organizational unit the demand belongs to.
    pub unit_id: Uuid,
    /// The applicant raising the demand.
    pub applicant_id: Uuid,
    /// Short title.
    pub title: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Priority classification.
    #[serde(default)]
    pub priority: DemandPriority,
    /// Free-text category.
    pub category: Option<String>,
    /// Responsible member, when booking at creation.
    pub responsible_member_id: Option<MemberId>,
    /// Booked date, when booking at creation.
    pub scheduled_date: Option<NaiveDate>,
    /// Booked time, when booking at creation.
    pub scheduled_time: Option<NaiveTime>,
}

/// Filter options for listing demands.
#[derive(Debug, Clone, Default)]
pub struct DemandFilter {
    /// Filter by status.
    pub status: Option<DemandStatus>,
    /// Filter by priority.
    pub priority: Option<DemandPriority>,
    /// Filter by category.
    pub category: Option<String>,
    /// Filter by responsible member.
    pub responsible_member_id: Option<MemberId>,
    /// Filter by booked date.
    pub scheduled_date: Option<NaiveDate>,
}

/// Options for list operations.
#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Maximum number of results.
    pub limit: i64,
    /// Number of results to skip.
    pub offset: i64,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
        }
    }
}

/// The authenticated identity performing an operation.
#[derive(Debug, Clone)]
pub struct Actor {
    /// The user behind the request.
    pub user_id: Uuid,
    /// The actor's member identity in the demand's unit, when they have one.
    pub member_id: Option<MemberId>,
    /// Display name captured into audit records.
    pub display_name: Option<String>,
    /// Effective role for the demand's unit (unit role over organization role).
    pub role: OrgRole,
}

/// Result of a successful status update.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    /// The demand after the update.
    pub demand: Demand,
    /// The audit record written with it; `None` for a no-op self-transition.
    pub audit_record: Option<DemandAuditRecord>,
}

// ============================================================================
// Store Trait
// ============================================================================

/// Trait for demand storage backends.
#[async_trait::async_trait]
pub trait DemandStore: Send + Sync {
    /// Get a demand by ID.
    async fn get(&self, id: DemandId) -> Result<Option<Demand>>;

    /// Insert a new demand at `PENDING`.
    async fn insert(&self, input: CreateDemandInput) -> Result<Demand>;

    /// List demands in a unit with filtering and pagination, newest first.
    async fn list(
        &self,
        unit_id: Uuid,
        filter: &DemandFilter,
        options: &ListOptions,
    ) -> Result<Vec<Demand>>;

    /// Set the assignment fields of a demand. Returns `None` when the demand
    /// does not exist. Implementations must re-enforce slot uniqueness
    /// atomically with the write (the availability pre-check alone cannot
    /// exclude a concurrent booking).
    async fn assign(
        &self,
        id: DemandId,
        member_id: MemberId,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Option<Demand>>;

    /// Persist a status change together with its audit record; both are
    /// committed atomically or not at all. Returns `None` when the demand
    /// does not exist.
    async fn update_status(
        &self,
        id: DemandId,
        new_status: DemandStatus,
        audit_record: Option<DemandAuditRecord>,
    ) -> Result<Option<Demand>>;

    /// A non-terminal demand occupying `(member, date, time)`, excluding
    /// `exclude` when reassigning.
    async fn find_slot_conflict(
        &self,
        member_id: MemberId,
        date: NaiveDate,
        time: NaiveTime,
        exclude: Option<DemandId>,
    ) -> Result<Option<DemandId>>;
}

// ============================================================================
// In-Memory Store (for testing)
// ============================================================================

/// In-memory demand store for testing.
#[derive(Default)]
pub struct InMemoryDemandStore {
    demands: Arc<RwLock<HashMap<DemandId, Demand>>>,
    audit_sink: Option<Arc<dyn AuditStore>>,
}

impl InMemoryDemandStore {
    /// Create a new in-memory store without an audit sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that appends audit records to `audit_sink` as part of
    /// [`DemandStore::update_status`], mirroring the single-transaction
    /// behavior of a relational backend.
    #[must_use]
    pub fn with_audit_sink(audit_sink: Arc<dyn AuditStore>) -> Self {
        Self {
            demands: Arc::new(RwLock::new(HashMap::new())),
            audit_sink: Some(audit_sink),
        }
    }

    /// Clear all demands.
    pub async fn clear(&self) {
        self.demands.write().await.clear();
    }
}

#[async_trait::async_trait]
impl DemandStore for InMemoryDemandStore {
    async fn get(&self, id: DemandId) -> Result<Option<Demand>> {
        Ok(self.demands.read().await.get(&id).cloned())
    }

    async fn insert(&self, input: CreateDemandInput) -> Result<Demand> {
        let now = Utc::now();
        let demand = Demand {
            id: DemandId::new(),
            unit_id: input.unit_id,
            applicant_id: input.applicant_id,
            title: input.title,
            description: input.description,
            status: DemandStatus::Pending,
            priority: input.priority,
            category: input.category,
            scheduled_date: input.scheduled_date,
            scheduled_time: input.scheduled_time,
            responsible_member_id: input.responsible_member_id,
            created_at: now,
            updated_at: now,
        };
        self.demands.write().await.insert(demand.id, demand.clone());
        Ok(demand)
    }

    async fn list(
        &self,
        unit_id: Uuid,
        filter: &DemandFilter,
        options: &ListOptions,
    ) -> Result<Vec<Demand>> {
        let demands = self.demands.read().await;
        let mut results: Vec<_> = demands
            .values()
            .filter(|d| d.unit_id == unit_id)
            .filter(|d| filter.status.is_none_or(|s| d.status == s))
            .filter(|d| filter.priority.is_none_or(|p| d.priority == p))
            .filter(|d| {
                filter
                    .category
                    .as_ref()
                    .is_none_or(|c| d.category.as_deref() == Some(c.as_str()))
            })
            .filter(|d| {
                filter
                    .responsible_member_id
                    .is_none_or(|m| d.responsible_member_id == Some(m))
            })
            .filter(|d| {
                filter
                    .scheduled_date
                    .is_none_or(|date| d.scheduled_date == Some(date))
            })
            .cloned()
            .collect();

        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(results
            .into_iter()
            .skip(options.offset.max(0) as usize)
            .take(options.limit.max(0) as usize)
            .collect())
    }

    async fn assign(
        &self,
        id: DemandId,
        member_id: MemberId,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Option<Demand>> {
        let mut demands = self.demands.write().await;

        // Re-check the slot under the write lock; the checker's earlier read
        // may be stale by now.
        let conflict = demands.values().any(|d| {
            d.id != id
                && d.responsible_member_id == Some(member_id)
                && d.scheduled_date == Some(date)
                && d.scheduled_time == Some(time)
                && !d.status.is_terminal()
        });
        if conflict {
            return Err(crate::services::availability::AvailabilityError::SlotAlreadyBooked {
                member_id,
                date,
                time,
            }
            .into());
        }

        if let Some(demand) = demands.get_mut(&id) {
            demand.responsible_member_id = Some(member_id);
            demand.scheduled_date = Some(date);
            demand.scheduled_time = Some(time);
            demand.updated_at = Utc::now();
            Ok(Some(demand.clone()))
        } else {
            Ok(None)
        }
    }

    async fn update_status(
        &self,
        id: DemandId,
        new_status: DemandStatus,
        audit_record: Option<DemandAuditRecord>,
    ) -> Result<Option<Demand>> {
        let mut demands = self.demands.write().await;

        let Some(demand) = demands.get_mut(&id) else {
            return Ok(None);
        };
        demand.status = new_status;
        demand.updated_at = Utc::now();
        let updated = demand.clone();
        drop(demands);

        if let (Some(record), Some(sink)) = (audit_record, self.audit_sink.as_ref()) {
            sink.append(record).await?;
        }
        Ok(Some(updated))
    }

    async fn find_slot_conflict(
        &self,
        member_id: MemberId,
        date: NaiveDate,
        time: NaiveTime,
        exclude: Option<DemandId>,
    ) -> Result<Option<DemandId>> {
        let demands = self.demands.read().await;
        Ok(demands
            .values()
            .find(|d| {
                Some(d.id) != exclude
                    && d.responsible_member_id == Some(member_id)
                    && d.scheduled_date == Some(date)
                    && d.scheduled_time == Some(time)
                    && !d.status.is_terminal()
            })
            .map(|d| d.id))
    }
}

// ============================================================================
// Service
// ============================================================================

/// Orchestrates demand creation, assignment and status transitions.
#[derive(Clone)]
pub struct DemandLifecycleService {
    demands: Arc<dyn DemandStore>,
    validator: Arc<TransitionValidator>,
    availability: AvailabilityChecker,
    audit: AuditTrail,
}

impl DemandLifecycleService {
    /// Create a new lifecycle service.
    pub fn new(
        demands: Arc<dyn DemandStore>,
        members: Arc<dyn MemberStore>,
        audit_store: Arc<dyn AuditStore>,
        validator: TransitionValidator,
    ) -> Self {
        let availability = AvailabilityChecker::new(members, demands.clone());
        Self {
            demands,
            validator: Arc::new(validator),
            availability,
            audit: AuditTrail::new(audit_store),
        }
    }

    /// The audit trail behind this service, for history queries.
    #[must_use]
    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    /// Create a demand at `PENDING`.
    ///
    /// When the assignment triple (member, date, time) is supplied at
    /// creation, availability is checked first and the whole creation is
    /// aborted on failure.
    pub async fn create_demand(
        &self,
        input: CreateDemandInput,
        actor_user_id: Uuid,
    ) -> Result<Demand> {
        if input.title.trim().is_empty() {
            return Err(DemandError::Validation("title must not be empty".into()));
        }

        let booking = match (
            input.responsible_member_id,
            input.scheduled_date,
            input.scheduled_time,
        ) {
            (Some(member_id), Some(date), Some(time)) => Some((member_id, date, time)),
            (None, None, None) => None,
            _ => {
                return Err(DemandError::Validation(
                    "responsible member, scheduled date and scheduled time must be supplied together"
                        .into(),
                ))
            }
        };

        if let Some((member_id, date, time)) = booking {
            self.availability.check(member_id, date, time, None).await?;
        }

        let demand = self.demands.insert(input).await?;
        tracing::info!(
            demand_id = %demand.id,
            unit_id = %demand.unit_id,
            actor_user_id = %actor_user_id,
            "demand created"
        );
        Ok(demand)
    }

    /// Book a member for a demand. Does not change the demand's status.
    pub async fn assign_member(
        &self,
        demand_id: DemandId,
        member_id: MemberId,
        date: NaiveDate,
        time: NaiveTime,
        actor: &Actor,
    ) -> Result<Demand> {
        let demand = self
            .demands
            .get(demand_id)
            .await?
            .ok_or(DemandError::NotFound("demand"))?;
        self.ensure_actor_may_touch(actor, &demand)?;

        self.availability
            .check(member_id, date, time, Some(demand_id))
            .await?;

        let updated = self
            .demands
            .assign(demand_id, member_id, date, time)
            .await?
            .ok_or(DemandError::NotFound("demand"))?;

        tracing::info!(
            demand_id = %demand_id,
            member_id = %member_id,
            %date,
            %time,
            "member assigned to demand"
        );
        Ok(updated)
    }

    /// Move a demand to `new_status`, writing the audit record atomically
    /// with the status change.
    ///
    /// The ANALYST ownership rule and the role/status transition rule are
    /// independent prerequisites; either failing aborts with no write. A
    /// self-transition succeeds without writing anything.
    pub async fn update_status(
        &self,
        demand_id: DemandId,
        new_status: DemandStatus,
        actor: &Actor,
        reason: Option<String>,
    ) -> Result<StatusUpdate> {
        let demand = self
            .demands
            .get(demand_id)
            .await?
            .ok_or(DemandError::NotFound("demand"))?;
        self.ensure_actor_may_touch(actor, &demand)?;

        self.validator.validate(actor.role, demand.status, new_status)?;

        if demand.status == new_status {
            return Ok(StatusUpdate {
                demand,
                audit_record: None,
            });
        }

        let audit_record = self.audit.prepare(AuditRecordInput {
            demand_id,
            previous_status: demand.status,
            new_status,
            changed_by_user_id: actor.user_id,
            changed_by_member_id: actor.member_id,
            changed_by_user_name: actor.display_name.clone(),
            changed_by_role: actor.role,
            reason,
            metadata: None,
        });

        let updated = self
            .demands
            .update_status(demand_id, new_status, audit_record.clone())
            .await?
            .ok_or(DemandError::NotFound("demand"))?;

        tracing::info!(
            demand_id = %demand_id,
            previous_status = %demand.status,
            new_status = %new_status,
            actor_user_id = %actor.user_id,
            role = %actor.role,
            "demand status updated"
        );
        Ok(StatusUpdate {
            demand: updated,
            audit_record,
        })
    }

    /// List demands in a unit, narrowed to what the actor may see.
    pub async fn list_demands(
        &self,
        unit_id: Uuid,
        filter: DemandFilter,
        options: &ListOptions,
        actor: &Actor,
    ) -> Result<Vec<Demand>> {
        let scoped = if actor.role == OrgRole::Analyst {
            let member_id = actor.member_id.ok_or_else(|| {
                DemandError::Forbidden("analyst actor has no member identity".into())
            })?;
            VisibilityFilter::scope_filter(actor.role, member_id, filter)
        } else {
            filter
        };
        self.demands.list(unit_id, &scoped, options).await
    }

    /// Fetch one demand. An ANALYST asking for a demand not assigned to them
    /// is refused, not told it does not exist.
    pub async fn get_demand(&self, demand_id: DemandId, actor: &Actor) -> Result<Demand> {
        let demand = self
            .demands
            .get(demand_id)
            .await?
            .ok_or(DemandError::NotFound("demand"))?;
        if !VisibilityFilter::can_view(actor.role, actor.member_id, &demand) {
            tracing::warn!(
                demand_id = %demand_id,
                actor_user_id = %actor.user_id,
                "analyst denied access to demand not assigned to them"
            );
            return Err(DemandError::Forbidden(
                "analysts may only view demands assigned to them".into(),
            ));
        }
        Ok(demand)
    }

    fn ensure_actor_may_touch(&self, actor: &Actor, demand: &Demand) -> Result<()> {
        if !VisibilityFilter::can_view(actor.role, actor.member_id, demand) {
            return Err(DemandError::Forbidden(
                "analysts may only act on demands assigned to them".into(),
            ));
        }
        Ok(())
    }
}
