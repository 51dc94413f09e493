//! Demand lifecycle and scheduling engine.
//!
//! This crate provides the core domain logic for service-request tickets
//! ("demands") routed to staff members inside an organizational unit:
//!
//! - A status state machine ([`StatusGraph`]) gated by role-based
//!   permissions ([`RolePermissionMatrix`], [`TransitionValidator`])
//! - An append-only audit trail of every transition ([`audit`])
//! - A scheduling-conflict checker enforcing working days and slot
//!   uniqueness ([`services::AvailabilityChecker`])
//! - A visibility filter restricting analysts to their own assigned work
//!   ([`VisibilityFilter`])
//! - The orchestrating [`services::DemandLifecycleService`]
//!
//! Persistence is a collaborator reached through the store traits
//! ([`services::DemandStore`], [`services::MemberStore`],
//! [`audit::AuditStore`]); in-memory implementations back the tests and a
//! PostgreSQL backend lives in the companion `demanda-db` crate.

pub mod audit;
pub mod error;
pub mod graph;
pub mod permissions;
pub mod services;
pub mod types;
pub mod validator;
pub mod visibility;

// Re-export commonly used types
pub use audit::{
    AuditRecordInput, AuditStore, AuditTrail, DemandAuditRecord, InMemoryAuditStore,
    DEFAULT_ACTOR_HISTORY_LIMIT, SYSTEM_ACTOR_NAME,
};
pub use error::{DemandError, Result};
pub use graph::StatusGraph;
pub use permissions::{RolePermissionMatrix, RoleRule};
pub use services::{
    Actor, AvailabilityChecker, AvailabilityError, CreateDemandInput, Demand, DemandFilter,
    DemandLifecycleService, DemandStore, InMemoryDemandStore, InMemoryMemberStore, ListOptions,
    Member, MemberStore, StatusUpdate,
};
pub use types::{DemandId, DemandPriority, DemandStatus, MemberId, OrgRole, Weekday};
pub use validator::{TransitionError, TransitionValidator};
pub use visibility::VisibilityFilter;
