//! Service layer for the demand engine.
//!
//! Each module pairs its domain types with a storage trait, an in-memory
//! implementation for tests, and the service that owns the business rules.

pub mod availability;
pub mod lifecycle;
pub mod member;

pub use availability::{AvailabilityChecker, AvailabilityError};
pub use lifecycle::{
    Actor, CreateDemandInput, Demand, DemandFilter, DemandLifecycleService, DemandStore,
    InMemoryDemandStore, ListOptions, StatusUpdate,
};
pub use member::{InMemoryMemberStore, Member, MemberStore};
