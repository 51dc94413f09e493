//! Row models for the demand engine tables.

pub mod demand;
pub mod demand_audit;
pub mod member;

pub use demand::DemandRow;
pub use demand_audit::DemandAuditRow;
pub use member::MemberRow;
