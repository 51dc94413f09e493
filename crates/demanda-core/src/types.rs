//! Type definitions for the demand domain.
//!
//! Includes newtype wrappers for IDs and enums for domain values.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ID Types (Newtype Pattern)
// ============================================================================

/// Unique identifier for a demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct DemandId(pub Uuid);

impl DemandId {
    /// Create a new random DemandId.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    #[must_use]
    pub fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for DemandId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DemandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for DemandId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<DemandId> for Uuid {
    fn from(id: DemandId) -> Self {
        id.0
    }
}

/// Unique identifier for a member (a user's role-scoped identity in one unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct MemberId(pub Uuid);

impl MemberId {
    /// Create a new random MemberId.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    #[must_use]
    pub fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for MemberId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<MemberId> for Uuid {
    fn from(id: MemberId) -> Self {
        id.0
    }
}

// ============================================================================
// Domain Enums
// ============================================================================

/// Lifecycle status of a demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "demand_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DemandStatus {
    /// Newly created, not yet picked up.
    Pending,
    /// Applicant has checked in and is waiting.
    CheckIn,
    /// A staff member is actively working the demand.
    InProgress,
    /// Work is complete.
    Resolved,
    /// Demand was rejected (terminal).
    Rejected,
    /// Resolved work has been billed (terminal).
    Billed,
}

impl DemandStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::CheckIn,
        Self::InProgress,
        Self::Resolved,
        Self::Rejected,
        Self::Billed,
    ];

    /// Whether this status admits no further transitions.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Billed)
    }

    /// The wire/storage token for this status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::CheckIn => "CHECK_IN",
            Self::InProgress => "IN_PROGRESS",
            Self::Resolved => "RESOLVED",
            Self::Rejected => "REJECTED",
            Self::Billed => "BILLED",
        }
    }
}

impl fmt::Display for DemandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role a member holds inside an organization or unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "org_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrgRole {
    /// Full control over demand movement.
    Admin,
    /// Read-only oversight; never moves demands.
    Manager,
    /// Front-desk handling of incoming demands.
    Clerk,
    /// Works only demands assigned to them.
    Analyst,
    /// Moves resolved demands into billing.
    Billing,
}

impl OrgRole {
    /// Every role.
    pub const ALL: [Self; 5] = [
        Self::Admin,
        Self::Manager,
        Self::Clerk,
        Self::Analyst,
        Self::Billing,
    ];

    /// The wire/storage token for this role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Manager => "MANAGER",
            Self::Clerk => "CLERK",
            Self::Analyst => "ANALYST",
            Self::Billing => "BILLING",
        }
    }
}

impl fmt::Display for OrgRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority of a demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "demand_priority", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DemandPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Default for DemandPriority {
    fn default() -> Self {
        Self::Medium
    }
}

impl fmt::Display for DemandPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Urgent => "URGENT",
        };
        f.write_str(token)
    }
}

/// Weekday token used for member working-day configuration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Weekday {
    Segunda,
    Terca,
    Quarta,
    Quinta,
    Sexta,
    Sabado,
    Domingo,
}

impl Weekday {
    /// The weekday token for a calendar date.
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        chrono::Datelike::weekday(&date).into()
    }

    /// The storage token for this weekday.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Segunda => "SEGUNDA",
            Self::Terca => "TERCA",
            Self::Quarta => "QUARTA",
            Self::Quinta => "QUINTA",
            Self::Sexta => "SEXTA",
            Self::Sabado => "SABADO",
            Self::Domingo => "DOMINGO",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Self::Segunda,
            chrono::Weekday::Tue => Self::Terca,
            chrono::Weekday::Wed => Self::Quarta,
            chrono::Weekday::Thu => Self::Quinta,
            chrono::Weekday::Fri => Self::Sexta,
            chrono::Weekday::Sat => Self::Sabado,
            chrono::Weekday::Sun => Self::Domingo,
        }
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SEGUNDA" => Ok(Self::Segunda),
            "TERCA" => Ok(Self::Terca),
            "QUARTA" => Ok(Self::Quarta),
            "QUINTA" => Ok(Self::Quinta),
            "SEXTA" => Ok(Self::Sexta),
            "SABADO" => Ok(Self::Sabado),
            "DOMINGO" => Ok(Self::Domingo),
            other => Err(format!("unknown weekday token: {other}")),
        }
    }
}
