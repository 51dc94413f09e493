//! Member identities and their store.
//!
//! Members are created and managed by an out-of-scope CRUD surface; the
//! engine only reads them for role resolution and working-day checks.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{MemberId, OrgRole, Weekday};

/// A user's role-bound identity inside one organization/unit pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Unique identifier.
    pub id: MemberId,
    /// The user behind this membership.
    pub user_id: Uuid,
    /// The unit this membership is scoped to.
    pub unit_id: Uuid,
    /// Display name, captured into audit records.
    pub display_name: String,
    /// Role at the organization level.
    pub organization_role: OrgRole,
    /// Unit-level role; overrides the organization role when present.
    pub unit_role: Option<OrgRole>,
    /// Weekdays the member may be booked. Empty means every day.
    pub working_days: Vec<Weekday>,
}

impl Member {
    /// The role used for unit-scoped permission checks.
    #[must_use]
    pub fn effective_role(&self) -> OrgRole {
        self.unit_role.unwrap_or(self.organization_role)
    }

    /// Whether the member may be booked on `day`.
    #[must_use]
    pub fn works_on(&self, day: Weekday) -> bool {
        self.working_days.is_empty() || self.working_days.contains(&day)
    }
}

/// Trait for member storage backends.
#[async_trait::async_trait]
pub trait MemberStore: Send + Sync {
    /// Get a member by ID.
    async fn get(&self, id: MemberId) -> Result<Option<Member>>;
}

/// In-memory member store for testing.
#[derive(Debug, Default)]
pub struct InMemoryMemberStore {
    members: Arc<RwLock<HashMap<MemberId, Member>>>,
}

impl InMemoryMemberStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a member.
    pub async fn insert(&self, member: Member) {
        self.members.write().await.insert(member.id, member);
    }
}

#[async_trait::async_trait]
impl MemberStore for InMemoryMemberStore {
    async fn get(&self, id: MemberId) -> Result<Option<Member>> {
        Ok(self.members.read().await.get(&id).cloned())
    }
}
