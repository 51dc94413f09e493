//! Member row model and queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use sqlx::FromRow;
use uuid::Uuid;

use demanda_core::{DemandError, Member, MemberId, OrgRole, Weekday};

/// One row of the `members` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MemberRow {
    pub id: MemberId,
    pub user_id: Uuid,
    pub unit_id: Uuid,
    pub display_name: String,
    pub organization_role: OrgRole,
    pub unit_role: Option<OrgRole>,
    pub working_days: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MemberRow {
    /// Find a member by ID.
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: MemberId,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }
}

impl TryFrom<MemberRow> for Member {
    type Error = DemandError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        let working_days = row
            .working_days
            .iter()
            .map(|token| token.parse::<Weekday>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| {
                DemandError::Internal(format!("member {} has {err}", row.id))
            })?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            unit_id: row.unit_id,
            display_name: row.display_name,
            organization_role: row.organization_role,
            unit_role: row.unit_role,
            working_days,
        })
    }
}
