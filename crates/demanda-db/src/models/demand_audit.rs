//! Audit record row model and queries.
//!
//! Rows are append-only: no update or delete statements exist here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use sqlx::FromRow;
use uuid::Uuid;

use demanda_core::{DemandAuditRecord, DemandId, DemandStatus, MemberId, OrgRole};

/// One row of the `demand_audit_records` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DemandAuditRow {
    pub id: Uuid,
    pub demand_id: DemandId,
    pub previous_status: DemandStatus,
    pub new_status: DemandStatus,
    pub changed_by_user_id: Uuid,
    pub changed_by_member_id: Option<MemberId>,
    pub changed_by_user_name: String,
    pub changed_by_role: OrgRole,
    pub reason: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub changed_at: DateTime<Utc>,
}

impl From<DemandAuditRow> for DemandAuditRecord {
    fn from(row: DemandAuditRow) -> Self {
        Self {
            id: row.id,
            demand_id: row.demand_id,
            previous_status: row.previous_status,
            new_status: row.new_status,
            changed_by_user_id: row.changed_by_user_id,
            changed_by_member_id: row.changed_by_member_id,
            changed_by_user_name: row.changed_by_user_name,
            changed_by_role: row.changed_by_role,
            reason: row.reason,
            metadata: row.metadata,
            changed_at: row.changed_at,
        }
    }
}

impl DemandAuditRow {
    /// Append one record. Takes any executor so the insert can join the
    /// transaction that updates the demand's status.
    pub async fn insert<'e, E: PgExecutor<'e>>(
        executor: E,
        record: &DemandAuditRecord,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO demand_audit_records (
                id, demand_id, previous_status, new_status,
                changed_by_user_id, changed_by_member_id, changed_by_user_name,
                changed_by_role, reason, metadata, changed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            ",
        )
        .bind(record.id)
        .bind(record.demand_id)
        .bind(record.previous_status)
        .bind(record.new_status)
        .bind(record.changed_by_user_id)
        .bind(record.changed_by_member_id)
        .bind(&record.changed_by_user_name)
        .bind(record.changed_by_role)
        .bind(&record.reason)
        .bind(&record.metadata)
        .bind(record.changed_at)
        .fetch_one(executor)
        .await
    }

    /// All records for one demand, newest first.
    pub async fn history_for_demand<'e, E: PgExecutor<'e>>(
        executor: E,
        demand_id: DemandId,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM demand_audit_records
            WHERE demand_id = $1
            ORDER BY changed_at DESC
            ",
        )
        .bind(demand_id)
        .fetch_all(executor)
        .await
    }

    /// Records produced by one actor, newest first, bounded by `limit`.
    pub async fn history_for_actor<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM demand_audit_records
            WHERE changed_by_user_id = $1
            ORDER BY changed_at DESC
            LIMIT $2
            ",
        )
        .bind(user_id)
        .bind(limit.max(0))
        .fetch_all(executor)
        .await
    }
}
