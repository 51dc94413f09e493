//! Demand row model and queries.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use sqlx::FromRow;
use uuid::Uuid;

use demanda_core::{
    CreateDemandInput, Demand, DemandFilter, DemandId, DemandPriority, DemandStatus, ListOptions,
    MemberId,
};

/// One row of the `demands` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DemandRow {
    pub id: DemandId,
    pub unit_id: Uuid,
    pub applicant_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: DemandStatus,
    pub priority: DemandPriority,
    pub category: Option<String>,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<NaiveTime>,
    pub responsible_member_id: Option<MemberId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DemandRow> for Demand {
    fn from(row: DemandRow) -> Self {
        Self {
            id: row.id,
            unit_id: row.unit_id,
            applicant_id: row.applicant_id,
            title: row.title,
            description: row.description,
            status: row.status,
            priority: row.priority,
            category: row.category,
            scheduled_date: row.scheduled_date,
            scheduled_time: row.scheduled_time,
            responsible_member_id: row.responsible_member_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl DemandRow {
    /// Find a demand by ID.
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DemandId,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM demands WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Insert a new demand at `PENDING`.
    pub async fn insert<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &CreateDemandInput,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO demands (
                id, unit_id, applicant_id, title, description, status,
                priority, category, scheduled_date, scheduled_time,
                responsible_member_id
            )
            VALUES ($1, $2, $3, $4, $5, 'PENDING', $6, $7, $8, $9, $10)
            RETURNING *
            ",
        )
        .bind(DemandId::new())
        .bind(input.unit_id)
        .bind(input.applicant_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.priority)
        .bind(&input.category)
        .bind(input.scheduled_date)
        .bind(input.scheduled_time)
        .bind(input.responsible_member_id)
        .fetch_one(executor)
        .await
    }

    /// List demands in a unit with filtering and pagination, newest first.
    pub async fn list<'e, E: PgExecutor<'e>>(
        executor: E,
        unit_id: Uuid,
        filter: &DemandFilter,
        options: &ListOptions,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM demands
            WHERE unit_id = $1
              AND ($2::demand_status IS NULL OR status = $2)
              AND ($3::demand_priority IS NULL OR priority = $3)
              AND ($4::text IS NULL OR category = $4)
              AND ($5::uuid IS NULL OR responsible_member_id = $5)
              AND ($6::date IS NULL OR scheduled_date = $6)
            ORDER BY created_at DESC
            LIMIT $7 OFFSET $8
            ",
        )
        .bind(unit_id)
        .bind(filter.status)
        .bind(filter.priority)
        .bind(&filter.category)
        .bind(filter.responsible_member_id)
        .bind(filter.scheduled_date)
        .bind(options.limit.max(0))
        .bind(options.offset.max(0))
        .fetch_all(executor)
        .await
    }

    /// A non-terminal demand already occupying `(member, date, time)`,
    /// excluding `exclude` when reassigning.
    pub async fn find_slot_conflict<'e, E: PgExecutor<'e>>(
        executor: E,
        member_id: MemberId,
        date: NaiveDate,
        time: NaiveTime,
        exclude: Option<DemandId>,
    ) -> Result<Option<DemandId>, sqlx::Error> {
        sqlx::query_scalar(
            r"
            SELECT id FROM demands
            WHERE responsible_member_id = $1
              AND scheduled_date = $2
              AND scheduled_time = $3
              AND status NOT IN ('REJECTED', 'BILLED')
              AND ($4::uuid IS NULL OR id <> $4)
            LIMIT 1
            ",
        )
        .bind(member_id)
        .bind(date)
        .bind(time)
        .bind(exclude)
        .fetch_optional(executor)
        .await
    }
}
