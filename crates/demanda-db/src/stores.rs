//! PostgreSQL implementations of the engine's store traits.
//!
//! `PgDemandStore::assign` locks the member's same-day bookings with
//! `FOR UPDATE` before re-checking the slot, and the partial unique index on
//! `(responsible_member_id, scheduled_date, scheduled_time)` backstops the
//! check: a concurrent booking for the same slot surfaces as a unique
//! violation and is reported as `SlotAlreadyBooked`, never committed.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;
use uuid::Uuid;

use demanda_core::{
    AuditStore, AvailabilityError, CreateDemandInput, Demand, DemandAuditRecord, DemandError,
    DemandFilter, DemandId, DemandStatus, DemandStore, ListOptions, Member, MemberId, MemberStore,
    Result,
};

use crate::models::{DemandAuditRow, DemandRow, MemberRow};
use crate::pool::DbPool;

fn slot_error_from(
    err: sqlx::Error,
    member_id: MemberId,
    date: NaiveDate,
    time: NaiveTime,
) -> DemandError {
    if err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation())
    {
        AvailabilityError::SlotAlreadyBooked {
            member_id,
            date,
            time,
        }
        .into()
    } else {
        DemandError::Database(err)
    }
}

/// Demand storage backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgDemandStore {
    pool: PgPool,
}

impl PgDemandStore {
    /// Create a store over the shared pool.
    #[must_use]
    pub fn new(pool: &DbPool) -> Self {
        Self {
            pool: pool.inner().clone(),
        }
    }
}

#[async_trait]
impl DemandStore for PgDemandStore {
    async fn get(&self, id: DemandId) -> Result<Option<Demand>> {
        Ok(DemandRow::find_by_id(&self.pool, id)
            .await?
            .map(Demand::from))
    }

    async fn insert(&self, input: CreateDemandInput) -> Result<Demand> {
        let row = DemandRow::insert(&self.pool, &input).await.map_err(|err| {
            match (input.responsible_member_id, input.scheduled_date, input.scheduled_time) {
                (Some(member_id), Some(date), Some(time)) => {
                    slot_error_from(err, member_id, date, time)
                }
                _ => DemandError::Database(err),
            }
        })?;
        Ok(row.into())
    }

    async fn list(
        &self,
        unit_id: Uuid,
        filter: &DemandFilter,
        options: &ListOptions,
    ) -> Result<Vec<Demand>> {
        let rows = DemandRow::list(&self.pool, unit_id, filter, options).await?;
        Ok(rows.into_iter().map(Demand::from).collect())
    }

    async fn assign(
        &self,
        id: DemandId,
        member_id: MemberId,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Option<Demand>> {
        let mut tx = self.pool.begin().await?;

        // Lock the member's bookings for that date so two concurrent
        // assignments serialize on the conflict check.
        sqlx::query(
            r"
            SELECT id FROM demands
            WHERE responsible_member_id = $1 AND scheduled_date = $2
            FOR UPDATE
            ",
        )
        .bind(member_id)
        .bind(date)
        .fetch_all(&mut *tx)
        .await?;

        if DemandRow::find_slot_conflict(&mut *tx, member_id, date, time, Some(id))
            .await?
            .is_some()
        {
            return Err(AvailabilityError::SlotAlreadyBooked {
                member_id,
                date,
                time,
            }
            .into());
        }

        let updated: Option<DemandRow> = sqlx::query_as(
            r"
            UPDATE demands
            SET responsible_member_id = $2,
                scheduled_date = $3,
                scheduled_time = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(member_id)
        .bind(date)
        .bind(time)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|err| slot_error_from(err, member_id, date, time))?;

        tx.commit().await?;
        Ok(updated.map(Demand::from))
    }

    async fn update_status(
        &self,
        id: DemandId,
        new_status: DemandStatus,
        audit_record: Option<DemandAuditRecord>,
    ) -> Result<Option<Demand>> {
        let mut tx = self.pool.begin().await?;

        let updated: Option<DemandRow> = sqlx::query_as(
            r"
            UPDATE demands
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(new_status)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = updated else {
            // Nothing updated, nothing to audit.
            return Ok(None);
        };

        // The audit row commits with the status change or not at all.
        if let Some(record) = audit_record {
            DemandAuditRow::insert(&mut *tx, &record).await?;
        }

        tx.commit().await?;
        Ok(Some(row.into()))
    }

    async fn find_slot_conflict(
        &self,
        member_id: MemberId,
        date: NaiveDate,
        time: NaiveTime,
        exclude: Option<DemandId>,
    ) -> Result<Option<DemandId>> {
        Ok(DemandRow::find_slot_conflict(&self.pool, member_id, date, time, exclude).await?)
    }
}

/// Member storage backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgMemberStore {
    pool: PgPool,
}

impl PgMemberStore {
    /// Create a store over the shared pool.
    #[must_use]
    pub fn new(pool: &DbPool) -> Self {
        Self {
            pool: pool.inner().clone(),
        }
    }
}

#[async_trait]
impl MemberStore for PgMemberStore {
    async fn get(&self, id: MemberId) -> Result<Option<Member>> {
        match MemberRow::find_by_id(&self.pool, id).await? {
            Some(row) => Ok(Some(Member::try_from(row)?)),
            None => Ok(None),
        }
    }
}

/// Audit record storage backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    /// Create a store over the shared pool.
    #[must_use]
    pub fn new(pool: &DbPool) -> Self {
        Self {
            pool: pool.inner().clone(),
        }
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn append(&self, record: DemandAuditRecord) -> Result<DemandAuditRecord> {
        let row = DemandAuditRow::insert(&self.pool, &record).await?;
        Ok(row.into())
    }

    async fn history_for_demand(&self, demand_id: DemandId) -> Result<Vec<DemandAuditRecord>> {
        let rows = DemandAuditRow::history_for_demand(&self.pool, demand_id).await?;
        Ok(rows.into_iter().map(DemandAuditRecord::from).collect())
    }

    async fn history_for_actor(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<DemandAuditRecord>> {
        let rows = DemandAuditRow::history_for_actor(&self.pool, user_id, limit).await?;
        Ok(rows.into_iter().map(DemandAuditRecord::from).collect())
    }
}
