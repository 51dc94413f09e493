//! Integration tests for the PostgreSQL stores.
//!
//! Require a running PostgreSQL reachable through `DATABASE_URL`:
//!
//! ```sh
//! DATABASE_URL=postgres://localhost/demanda_test \
//!     cargo test -p demanda-db --features integration
//! ```

#![cfg(feature = "integration")]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use demanda_core::{
    Actor, AvailabilityError, CreateDemandInput, DemandError, DemandLifecycleService,
    DemandPriority, DemandStatus, MemberId, OrgRole, TransitionValidator,
};
use demanda_db::{run_migrations, DbPool, PgAuditStore, PgDemandStore, PgMemberStore};

async fn connect() -> DbPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = DbPool::connect(&url).await.expect("connect");
    run_migrations(&pool).await.expect("migrations");
    pool
}

async fn seed_member(pool: &DbPool, working_days: &[&str]) -> MemberId {
    let id = MemberId::new();
    sqlx::query(
        r"
        INSERT INTO members (id, user_id, unit_id, display_name, organization_role, working_days)
        VALUES ($1, $2, $3, 'Maria Lima', 'ANALYST', $4)
        ",
    )
    .bind(id)
    .bind(Uuid::new_v4())
    .bind(Uuid::new_v4())
    .bind(working_days.iter().map(|d| d.to_string()).collect::<Vec<_>>())
    .execute(pool.inner())
    .await
    .expect("seed member");
    id
}

fn service(pool: &DbPool) -> DemandLifecycleService {
    DemandLifecycleService::new(
        Arc::new(PgDemandStore::new(pool)),
        Arc::new(PgMemberStore::new(pool)),
        Arc::new(PgAuditStore::new(pool)),
        TransitionValidator::standard(),
    )
}

fn admin() -> Actor {
    Actor {
        user_id: Uuid::new_v4(),
        member_id: None,
        display_name: Some("Admin".to_string()),
        role: OrgRole::Admin,
    }
}

fn input(unit_id: Uuid, title: &str) -> CreateDemandInput {
    CreateDemandInput {
        unit_id,
        applicant_id: Uuid::new_v4(),
        title: title.to_string(),
        description: None,
        priority: DemandPriority::Medium,
        category: None,
        responsible_member_id: None,
        scheduled_date: None,
        scheduled_time: None,
    }
}

#[tokio::test]
async fn concurrent_bookings_for_same_slot_cannot_both_commit() {
    let pool = connect().await;
    let svc = service(&pool);
    let actor = admin();
    let member = seed_member(&pool, &[]).await;
    let unit = Uuid::new_v4();

    let d1 = svc.create_demand(input(unit, "Consulta"), actor.user_id).await.unwrap();
    let d2 = svc.create_demand(input(unit, "Retorno"), actor.user_id).await.unwrap();

    let date = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
    let time = NaiveTime::from_hms_opt(14, 0, 0).unwrap();

    let (first, second) = tokio::join!(
        svc.assign_member(d1.id, member, date, time, &actor),
        svc.assign_member(d2.id, member, date, time, &actor),
    );

    let failures = [&first, &second]
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(DemandError::Availability(
                    AvailabilityError::SlotAlreadyBooked { .. }
                ))
            )
        })
        .count();
    assert_eq!(
        failures, 1,
        "exactly one of two concurrent bookings must fail: {first:?} / {second:?}"
    );
}

#[tokio::test]
async fn status_change_and_audit_row_commit_together() {
    let pool = connect().await;
    let svc = service(&pool);
    let actor = admin();
    let unit = Uuid::new_v4();

    let demand = svc.create_demand(input(unit, "Auditoria"), actor.user_id).await.unwrap();

    let update = svc
        .update_status(demand.id, DemandStatus::Resolved, &actor, None)
        .await
        .unwrap();
    assert_eq!(update.demand.status, DemandStatus::Resolved);

    let history = svc.audit().history_for_demand(demand.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].previous_status, DemandStatus::Pending);
    assert_eq!(history[0].new_status, DemandStatus::Resolved);
    assert_eq!(history[0].id, update.audit_record.unwrap().id);
}

#[tokio::test]
async fn working_day_tokens_round_trip_through_the_row() {
    let pool = connect().await;
    let member_id = seed_member(&pool, &["SEGUNDA", "QUARTA", "SEXTA"]).await;

    let store = PgMemberStore::new(&pool);
    let member = demanda_core::MemberStore::get(&store, member_id)
        .await
        .unwrap()
        .expect("member exists");

    use demanda_core::Weekday;
    assert_eq!(
        member.working_days,
        vec![Weekday::Segunda, Weekday::Quarta, Weekday::Sexta]
    );
    assert!(!member.works_on(Weekday::Terca));
}
