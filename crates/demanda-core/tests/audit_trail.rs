//! Integration tests for the audit trail: one record per effective
//! transition, atomic with the status write, ordered history retrieval.

mod common;

use demanda_core::{DemandStatus, OrgRole, SYSTEM_ACTOR_NAME};

use common::{fixtures, TestContext};

#[tokio::test]
async fn billing_transition_produces_exactly_one_record() {
    let ctx = TestContext::new();
    let admin = ctx.actor(OrgRole::Admin);
    let billing = ctx.actor(OrgRole::Billing);

    let demand = ctx
        .service
        .create_demand(fixtures::demand_input(&ctx, "Fatura"), admin.user_id)
        .await
        .unwrap();

    ctx.service
        .update_status(demand.id, DemandStatus::Resolved, &admin, None)
        .await
        .unwrap();
    let before = ctx.stores.audit_store.count().await;

    let update = ctx
        .service
        .update_status(demand.id, DemandStatus::Billed, &billing, None)
        .await
        .unwrap();

    let record = update.audit_record.expect("transition must be audited");
    assert_eq!(record.previous_status, DemandStatus::Resolved);
    assert_eq!(record.new_status, DemandStatus::Billed);
    assert_eq!(record.changed_by_role, OrgRole::Billing);
    assert_eq!(ctx.stores.audit_store.count().await, before + 1);
}

#[tokio::test]
async fn self_transition_is_a_no_op_and_unaudited() {
    let ctx = TestContext::new();
    let admin = ctx.actor(OrgRole::Admin);

    let demand = ctx
        .service
        .create_demand(fixtures::demand_input(&ctx, "Triagem"), admin.user_id)
        .await
        .unwrap();
    let before = ctx.stores.audit_store.count().await;

    let update = ctx
        .service
        .update_status(demand.id, DemandStatus::Pending, &admin, None)
        .await
        .unwrap();

    assert!(update.audit_record.is_none());
    assert_eq!(update.demand.status, DemandStatus::Pending);
    assert_eq!(ctx.stores.audit_store.count().await, before);
}

#[tokio::test]
async fn demand_history_is_ordered_newest_first() {
    let ctx = TestContext::new();
    let admin = ctx.actor(OrgRole::Admin);

    let demand = ctx
        .service
        .create_demand(fixtures::demand_input(&ctx, "Acompanhamento"), admin.user_id)
        .await
        .unwrap();

    for status in [
        DemandStatus::CheckIn,
        DemandStatus::InProgress,
        DemandStatus::Resolved,
    ] {
        ctx.service
            .update_status(demand.id, status, &admin, None)
            .await
            .unwrap();
    }

    let history = ctx
        .service
        .audit()
        .history_for_demand(demand.id)
        .await
        .unwrap();

    assert_eq!(history.len(), 3);
    assert_eq!(history[0].new_status, DemandStatus::Resolved);
    assert_eq!(history[2].new_status, DemandStatus::CheckIn);
    for pair in history.windows(2) {
        assert!(pair[0].changed_at >= pair[1].changed_at);
    }
}

#[tokio::test]
async fn record_captures_actor_context_and_reason() {
    let ctx = TestContext::new();
    let mut clerk = ctx.actor(OrgRole::Clerk);
    clerk.display_name = Some("Joana Prado".to_string());

    let demand = ctx
        .service
        .create_demand(fixtures::demand_input(&ctx, "Encaminhamento"), clerk.user_id)
        .await
        .unwrap();

    let update = ctx
        .service
        .update_status(
            demand.id,
            DemandStatus::CheckIn,
            &clerk,
            Some("paciente chegou".to_string()),
        )
        .await
        .unwrap();

    let record = update.audit_record.unwrap();
    assert_eq!(record.changed_by_user_id, clerk.user_id);
    assert_eq!(record.changed_by_user_name, "Joana Prado");
    assert_eq!(record.reason.as_deref(), Some("paciente chegou"));
}

#[tokio::test]
async fn nameless_actor_is_recorded_as_system() {
    let ctx = TestContext::new();
    let mut admin = ctx.actor(OrgRole::Admin);
    admin.display_name = None;

    let demand = ctx
        .service
        .create_demand(fixtures::demand_input(&ctx, "Rotina"), admin.user_id)
        .await
        .unwrap();

    let update = ctx
        .service
        .update_status(demand.id, DemandStatus::CheckIn, &admin, None)
        .await
        .unwrap();

    assert_eq!(
        update.audit_record.unwrap().changed_by_user_name,
        SYSTEM_ACTOR_NAME
    );
}
