//! Fixture factories for integration tests.

use uuid::Uuid;

use demanda_core::{CreateDemandInput, DemandPriority, Member, MemberId, OrgRole, Weekday};

use super::TestContext;

/// A member of the context's unit with the given role and working days.
/// An empty `working_days` slice means the member works every day.
pub async fn member(ctx: &TestContext, role: OrgRole, working_days: &[Weekday]) -> Member {
    let member = Member {
        id: MemberId::new(),
        user_id: Uuid::new_v4(),
        unit_id: ctx.unit_id,
        display_name: "Maria Lima".to_string(),
        organization_role: role,
        unit_role: None,
        working_days: working_days.to_vec(),
    };
    ctx.stores.member_store.insert(member.clone()).await;
    member
}

/// A minimal creation input for the context's unit.
pub fn demand_input(ctx: &TestContext, title: &str) -> CreateDemandInput {
    CreateDemandInput {
        unit_id: ctx.unit_id,
        applicant_id: ctx.applicant_id,
        title: title.to_string(),
        description: None,
        priority: DemandPriority::Medium,
        category: None,
        responsible_member_id: None,
        scheduled_date: None,
        scheduled_time: None,
    }
}
