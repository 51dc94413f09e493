//! Role-based visibility scoping for demand queries.
//!
//! ANALYST members only ever see demands assigned to them; every other role
//! sees the full unit scope. The same rule applies to list queries and to
//! single-item fetches, where an ownership mismatch surfaces as an
//! authorization failure rather than a not-found, preserving a precise
//! audit signal at the orchestration layer.

use crate::services::lifecycle::{Demand, DemandFilter};
use crate::types::{MemberId, OrgRole};

/// Pure query-narrowing rules per role.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisibilityFilter;

impl VisibilityFilter {
    /// Narrow a list filter to what the role may see.
    #[must_use]
    pub fn scope_filter(role: OrgRole, member_id: MemberId, mut filter: DemandFilter) -> DemandFilter {
        if role == OrgRole::Analyst {
            filter.responsible_member_id = Some(member_id);
        }
        filter
    }

    /// Whether the role may view one specific demand.
    #[must_use]
    pub fn can_view(role: OrgRole, member_id: Option<MemberId>, demand: &Demand) -> bool {
        if role != OrgRole::Analyst {
            return true;
        }
        member_id.is_some_and(|id| demand.responsible_member_id == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DemandId, DemandPriority, DemandStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn demand(responsible: Option<MemberId>) -> Demand {
        let now = Utc::now();
        Demand {
            id: DemandId::new(),
            unit_id: Uuid::new_v4(),
            applicant_id: Uuid::new_v4(),
            title: "Troca de curativo".to_string(),
            description: None,
            status: DemandStatus::Pending,
            priority: DemandPriority::Medium,
            category: None,
            scheduled_date: None,
            scheduled_time: None,
            responsible_member_id: responsible,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn analyst_filter_is_pinned_to_own_member_id() {
        let member_id = MemberId::new();
        let scoped =
            VisibilityFilter::scope_filter(OrgRole::Analyst, member_id, DemandFilter::default());
        assert_eq!(scoped.responsible_member_id, Some(member_id));

        // An analyst cannot widen the filter to someone else's work.
        let other = DemandFilter {
            responsible_member_id: Some(MemberId::new()),
            ..DemandFilter::default()
        };
        let scoped = VisibilityFilter::scope_filter(OrgRole::Analyst, member_id, other);
        assert_eq!(scoped.responsible_member_id, Some(member_id));
    }

    #[test]
    fn non_analyst_filter_is_untouched() {
        let member_id = MemberId::new();
        for role in [OrgRole::Admin, OrgRole::Manager, OrgRole::Clerk, OrgRole::Billing] {
            let scoped = VisibilityFilter::scope_filter(role, member_id, DemandFilter::default());
            assert_eq!(scoped.responsible_member_id, None);
        }
    }

    #[test]
    fn analyst_views_only_own_demands() {
        let member_id = MemberId::new();
        let own = demand(Some(member_id));
        let foreign = demand(Some(MemberId::new()));
        let unassigned = demand(None);

        assert!(VisibilityFilter::can_view(OrgRole::Analyst, Some(member_id), &own));
        assert!(!VisibilityFilter::can_view(OrgRole::Analyst, Some(member_id), &foreign));
        assert!(!VisibilityFilter::can_view(OrgRole::Analyst, Some(member_id), &unassigned));
        assert!(!VisibilityFilter::can_view(OrgRole::Analyst, None, &own));

        assert!(VisibilityFilter::can_view(OrgRole::Manager, None, &foreign));
    }
}
