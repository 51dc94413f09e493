//! Role permission matrix for status transitions.
//!
//! For each role the matrix holds two sets: statuses the role may move a
//! demand *away from* and statuses it may move a demand *into*. A transition
//! requires membership in both sets, independently of graph legality.

use std::collections::{HashMap, HashSet};

use crate::types::{DemandStatus, OrgRole};

/// The `(allowed_from, allowed_to)` sets for a role in the standard matrix.
fn standard_rule(role: OrgRole) -> (&'static [DemandStatus], &'static [DemandStatus]) {
    use DemandStatus::{Billed, CheckIn, InProgress, Pending, Resolved};
    match role {
        OrgRole::Admin => (
            &[Pending, CheckIn, InProgress, Resolved],
            &[CheckIn, InProgress, Resolved, Billed],
        ),
        OrgRole::Manager => (&[], &[]),
        OrgRole::Clerk => (
            &[Pending, CheckIn, InProgress],
            &[CheckIn, InProgress, Resolved],
        ),
        OrgRole::Analyst => (&[CheckIn, InProgress], &[InProgress, Resolved]),
        OrgRole::Billing => (&[Resolved], &[Billed]),
    }
}

/// Per-role transition permissions.
#[derive(Debug, Clone, Default)]
pub struct RoleRule {
    allowed_from: HashSet<DemandStatus>,
    allowed_to: HashSet<DemandStatus>,
}

impl RoleRule {
    /// Build a rule from explicit sets.
    pub fn new<F, T>(allowed_from: F, allowed_to: T) -> Self
    where
        F: IntoIterator<Item = DemandStatus>,
        T: IntoIterator<Item = DemandStatus>,
    {
        Self {
            allowed_from: allowed_from.into_iter().collect(),
            allowed_to: allowed_to.into_iter().collect(),
        }
    }
}

/// Immutable lookup of which role may move a demand between which statuses.
#[derive(Debug, Clone)]
pub struct RolePermissionMatrix {
    rules: HashMap<OrgRole, RoleRule>,
}

impl RolePermissionMatrix {
    /// Build a matrix from explicit per-role rules. Roles absent from the
    /// iterator are denied everything.
    pub fn new<I>(rules: I) -> Self
    where
        I: IntoIterator<Item = (OrgRole, RoleRule)>,
    {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    /// The standard reference matrix.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(OrgRole::ALL.into_iter().map(|role| {
            let (from, to) = standard_rule(role);
            (role, RoleRule::new(from.iter().copied(), to.iter().copied()))
        }))
    }

    /// Whether `role` may move a demand away from `from`.
    #[must_use]
    pub fn may_leave(&self, role: OrgRole, from: DemandStatus) -> bool {
        self.rules
            .get(&role)
            .is_some_and(|rule| rule.allowed_from.contains(&from))
    }

    /// Whether `role` may move a demand into `to`.
    #[must_use]
    pub fn may_enter(&self, role: OrgRole, to: DemandStatus) -> bool {
        self.rules
            .get(&role)
            .is_some_and(|rule| rule.allowed_to.contains(&to))
    }

    /// Whether `role` may perform the `from -> to` transition. Both the
    /// leave and enter conditions must hold.
    #[must_use]
    pub fn is_permitted(&self, role: OrgRole, from: DemandStatus, to: DemandStatus) -> bool {
        self.may_leave(role, from) && self.may_enter(role, to)
    }
}

impl Default for RolePermissionMatrix {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DemandStatus::{Billed, CheckIn, InProgress, Pending, Rejected, Resolved};

    #[test]
    fn manager_may_do_nothing() {
        let matrix = RolePermissionMatrix::standard();
        for from in DemandStatus::ALL {
            for to in DemandStatus::ALL {
                assert!(!matrix.is_permitted(OrgRole::Manager, from, to));
            }
        }
    }

    #[test]
    fn billing_only_moves_resolved_to_billed() {
        let matrix = RolePermissionMatrix::standard();
        assert!(matrix.is_permitted(OrgRole::Billing, Resolved, Billed));
        assert!(!matrix.is_permitted(OrgRole::Billing, Pending, Billed));
        assert!(!matrix.is_permitted(OrgRole::Billing, Resolved, InProgress));
    }

    #[test]
    fn clerk_cannot_leave_resolved() {
        let matrix = RolePermissionMatrix::standard();
        assert!(!matrix.may_leave(OrgRole::Clerk, Resolved));
        assert!(!matrix.is_permitted(OrgRole::Clerk, Resolved, Billed));
        assert!(matrix.is_permitted(OrgRole::Clerk, Pending, CheckIn));
        assert!(matrix.is_permitted(OrgRole::Clerk, InProgress, Resolved));
    }

    #[test]
    fn both_conditions_are_required() {
        let matrix = RolePermissionMatrix::standard();
        // ANALYST may enter IN_PROGRESS but may not leave PENDING.
        assert!(matrix.may_enter(OrgRole::Analyst, InProgress));
        assert!(!matrix.may_leave(OrgRole::Analyst, Pending));
        assert!(!matrix.is_permitted(OrgRole::Analyst, Pending, InProgress));
    }

    #[test]
    fn nobody_enters_rejected() {
        let matrix = RolePermissionMatrix::standard();
        for role in OrgRole::ALL {
            assert!(!matrix.may_enter(role, Rejected));
        }
    }
}
