//! Transition validation.
//!
//! Composes the [`StatusGraph`] and the [`RolePermissionMatrix`] into a single
//! approve/reject decision for a requested status transition.

use thiserror::Error;

use crate::graph::StatusGraph;
use crate::permissions::RolePermissionMatrix;
use crate::types::{DemandStatus, OrgRole};

/// Why a requested transition was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The edge does not exist in the status graph, for any role.
    #[error("no transition exists from {from} to {to}")]
    IllegalEdge {
        from: DemandStatus,
        to: DemandStatus,
    },

    /// The role may not move demands away from the current status.
    #[error("role {role} cannot alter demands with status {from}")]
    CannotLeave { role: OrgRole, from: DemandStatus },

    /// The role may not move demands into the requested status.
    #[error("role {role} cannot move demands to status {to}")]
    CannotEnter { role: OrgRole, to: DemandStatus },
}

/// Validates requested transitions against the graph and the role matrix.
///
/// Deterministic and side-effect free; a failure is always a client input
/// error and is never retried.
#[derive(Debug, Clone)]
pub struct TransitionValidator {
    graph: StatusGraph,
    matrix: RolePermissionMatrix,
}

impl TransitionValidator {
    /// Build a validator over an explicit graph and matrix.
    #[must_use]
    pub fn new(graph: StatusGraph, matrix: RolePermissionMatrix) -> Self {
        Self { graph, matrix }
    }

    /// Validator over the standard lifecycle graph and reference matrix.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(StatusGraph::standard(), RolePermissionMatrix::standard())
    }

    /// Approve or reject a requested transition for a role.
    ///
    /// A self-transition (`from == to`) succeeds trivially. Otherwise both
    /// checks are evaluated, and the graph-edge failure is reported before a
    /// role-permission failure so that an illegal edge never leaks what a
    /// role could do if the edge existed. Role failures distinguish "cannot
    /// leave the current status" from "cannot enter the requested status".
    pub fn validate(
        &self,
        role: OrgRole,
        from: DemandStatus,
        to: DemandStatus,
    ) -> Result<(), TransitionError> {
        if from == to {
            return Ok(());
        }

        let edge_legal = self.graph.is_legal_edge(from, to);
        let may_leave = self.matrix.may_leave(role, from);
        let may_enter = self.matrix.may_enter(role, to);

        if !edge_legal {
            return Err(TransitionError::IllegalEdge { from, to });
        }
        if !may_leave {
            return Err(TransitionError::CannotLeave { role, from });
        }
        if !may_enter {
            return Err(TransitionError::CannotEnter { role, to });
        }
        Ok(())
    }

    /// The graph this validator consults.
    #[must_use]
    pub fn graph(&self) -> &StatusGraph {
        &self.graph
    }

    /// The matrix this validator consults.
    #[must_use]
    pub fn matrix(&self) -> &RolePermissionMatrix {
        &self.matrix
    }
}

impl Default for TransitionValidator {
    fn default() -> Self {
        Self::standard()
    }
}
