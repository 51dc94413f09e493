//! Status transition graph.
//!
//! The graph is an immutable, explicitly constructed edge table built once at
//! startup and passed into the [`crate::validator::TransitionValidator`], so
//! tests can swap in a different topology.

use std::collections::{HashMap, HashSet};

use crate::types::DemandStatus;

/// Outgoing edges for a status in the standard lifecycle.
fn standard_successors(status: DemandStatus) -> &'static [DemandStatus] {
    use DemandStatus::{Billed, CheckIn, InProgress, Pending, Rejected, Resolved};
    match status {
        Pending => &[CheckIn, InProgress, Resolved],
        CheckIn => &[InProgress, Resolved],
        InProgress => &[Resolved],
        Resolved => &[Billed],
        Rejected => &[],
        Billed => &[],
    }
}

/// Directed graph over demand statuses describing legal transitions.
#[derive(Debug, Clone)]
pub struct StatusGraph {
    edges: HashMap<DemandStatus, HashSet<DemandStatus>>,
}

impl StatusGraph {
    /// Build a graph from an explicit edge list.
    pub fn new<I, T>(edges: I) -> Self
    where
        I: IntoIterator<Item = (DemandStatus, T)>,
        T: IntoIterator<Item = DemandStatus>,
    {
        Self {
            edges: edges
                .into_iter()
                .map(|(from, to)| (from, to.into_iter().collect()))
                .collect(),
        }
    }

    /// The standard demand lifecycle graph.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(
            DemandStatus::ALL
                .into_iter()
                .map(|status| (status, standard_successors(status).iter().copied())),
        )
    }

    /// Whether a transition from `from` to `to` is legal.
    ///
    /// A self-loop (`from == to`) is always legal and is treated as a no-op
    /// by the rest of the engine.
    #[must_use]
    pub fn is_legal_edge(&self, from: DemandStatus, to: DemandStatus) -> bool {
        if from == to {
            return true;
        }
        self.edges.get(&from).is_some_and(|targets| targets.contains(&to))
    }

    /// Statuses reachable in one step from `from`.
    #[must_use]
    pub fn successors(&self, from: DemandStatus) -> Vec<DemandStatus> {
        let mut targets: Vec<_> = self
            .edges
            .get(&from)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        targets.sort_by_key(|status| status.as_str());
        targets
    }
}

impl Default for StatusGraph {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DemandStatus::{Billed, CheckIn, InProgress, Pending, Rejected, Resolved};

    #[test]
    fn standard_edges() {
        let graph = StatusGraph::standard();
        assert!(graph.is_legal_edge(Pending, CheckIn));
        assert!(graph.is_legal_edge(Pending, InProgress));
        assert!(graph.is_legal_edge(Pending, Resolved));
        assert!(graph.is_legal_edge(CheckIn, InProgress));
        assert!(graph.is_legal_edge(CheckIn, Resolved));
        assert!(graph.is_legal_edge(InProgress, Resolved));
        assert!(graph.is_legal_edge(Resolved, Billed));

        assert!(!graph.is_legal_edge(Resolved, Pending));
        assert!(!graph.is_legal_edge(InProgress, CheckIn));
        assert!(!graph.is_legal_edge(Pending, Billed));
    }

    #[test]
    fn terminal_statuses_have_no_outgoing_edges() {
        let graph = StatusGraph::standard();
        for to in DemandStatus::ALL {
            if to != Rejected {
                assert!(!graph.is_legal_edge(Rejected, to));
            }
            if to != Billed {
                assert!(!graph.is_legal_edge(Billed, to));
            }
        }
    }

    #[test]
    fn successors_enumerates_outgoing_edges() {
        let graph = StatusGraph::standard();
        assert_eq!(graph.successors(Resolved), vec![Billed]);
        assert!(graph.successors(Billed).is_empty());
        assert_eq!(graph.successors(Pending).len(), 3);
    }

    #[test]
    fn self_loop_is_always_legal() {
        let graph = StatusGraph::standard();
        for status in DemandStatus::ALL {
            assert!(graph.is_legal_edge(status, status));
        }
    }

    #[test]
    fn custom_topology_is_swappable() {
        let graph = StatusGraph::new([(Pending, vec![Billed])]);
        assert!(graph.is_legal_edge(Pending, Billed));
        assert!(!graph.is_legal_edge(Pending, CheckIn));
    }
}
