use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::utils::id::{ComponentId, NodeId};

/// Component to node mapping, built up one placement at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Assignment {
    placements: BTreeMap<ComponentId, NodeId>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, component: ComponentId, node: NodeId) {
        self.placements.insert(component, node);
    }

    pub fn node_of(&self, component: &ComponentId) -> Option<&NodeId> {
        self.placements.get(component)
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Components hosted on `node`, ordered by component id.
    pub fn components_on<'a>(&'a self, node: &'a NodeId) -> impl Iterator<Item = &'a ComponentId> + 'a {
        self.placements.iter().filter(move |(_, host)| *host == node).map(|(component, _)| component)
    }
}

/// Why a scheduling attempt returned `feasible = false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum Infeasibility {
    /// The dependency graph has a cycle, no topological order exists.
    CyclicDependency,
    /// Every node was tried for `component` and none fit.
    Exhausted { component: ComponentId },
    /// The cancellation signal fired before the schedule completed.
    Cancelled,
}

impl fmt::Display for Infeasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Infeasibility::CyclicDependency => write!(f, "dependency graph contains a cycle"),
            Infeasibility::Exhausted { component } => write!(f, "no node can host component '{}'", component),
            Infeasibility::Cancelled => write!(f, "scheduling was cancelled"),
        }
    }
}

/// What `schedule()` hands back. Infeasibility is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    /// Complete when `feasible`, empty otherwise.
    pub assignment: Assignment,
    pub feasible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infeasibility: Option<Infeasibility>,
}

impl ScheduleOutcome {
    pub fn success(assignment: Assignment) -> Self {
        Self { assignment, feasible: true, infeasibility: None }
    }

    pub fn infeasible(reason: Infeasibility) -> Self {
        Self { assignment: Assignment::new(), feasible: false, infeasibility: Some(reason) }
    }
}
