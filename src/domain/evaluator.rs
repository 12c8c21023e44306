use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::scheduler::engine::PlacementEngine;
use crate::domain::scheduler::outcome::ScheduleOutcome;
use crate::domain::topology::topology::Topology;
use crate::domain::utils::id::NodeId;

/// Oversubscribed paths found after a schedule, keyed by source node then
/// destination node. Values are the (negative) residual bottleneck bandwidth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OversubscriptionReport {
    violations: BTreeMap<NodeId, BTreeMap<NodeId, f64>>,
}

impl OversubscriptionReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Residual of the path `src -> dst` if it is oversubscribed.
    pub fn residual(&self, src: &NodeId, dst: &NodeId) -> Option<f64> {
        self.violations.get(src).and_then(|per_dst| per_dst.get(dst)).copied()
    }

    pub fn violation_count(&self) -> usize {
        self.violations.values().map(BTreeMap::len).sum()
    }

    /// Bandwidth committed beyond capacity, summed over all oversubscribed paths.
    pub fn total_deficit(&self) -> f64 {
        self.violations.values().flat_map(BTreeMap::values).map(|residual| -residual).sum()
    }

    fn record(&mut self, src: NodeId, dst: NodeId, residual: f64) {
        self.violations.entry(src).or_default().insert(dst, residual);
    }
}

/// Post-hoc inspection of topology state for violations the schedulers let through.
///
/// Read-only, the topology is never touched.
pub struct FeasibilityEvaluator;

impl FeasibilityEvaluator {
    /// Inspects the engine's topology after `outcome` was produced.
    ///
    /// The outcome itself is not consulted for the check. An infeasible mesh
    /// attempt has been rolled back, an infeasible cluster attempt leaves its
    /// partial bookkeeping in place and is inspected as is.
    pub fn evaluate(engine: &PlacementEngine, outcome: &ScheduleOutcome) -> OversubscriptionReport {
        let report = Self::evaluate_topology(engine.topology());

        if !report.is_clean() {
            log::warn!(
                "Oversubscription: {} paths over capacity by {} in total after {} schedule (feasible = {}).",
                report.violation_count(),
                report.total_deficit(),
                engine.policy().name(),
                outcome.feasible
            );
        }
        report
    }

    /// Flags every path, per owning node, whose bottleneck bandwidth is below zero.
    pub fn evaluate_topology(topology: &Topology) -> OversubscriptionReport {
        let mut report = OversubscriptionReport::default();

        for node in topology.nodes() {
            for (dst, path_key) in &node.paths {
                let Some(path) = topology.path_by_key(*path_key) else {
                    continue;
                };
                if path.bottleneck_bandwidth < 0.0 {
                    log::debug!("Path {} -> {} oversubscribed, residual {}.", node.id, dst, path.bottleneck_bandwidth);
                    report.record(node.id.clone(), dst.clone(), path.bottleneck_bandwidth);
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::topology::node::Node;

    fn two_node_topology(capacity: f64) -> Topology {
        let mut topology = Topology::new();
        topology.add_node(Node::new(NodeId::new("n1"), 4, 4, false)).unwrap();
        topology.add_node(Node::new(NodeId::new("n2"), 4, 4, false)).unwrap();
        topology.add_link(NodeId::new("n1"), NodeId::new("n2"), 1.0, capacity).unwrap();
        topology.add_path(NodeId::new("n1"), NodeId::new("n2"), &[(NodeId::new("n1"), NodeId::new("n2"))]).unwrap();
        topology
    }

    #[test]
    fn test_untouched_topology_is_clean() {
        let report = FeasibilityEvaluator::evaluate_topology(&two_node_topology(10.0));
        assert!(report.is_clean());
        assert_eq!(report.total_deficit(), 0.0);
    }

    #[test]
    fn test_exactly_full_path_is_not_oversubscribed() {
        let mut topology = two_node_topology(10.0);
        let key = topology.path_key(&NodeId::new("n1"), &NodeId::new("n2")).unwrap();
        topology.update_path_bandwidth(key, 10.0);
        topology.recompute_all_bottlenecks();

        assert!(FeasibilityEvaluator::evaluate_topology(&topology).is_clean());
    }

    #[test]
    fn test_overcommitted_path_is_reported() {
        let mut topology = two_node_topology(10.0);
        let key = topology.path_key(&NodeId::new("n1"), &NodeId::new("n2")).unwrap();
        topology.update_path_bandwidth(key, 13.0);
        topology.recompute_all_bottlenecks();

        let report = FeasibilityEvaluator::evaluate_topology(&topology);
        assert_eq!(report.violation_count(), 1);
        assert_eq!(report.residual(&NodeId::new("n1"), &NodeId::new("n2")), Some(-3.0));
        assert_eq!(report.total_deficit(), 3.0);
    }
}
