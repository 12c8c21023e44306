use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::domain::topology::link::Link;
use crate::domain::topology::topology::LinkKey;
use crate::domain::utils::id::NodeId;

/// A precomputed route between two nodes, realized by an ordered list of links.
///
/// The bottleneck values are cached. They go stale as soon as any link on the
/// route changes, so the owner has to call [`Path::recompute`] after every
/// link mutation, including mutations made through *other* paths sharing a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub src: NodeId,
    pub dst: NodeId,
    pub links: Vec<LinkKey>,

    /// Min over the links of `capacity - used_bandwidth`.
    pub bottleneck_bandwidth: f64,

    /// Max over the links of `latency`.
    pub bottleneck_latency: f64,
}

impl Path {
    pub fn new(src: NodeId, dst: NodeId, links: Vec<LinkKey>) -> Self {
        Self { src, dst, links, bottleneck_bandwidth: 0.0, bottleneck_latency: 0.0 }
    }

    pub fn recompute(&mut self, links: &SlotMap<LinkKey, Link>) {
        let mut bandwidth = f64::INFINITY;
        let mut latency = f64::NEG_INFINITY;

        for link in self.links.iter().filter_map(|key| links.get(*key)) {
            bandwidth = bandwidth.min(link.free_bandwidth());
            latency = latency.max(link.latency);
        }

        // An empty route is rejected at load time, this only guards the fold seeds.
        self.bottleneck_bandwidth = if bandwidth.is_finite() { bandwidth } else { 0.0 };
        self.bottleneck_latency = if latency.is_finite() { latency } else { 0.0 };
    }

    /// True iff `demand` fits strictly below the bottleneck. Exact equality fails.
    pub fn is_bandwidth_available(&self, demand: f64) -> bool {
        demand < self.bottleneck_bandwidth
    }

    pub fn hop_count(&self) -> usize {
        self.links.len()
    }
}
