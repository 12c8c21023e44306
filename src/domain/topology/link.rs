use serde::{Deserialize, Serialize};

use crate::domain::utils::id::NodeId;

/// Directed connection `src -> dst` with a bandwidth capacity.
///
/// `used_bandwidth` is not clamped: over-committing records a negative
/// residual instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub src: NodeId,
    pub dst: NodeId,
    pub latency: f64,
    pub capacity: f64,
    pub used_bandwidth: f64,
}

impl Link {
    pub fn new(src: NodeId, dst: NodeId, latency: f64, capacity: f64) -> Self {
        Self { src, dst, latency, capacity, used_bandwidth: 0.0 }
    }

    /// Residual bandwidth, negative when over-committed.
    pub fn free_bandwidth(&self) -> f64 {
        self.capacity - self.used_bandwidth
    }

    pub fn add_usage(&mut self, delta: f64) {
        self.used_bandwidth += delta;
    }
}
