use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::topology::topology::{LinkKey, PathKey};
use crate::domain::utils::id::NodeId;

/// A placement target with cpu and memory capacity.
///
/// Outgoing links and stored paths are referenced by key only, the records
/// themselves live in the [`Topology`](crate::domain::topology::topology::Topology) arenas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub cpu_capacity: i64,
    pub memory_capacity: i64,
    pub used_cpu: i64,
    pub used_memory: i64,
    pub is_gateway: bool,

    /// Outgoing links keyed by destination node.
    pub links: BTreeMap<NodeId, LinkKey>,

    /// Precomputed paths keyed by destination node.
    pub paths: BTreeMap<NodeId, PathKey>,
}

impl Node {
    pub fn new(id: NodeId, cpu_capacity: i64, memory_capacity: i64, is_gateway: bool) -> Self {
        Self {
            id,
            cpu_capacity,
            memory_capacity,
            used_cpu: 0,
            used_memory: 0,
            is_gateway,
            links: BTreeMap::new(),
            paths: BTreeMap::new(),
        }
    }

    pub fn free_cpu(&self) -> i64 {
        self.cpu_capacity - self.used_cpu
    }

    pub fn free_memory(&self) -> i64 {
        self.memory_capacity - self.used_memory
    }

    pub fn is_cpu_usage_possible(&self, cpu: i64) -> bool {
        self.used_cpu.checked_add(cpu).is_some_and(|total| total <= self.cpu_capacity)
    }

    pub fn is_memory_usage_possible(&self, memory: i64) -> bool {
        self.used_memory.checked_add(memory).is_some_and(|total| total <= self.memory_capacity)
    }

    pub fn can_host(&self, cpu: i64, memory: i64) -> bool {
        self.is_cpu_usage_possible(cpu) && self.is_memory_usage_possible(memory)
    }

    /// Books usage without a capacity check; counters saturate instead of wrapping.
    pub fn reserve(&mut self, cpu: i64, memory: i64) {
        self.used_cpu = self.used_cpu.saturating_add(cpu);
        self.used_memory = self.used_memory.saturating_add(memory);
    }
}
