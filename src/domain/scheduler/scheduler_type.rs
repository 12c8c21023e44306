use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::scheduler::engine::PlacementEngine;
use crate::domain::topology::topology::Topology;
use crate::error::ConversionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerType {
    /// Node resources only, spread order, no rollback.
    Cluster,
    /// Node resources plus gateway, link and path bandwidth, pack order, rollback.
    Mesh,
}

impl FromStr for SchedulerType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cluster" | "k8s" => Ok(SchedulerType::Cluster),
            "mesh" => Ok(SchedulerType::Mesh),
            _ => Err(ConversionError::UnknownSchedulerType(s.to_string())),
        }
    }
}

impl fmt::Display for SchedulerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerType::Cluster => write!(f, "cluster"),
            SchedulerType::Mesh => write!(f, "mesh"),
        }
    }
}

impl SchedulerType {
    pub const ALL: [SchedulerType; 2] = [SchedulerType::Cluster, SchedulerType::Mesh];

    // Factory method to create a placement engine of this variant over `topology`
    pub fn get_instance(&self, topology: Topology) -> PlacementEngine {
        match self {
            SchedulerType::Cluster => PlacementEngine::cluster(topology),
            SchedulerType::Mesh => PlacementEngine::mesh(topology),
        }
    }
}
