use serde::{Deserialize, Serialize};

use crate::api::application_dto::DependencyDto;
use crate::domain::utils::id::ComponentId;

/// Directed edge `src -> dst` between two components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub src: ComponentId,
    pub dst: ComponentId,
    pub latency_bound_ms: f64,
    pub bandwidth: f64,
}

impl Dependency {
    pub fn new(src: impl Into<String>, dst: impl Into<String>, latency_bound_ms: f64, bandwidth: f64) -> Self {
        Self { src: ComponentId::new(src), dst: ComponentId::new(dst), latency_bound_ms, bandwidth }
    }

    /// The endpoint that is not `id`, if `id` is one of the two endpoints.
    pub fn other_end(&self, id: &ComponentId) -> Option<&ComponentId> {
        if &self.src == id {
            Some(&self.dst)
        } else if &self.dst == id {
            Some(&self.src)
        } else {
            None
        }
    }
}

impl From<&DependencyDto> for Dependency {
    fn from(dto: &DependencyDto) -> Self {
        Self {
            src: ComponentId::new(dto.src.clone()),
            dst: ComponentId::new(dto.dst.clone()),
            latency_bound_ms: dto.latency_bound_ms,
            bandwidth: dto.bandwidth_demand,
        }
    }
}
