use serde::{Deserialize, Serialize};

use crate::api::application_dto::ComponentDto;
use crate::domain::utils::id::ComponentId;

/// One deployable unit of an application. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    pub cpu: i64,
    /// Memory demand in MB.
    pub memory: i64,
    /// External (internet facing) bandwidth demand. Zero means none.
    pub gateway_bandwidth: f64,
}

impl Component {
    pub fn new(id: impl Into<String>, cpu: i64, memory: i64) -> Self {
        Self { id: ComponentId::new(id), cpu, memory, gateway_bandwidth: 0.0 }
    }

    pub fn with_gateway_bandwidth(mut self, gateway_bandwidth: f64) -> Self {
        self.gateway_bandwidth = gateway_bandwidth;
        self
    }

    pub fn needs_gateway(&self) -> bool {
        self.gateway_bandwidth > 0.0
    }
}

impl From<&ComponentDto> for Component {
    fn from(dto: &ComponentDto) -> Self {
        Self { id: ComponentId::new(dto.id.clone()), cpu: dto.cpu, memory: dto.memory, gateway_bandwidth: dto.gateway_bandwidth }
    }
}
