use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ApplicationDto {
    pub components: Vec<ComponentDto>,
    #[serde(default)]
    pub dependencies: Vec<DependencyDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDto {
    #[serde(alias = "comp_id")]
    pub id: String,
    pub cpu: i64,
    #[serde(alias = "memory_mb")]
    pub memory: i64,
    /// External bandwidth demand, only looked at by the mesh scheduler.
    #[serde(default, alias = "gw_bw")]
    pub gateway_bandwidth: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DependencyDto {
    pub src: String,
    pub dst: String,
    #[serde(default, alias = "latency_ms")]
    pub latency_bound_ms: f64,
    #[serde(alias = "bw")]
    pub bandwidth_demand: f64,
}
