use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TopologyDto {
    pub nodes: Vec<NodeDto>,
    #[serde(default)]
    pub links: Vec<LinkDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NodeDto {
    #[serde(alias = "node_id")]
    pub id: String,
    pub cpu: i64,
    #[serde(alias = "memory_mb")]
    pub memory: i64,
    #[serde(default, alias = "is_gw")]
    pub is_gateway: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LinkDto {
    pub src: String,
    pub dst: String,
    #[serde(default, alias = "latency_ms")]
    pub latency_ms: f64,
    #[serde(alias = "bw")]
    pub bandwidth_capacity: f64,
}

/// Precomputed routes. The engine never computes routes on its own.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PathsDto {
    pub paths: Vec<PathDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PathDto {
    pub src: String,
    pub dst: String,
    pub hops: Vec<HopDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HopDto {
    pub src: String,
    pub dst: String,
}
