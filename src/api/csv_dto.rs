use serde::Deserialize;

// Row layouts of the batch-runner CSV input directory.

#[derive(Debug, Clone, Deserialize)]
pub struct NodeRecord {
    #[serde(rename = "nodeId")]
    pub node_id: String,
    pub cpu: i64,
    pub memory_mb: i64,
    #[serde(default)]
    pub is_gw: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkRecord {
    pub src: String,
    pub dst: String,
    pub bw_mbps: f64,
    #[serde(default)]
    pub latency_ms: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NextHopRecord {
    pub src: String,
    pub dst: String,
    pub next_hop: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComponentRecord {
    pub name: String,
    pub cpu: i64,
    pub memory: i64,
    #[serde(default)]
    pub gw_bw: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DependencyRecord {
    pub src: String,
    pub dst: String,
    pub bw_mbps: f64,
    #[serde(default)]
    pub latency_ms: Option<f64>,
}
