use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};

use crate::api::topology_dto::{PathsDto, TopologyDto};
use crate::domain::topology::link::Link;
use crate::domain::topology::node::Node;
use crate::domain::topology::path::Path;
use crate::domain::utils::id::NodeId;
use crate::error::MalformedSpecError;

new_key_type! {
    pub struct LinkKey;
    pub struct PathKey;
}

/// The mutable part of a [`Topology`], captured before a scheduling attempt.
///
/// Arena keys are preserved by the copy, so every `LinkKey`/`PathKey` held by
/// a node stays valid after [`Topology::restore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologySnapshot {
    nodes: Vec<Node>,
    links: SlotMap<LinkKey, Link>,
    paths: SlotMap<PathKey, Path>,
}

/// Models the physical/virtual network the application is placed onto.
///
/// The `Topology` is the single canonical store of the network state:
/// * **Nodes**: placement targets in declaration order.
/// * **Links**: every directed link, held once in an arena.
/// * **Paths**: every precomputed route, held once in an arena and referring to
///   links by key. A link shared by many paths is therefore updated in one place.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    /// Nodes in declaration order.
    nodes: Vec<Node>,

    /// Maps a `NodeId` to its position in `nodes`.
    node_index: HashMap<NodeId, usize>,

    links: SlotMap<LinkKey, Link>,
    link_index: HashMap<(NodeId, NodeId), LinkKey>,

    paths: SlotMap<PathKey, Path>,
    path_index: HashMap<(NodeId, NodeId), PathKey>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the topology from the node/link description and the precomputed routes.
    ///
    /// 1. Register all nodes.
    /// 2. Register all links and attach them to their source node.
    /// 3. Resolve every route's hops to links and compute its bottlenecks.
    pub fn from_dto(topology: TopologyDto, paths: PathsDto) -> Result<Self, MalformedSpecError> {
        let mut result = Topology::new();

        for node_dto in &topology.nodes {
            result.add_node(Node::new(NodeId::new(node_dto.id.clone()), node_dto.cpu, node_dto.memory, node_dto.is_gateway))?;
        }

        for link_dto in &topology.links {
            result.add_link(NodeId::new(link_dto.src.clone()), NodeId::new(link_dto.dst.clone()), link_dto.latency_ms, link_dto.bandwidth_capacity)?;
        }

        for path_dto in &paths.paths {
            let hops: Vec<(NodeId, NodeId)> = path_dto.hops.iter().map(|hop| (NodeId::new(hop.src.clone()), NodeId::new(hop.dst.clone()))).collect();
            result.add_path(NodeId::new(path_dto.src.clone()), NodeId::new(path_dto.dst.clone()), &hops)?;
        }

        log::info!("Loaded topology with {} nodes, {} links and {} paths.", result.nodes.len(), result.links.len(), result.paths.len());

        Ok(result)
    }

    pub fn add_node(&mut self, node: Node) -> Result<(), MalformedSpecError> {
        if self.node_index.contains_key(&node.id) {
            return Err(MalformedSpecError::DuplicateNode(node.id.to_string()));
        }

        for (field, value) in [("cpu", node.cpu_capacity), ("memory", node.memory_capacity)] {
            if value < 0 {
                return Err(MalformedSpecError::NegativeCapacity { id: node.id.to_string(), field });
            }
        }

        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    pub fn add_link(&mut self, src: NodeId, dst: NodeId, latency: f64, capacity: f64) -> Result<LinkKey, MalformedSpecError> {
        let context = format!("Link {} -> {}", src, dst);
        self.ensure_node(&context, &src)?;
        self.ensure_node(&context, &dst)?;

        let pair = (src.clone(), dst.clone());
        if self.link_index.contains_key(&pair) {
            return Err(MalformedSpecError::DuplicateLink { src: src.to_string(), dst: dst.to_string() });
        }

        for (field, value) in [("latency", latency), ("bandwidth", capacity)] {
            if value < 0.0 {
                return Err(MalformedSpecError::NegativeCapacity { id: format!("{} -> {}", src, dst), field });
            }
        }

        let key = self.links.insert(Link::new(src.clone(), dst.clone(), latency, capacity));
        self.link_index.insert(pair, key);
        if let Some(node) = self.node_mut(&src) {
            node.links.insert(dst, key);
        }

        Ok(key)
    }

    /// Registers a route `src -> dst` over the given hops.
    ///
    /// Every hop must name an existing link. Hops that do not chain up
    /// (`hop[i].dst != hop[i + 1].src`) are accepted but logged.
    pub fn add_path(&mut self, src: NodeId, dst: NodeId, hops: &[(NodeId, NodeId)]) -> Result<PathKey, MalformedSpecError> {
        let context = format!("Path {} -> {}", src, dst);
        self.ensure_node(&context, &src)?;
        self.ensure_node(&context, &dst)?;

        if hops.is_empty() {
            return Err(MalformedSpecError::EmptyPath { src: src.to_string(), dst: dst.to_string() });
        }

        let pair = (src.clone(), dst.clone());
        if self.path_index.contains_key(&pair) {
            return Err(MalformedSpecError::DuplicatePath { src: src.to_string(), dst: dst.to_string() });
        }

        let mut link_keys = Vec::with_capacity(hops.len());
        for (hop_src, hop_dst) in hops {
            let Some(key) = self.link_index.get(&(hop_src.clone(), hop_dst.clone())) else {
                return Err(MalformedSpecError::UnknownLink {
                    path_src: src.to_string(),
                    path_dst: dst.to_string(),
                    src: hop_src.to_string(),
                    dst: hop_dst.to_string(),
                });
            };
            link_keys.push(*key);
        }

        let chained = hops.windows(2).all(|pair| pair[0].1 == pair[1].0);
        if !chained || hops[0].0 != src || hops[hops.len() - 1].1 != dst {
            log::warn!("InconsistentPath: The hops of path {} -> {} do not form a contiguous route.", src, dst);
        }

        let mut path = Path::new(src.clone(), dst.clone(), link_keys);
        path.recompute(&self.links);

        let key = self.paths.insert(path);
        self.path_index.insert(pair, key);
        if let Some(node) = self.node_mut(&src) {
            node.paths.insert(dst, key);
        }

        Ok(key)
    }

    fn ensure_node(&self, context: &str, id: &NodeId) -> Result<(), MalformedSpecError> {
        if self.node_index.contains_key(id) {
            Ok(())
        } else {
            Err(MalformedSpecError::UnknownNode { context: context.to_string(), node: id.to_string() })
        }
    }

    //---------------------
    // --- Node Methods ---
    //---------------------

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.node_index.get(id).map(|&position| &self.nodes[position])
    }

    pub(crate) fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.node_index.get(id).map(|&position| &mut self.nodes[position])
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Sum over the node's outgoing links of `capacity - used_bandwidth`.
    ///
    /// A coarse per-node bandwidth budget. Unknown nodes have a budget of zero.
    pub fn link_total_free_capacity(&self, id: &NodeId) -> f64 {
        self.node(id).map(|node| node.links.values().filter_map(|key| self.links.get(*key)).map(Link::free_bandwidth).sum()).unwrap_or(0.0)
    }

    /// Sum of `capacity` over the node's outgoing links.
    pub fn link_total_capacity(&self, id: &NodeId) -> f64 {
        self.node(id).map(|node| node.links.values().filter_map(|key| self.links.get(*key)).map(|link| link.capacity).sum()).unwrap_or(0.0)
    }

    /// Sum of the bottleneck bandwidth over every path stored on the node.
    pub fn gateway_bandwidth(&self, id: &NodeId) -> f64 {
        self.node(id).map(|node| node.paths.values().filter_map(|key| self.paths.get(*key)).map(|path| path.bottleneck_bandwidth).sum()).unwrap_or(0.0)
    }

    //---------------------
    // --- Link Methods ---
    //---------------------

    pub fn link(&self, src: &NodeId, dst: &NodeId) -> Option<&Link> {
        self.link_index.get(&(src.clone(), dst.clone())).and_then(|key| self.links.get(*key))
    }

    pub fn link_by_key(&self, key: LinkKey) -> Option<&Link> {
        self.links.get(key)
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    //---------------------
    // --- Path Methods ---
    //---------------------

    pub fn path_key(&self, src: &NodeId, dst: &NodeId) -> Option<PathKey> {
        self.path_index.get(&(src.clone(), dst.clone())).copied()
    }

    pub fn path(&self, src: &NodeId, dst: &NodeId) -> Option<&Path> {
        self.path_key(src, dst).and_then(|key| self.paths.get(key))
    }

    pub fn path_by_key(&self, key: PathKey) -> Option<&Path> {
        self.paths.get(key)
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.paths.values()
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// Adds `delta` to the usage of every link on the path.
    ///
    /// No capacity is enforced here, an over-commit simply leaves a negative
    /// residual. Cached bottlenecks are not touched, see
    /// [`Topology::recompute_all_bottlenecks`].
    pub fn update_path_bandwidth(&mut self, key: PathKey, delta: f64) {
        let Some(path) = self.paths.get(key) else {
            log::warn!("UnknownPath: update_path_bandwidth called with a stale path key {:?}.", key);
            return;
        };

        for link_key in &path.links {
            if let Some(link) = self.links.get_mut(*link_key) {
                link.add_usage(delta);
            }
        }
    }

    /// Refreshes the cached bottlenecks of every stored path from current link state.
    pub fn recompute_all_bottlenecks(&mut self) {
        for path in self.paths.values_mut() {
            path.recompute(&self.links);
        }
    }

    /// True iff the stored path `src -> dst` has `bottleneck_bandwidth > demand`.
    ///
    /// A missing path never has bandwidth available.
    pub fn path_bandwidth_available(&self, src: &NodeId, dst: &NodeId, demand: f64) -> bool {
        self.path(src, dst).is_some_and(|path| path.is_bandwidth_available(demand))
    }

    //-------------------------
    // --- Snapshot Methods ---
    //-------------------------

    pub fn snapshot(&self) -> TopologySnapshot {
        TopologySnapshot { nodes: self.nodes.clone(), links: self.links.clone(), paths: self.paths.clone() }
    }

    /// Reinstates a snapshot taken from this topology.
    ///
    /// The name indices are left alone, they never change after loading.
    pub fn restore(&mut self, snapshot: TopologySnapshot) {
        self.nodes = snapshot.nodes;
        self.links = snapshot.links;
        self.paths = snapshot.paths;
    }

    /// Logs the usage of every node and the bottlenecks of every path.
    pub fn log_state(&self) {
        for node in &self.nodes {
            let total_bandwidth = self.link_total_capacity(&node.id);
            let free_bandwidth = self.link_total_free_capacity(&node.id);
            log::info!(
                "Node {}: cpu {}/{}, memory {}/{}, bandwidth {}/{}{}",
                node.id,
                node.used_cpu,
                node.cpu_capacity,
                node.used_memory,
                node.memory_capacity,
                total_bandwidth - free_bandwidth,
                total_bandwidth,
                if node.is_gateway { " (gateway)" } else { "" }
            );

            for path_key in node.paths.values() {
                if let Some(path) = self.paths.get(*path_key) {
                    let hops: Vec<String> =
                        path.links.iter().filter_map(|key| self.links.get(*key)).map(|link| format!("{}->{}", link.src, link.dst)).collect();
                    log::debug!(
                        "  Path {} -> {}: bottleneck bw {}, bottleneck latency {}, hops {:?}",
                        path.src,
                        path.dst,
                        path.bottleneck_bandwidth,
                        path.bottleneck_latency,
                        hops
                    );
                }
            }
        }
    }
}
