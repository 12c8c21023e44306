use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::api::application_dto::{ApplicationDto, ComponentDto, DependencyDto};
use crate::api::csv_dto::{ComponentRecord, DependencyRecord, LinkRecord, NextHopRecord, NodeRecord};
use crate::api::topology_dto::{HopDto, LinkDto, NodeDto, PathDto, PathsDto, TopologyDto};
use crate::error::{MalformedSpecError, Result};
use crate::loader::parser::parse_csv_file;

pub const NODES_FILE: &str = "nodes.csv";
pub const LINKS_FILE: &str = "links.csv";
pub const PATHS_FILE: &str = "paths.csv";
pub const APPLICATION_FILE: &str = "app.csv";
pub const DEPENDENCIES_FILE: &str = "deps.csv";

/// Raw descriptions read from a batch-runner input directory.
#[derive(Debug, Clone)]
pub struct CsvInput {
    pub application: ApplicationDto,
    pub topology: TopologyDto,
    pub paths: PathsDto,
}

/// Reads `nodes.csv`, `links.csv`, `paths.csv`, `app.csv` and `deps.csv` from `dir`.
///
/// `paths.csv` is a next-hop routing table and is resolved into explicit hop
/// lists here. `deps.csv` may be absent for an application without dependencies.
pub fn read_csv_dir(dir: impl AsRef<Path>) -> Result<CsvInput> {
    let dir = dir.as_ref();
    log::info!("Reading CSV input from {}", dir.display());

    let nodes: Vec<NodeRecord> = parse_csv_file(dir.join(NODES_FILE))?;
    let links: Vec<LinkRecord> = parse_csv_file(dir.join(LINKS_FILE))?;
    let next_hops: Vec<NextHopRecord> = parse_csv_file(dir.join(PATHS_FILE))?;
    let components: Vec<ComponentRecord> = parse_csv_file(dir.join(APPLICATION_FILE))?;

    let dependencies_path = dir.join(DEPENDENCIES_FILE);
    let dependencies: Vec<DependencyRecord> = if dependencies_path.exists() { parse_csv_file(dependencies_path)? } else { Vec::new() };

    let topology = TopologyDto {
        nodes: nodes
            .into_iter()
            .map(|record| NodeDto { id: record.node_id, cpu: record.cpu, memory: record.memory_mb, is_gateway: record.is_gw.unwrap_or(false) })
            .collect(),
        links: links
            .into_iter()
            .map(|record| LinkDto {
                src: record.src,
                dst: record.dst,
                latency_ms: record.latency_ms.unwrap_or(0.0),
                bandwidth_capacity: record.bw_mbps,
            })
            .collect(),
    };

    let paths = resolve_next_hops(&topology.links, &next_hops)?;

    let application = ApplicationDto {
        components: components
            .into_iter()
            .map(|record| ComponentDto { id: record.name, cpu: record.cpu, memory: record.memory, gateway_bandwidth: record.gw_bw.unwrap_or(0.0) })
            .collect(),
        dependencies: dependencies
            .into_iter()
            .map(|record| DependencyDto {
                src: record.src,
                dst: record.dst,
                latency_bound_ms: record.latency_ms.unwrap_or(0.0),
                bandwidth_demand: record.bw_mbps,
            })
            .collect(),
    };

    Ok(CsvInput { application, topology, paths })
}

/// Turns a next-hop routing table into explicit paths.
///
/// Every link yields a single-hop path between its endpoints. A routing
/// entry `(src, dst, next_hop)` replaces that with the route obtained by
/// following next hops towards `dst`. Where the table has no entry for an
/// intermediate node, a direct link to `dst` finishes the route.
pub fn resolve_next_hops(links: &[LinkDto], table: &[NextHopRecord]) -> std::result::Result<PathsDto, MalformedSpecError> {
    let link_pairs: HashSet<(&str, &str)> = links.iter().map(|link| (link.src.as_str(), link.dst.as_str())).collect();

    let mut next_hop: HashMap<(&str, &str), &str> = HashMap::new();
    for entry in table {
        if entry.src == entry.dst {
            log::debug!("Ignoring self route for {}.", entry.src);
            continue;
        }
        if next_hop.insert((entry.src.as_str(), entry.dst.as_str()), entry.next_hop.as_str()).is_some() {
            return Err(MalformedSpecError::DuplicatePath { src: entry.src.clone(), dst: entry.dst.clone() });
        }
    }

    let mut paths = Vec::new();

    for link in links {
        if !next_hop.contains_key(&(link.src.as_str(), link.dst.as_str())) {
            paths.push(PathDto { src: link.src.clone(), dst: link.dst.clone(), hops: vec![HopDto { src: link.src.clone(), dst: link.dst.clone() }] });
        }
    }

    let mut resolved: HashSet<(&str, &str)> = HashSet::new();

    for entry in table {
        let (src, dst) = (entry.src.as_str(), entry.dst.as_str());
        if src == dst || !resolved.insert((src, dst)) {
            continue;
        }

        let mut hops = Vec::new();
        let mut visited: HashSet<&str> = HashSet::from([src]);
        let mut at = src;
        while at != dst {
            let next = match next_hop.get(&(at, dst)) {
                Some(next) => *next,
                None if link_pairs.contains(&(at, dst)) => dst,
                None => return Err(MalformedSpecError::DanglingNextHop { src: src.to_string(), dst: dst.to_string(), at: at.to_string() }),
            };

            // A route towards one destination never passes the same node twice.
            if !visited.insert(next) {
                return Err(MalformedSpecError::RoutingLoop { src: src.to_string(), dst: dst.to_string(), at: next.to_string() });
            }

            hops.push(HopDto { src: at.to_string(), dst: next.to_string() });
            at = next;
        }

        paths.push(PathDto { src: src.to_string(), dst: dst.to_string(), hops });
    }

    log::debug!("Resolved {} routing entries and {} links into {} paths.", table.len(), links.len(), paths.len());

    Ok(PathsDto { paths })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(src: &str, dst: &str) -> LinkDto {
        LinkDto { src: src.to_string(), dst: dst.to_string(), latency_ms: 0.0, bandwidth_capacity: 10.0 }
    }

    fn route(src: &str, dst: &str, next_hop: &str) -> NextHopRecord {
        NextHopRecord { src: src.to_string(), dst: dst.to_string(), next_hop: next_hop.to_string() }
    }

    fn hops(path: &PathDto) -> Vec<(String, String)> {
        path.hops.iter().map(|hop| (hop.src.clone(), hop.dst.clone())).collect()
    }

    #[test]
    fn test_every_link_yields_a_direct_path() {
        let paths = resolve_next_hops(&[link("a", "b"), link("b", "a")], &[]).unwrap();

        assert_eq!(paths.paths.len(), 2);
        assert_eq!(hops(&paths.paths[0]), vec![("a".to_string(), "b".to_string())]);
    }

    #[test]
    fn test_next_hops_are_followed_to_destination() {
        let links = [link("a", "b"), link("b", "c"), link("a", "c")];
        let table = [route("a", "c", "b")];

        let paths = resolve_next_hops(&links, &table).unwrap();
        let a_to_c = paths.paths.iter().find(|path| path.src == "a" && path.dst == "c").unwrap();

        assert_eq!(hops(a_to_c), vec![("a".to_string(), "b".to_string()), ("b".to_string(), "c".to_string())]);
        assert_eq!(paths.paths.iter().filter(|path| path.src == "a" && path.dst == "c").count(), 1);
    }

    #[test]
    fn test_routing_loop_is_rejected() {
        let links = [link("a", "b"), link("b", "a"), link("b", "c")];
        let table = [route("a", "c", "b"), route("b", "c", "a")];

        let err = resolve_next_hops(&links, &table).unwrap_err();
        assert_eq!(err, MalformedSpecError::RoutingLoop { src: "a".to_string(), dst: "c".to_string(), at: "a".to_string() });
    }

    #[test]
    fn test_dangling_next_hop_after_every_link_is_used() {
        // The route a -> b -> c uses both links before reaching c, which has no entry towards d.
        let links = [link("a", "b"), link("b", "c")];
        let table = [route("a", "d", "b"), route("b", "d", "c")];

        let err = resolve_next_hops(&links, &table).unwrap_err();
        assert_eq!(err, MalformedSpecError::DanglingNextHop { src: "a".to_string(), dst: "d".to_string(), at: "c".to_string() });
    }

    #[test]
    fn test_dangling_next_hop_is_rejected() {
        let links = [link("a", "b")];
        let table = [route("a", "c", "b")];

        let err = resolve_next_hops(&links, &table).unwrap_err();
        assert_eq!(err, MalformedSpecError::DanglingNextHop { src: "a".to_string(), dst: "c".to_string(), at: "b".to_string() });
    }
}
