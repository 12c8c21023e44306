use std::fmt::Debug;

use crate::domain::application::application::Application;
use crate::domain::application::component::Component;
use crate::domain::scheduler::node_order::NodeOrder;
use crate::domain::scheduler::outcome::Assignment;
use crate::domain::topology::node::Node;
use crate::domain::topology::topology::Topology;

/// Everything a fit test may look at. Read-only by construction.
#[derive(Debug, Clone, Copy)]
pub struct FitContext<'a> {
    pub component: &'a Component,
    pub node: &'a Node,
    pub topology: &'a Topology,
    pub application: &'a Application,
    /// Placements made so far in the current attempt.
    pub assignment: &'a Assignment,
}

/// The part of first-fit placement that differs between scheduler variants.
///
/// The engine owns the loop (ordering, cursor, bookkeeping); a policy only
/// decides whether a component fits a node and how the engine should treat
/// topology state around an attempt.
pub trait FitPolicy: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Node order used unless the caller overrides it.
    fn default_node_order(&self) -> NodeOrder;

    /// Whether the engine snapshots the topology and restores it on failure.
    fn rolls_back(&self) -> bool;

    fn fits(&self, ctx: &FitContext<'_>) -> bool;
}

/// Cluster-style fit: cpu and memory only.
///
/// Bandwidth is still booked after every placement but never blocks one, so
/// paths may end up oversubscribed. That is surfaced afterwards by the
/// feasibility evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceOnlyFitPolicy;

impl FitPolicy for ResourceOnlyFitPolicy {
    fn name(&self) -> &'static str {
        "cluster"
    }

    fn default_node_order(&self) -> NodeOrder {
        NodeOrder::Spread
    }

    fn rolls_back(&self) -> bool {
        false
    }

    fn fits(&self, ctx: &FitContext<'_>) -> bool {
        ctx.node.can_host(ctx.component.cpu, ctx.component.memory)
    }
}

/// Mesh-style fit: cpu/memory plus gateway, link budget and per-path bandwidth.
///
/// Each dependency is checked against its own path in isolation. Dependencies
/// of the same component that share a physical link are not reserved jointly,
/// so they can pass one by one and still oversubscribe that link together.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathAwareFitPolicy;

impl PathAwareFitPolicy {
    /// (b) Sum of the bottlenecks of all the node's paths covers the gateway demand.
    fn gateway_fits(ctx: &FitContext<'_>) -> bool {
        if !ctx.component.needs_gateway() {
            return true;
        }

        let available = ctx.topology.gateway_bandwidth(&ctx.node.id);
        if available < ctx.component.gateway_bandwidth {
            log::debug!(
                "GatewayBandwidth: {} needs {} but node {} offers {}.",
                ctx.component.id,
                ctx.component.gateway_bandwidth,
                ctx.node.id,
                available
            );
            return false;
        }
        true
    }

    /// (c) Outgoing dependency demand stays within the node's free link capacity.
    fn link_budget_fits(ctx: &FitContext<'_>) -> bool {
        let demand = ctx.application.outgoing_bandwidth(&ctx.component.id);
        let available = ctx.topology.link_total_free_capacity(&ctx.node.id);

        if demand > available {
            log::debug!("LinkBudget: {} needs {} total bandwidth but node {} has {} free.", ctx.component.id, demand, ctx.node.id, available);
            return false;
        }
        true
    }

    /// (d) Every dependency to an already placed component on another node has
    /// a path with strictly more free bandwidth than it demands.
    fn placed_dependencies_fit(ctx: &FitContext<'_>) -> bool {
        let component_id = &ctx.component.id;

        for dependency in ctx.application.dependencies_touching(component_id) {
            let Some(other) = dependency.other_end(component_id) else {
                continue;
            };
            let Some(other_host) = ctx.assignment.node_of(other) else {
                continue;
            };
            if other_host == &ctx.node.id {
                continue;
            }

            let (src_host, dst_host) = if &dependency.src == component_id { (&ctx.node.id, other_host) } else { (other_host, &ctx.node.id) };

            if !ctx.topology.path_bandwidth_available(src_host, dst_host, dependency.bandwidth) {
                log::debug!(
                    "PathBandwidth: dependency {} -> {} ({}) does not fit on path {} -> {}.",
                    dependency.src,
                    dependency.dst,
                    dependency.bandwidth,
                    src_host,
                    dst_host
                );
                return false;
            }
        }
        true
    }
}

impl FitPolicy for PathAwareFitPolicy {
    fn name(&self) -> &'static str {
        "mesh"
    }

    fn default_node_order(&self) -> NodeOrder {
        NodeOrder::Pack
    }

    fn rolls_back(&self) -> bool {
        true
    }

    fn fits(&self, ctx: &FitContext<'_>) -> bool {
        ctx.node.can_host(ctx.component.cpu, ctx.component.memory)
            && Self::gateway_fits(ctx)
            && Self::link_budget_fits(ctx)
            && Self::placed_dependencies_fit(ctx)
    }
}
