use std::collections::VecDeque;

use tokio_util::sync::CancellationToken;

use crate::domain::application::application::{Application, TieBreak};
use crate::domain::application::component::Component;
use crate::domain::scheduler::fit_policy::{FitContext, FitPolicy, PathAwareFitPolicy, ResourceOnlyFitPolicy};
use crate::domain::scheduler::node_order::NodeOrder;
use crate::domain::scheduler::outcome::{Assignment, Infeasibility, ScheduleOutcome};
use crate::domain::topology::node::Node;
use crate::domain::topology::topology::Topology;
use crate::domain::utils::id::{ComponentId, NodeId};

/// States of the first-fit loop shared by every scheduler variant.
#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    /// Re-sort the nodes by current utilization and point the cursor at the first.
    SelectNodeOrder,
    /// Take the next component off the reversed topological order unless one is in flight.
    PickComponent,
    TestFit,
    Assign,
    /// The in-flight component did not fit the node under the cursor.
    AdvanceNode,
    Success,
    Exhausted(Infeasibility),
}

/// Mutable bookkeeping of a single `schedule()` call.
struct Attempt {
    pending: VecDeque<ComponentId>,
    in_flight: Option<ComponentId>,
    node_order: Vec<NodeId>,
    cursor: usize,
    placed_this_round: usize,
    assignment: Assignment,
}

impl Attempt {
    fn current_node(&self) -> &NodeId {
        &self.node_order[self.cursor]
    }

    /// Ends the attempt on the component that could not be placed. With nothing
    /// in flight and nothing pending every component is already placed.
    fn exhausted(&mut self) -> State {
        match self.in_flight.take().or_else(|| self.pending.pop_front()) {
            Some(component) => State::Exhausted(Infeasibility::Exhausted { component }),
            None => State::Success,
        }
    }
}

/// First-fit placement of an application's components onto a topology.
///
/// Components are taken in *reversed* topological order (sinks before
/// sources) so that when a component is placed, the components it feeds are
/// already placed and the bandwidth of the dependencies between them can be
/// booked right away. Each node is packed with as many consecutive components
/// as fit before the cursor moves on; any round that placed something
/// re-sorts the nodes and starts again from the first one.
///
/// The engine owns its topology exclusively. Scheduling is sequential and
/// deterministic, parallelism belongs to the caller (one engine per attempt).
#[derive(Debug)]
pub struct PlacementEngine {
    topology: Topology,
    policy: Box<dyn FitPolicy>,
    node_order: NodeOrder,
    tie_break: TieBreak,
    cancellation: Option<CancellationToken>,
}

impl PlacementEngine {
    pub fn new(topology: Topology, policy: Box<dyn FitPolicy>) -> Self {
        let node_order = policy.default_node_order();
        Self { topology, policy, node_order, tie_break: TieBreak::default(), cancellation: None }
    }

    /// Node-resource-only scheduler with spread ordering and no rollback.
    pub fn cluster(topology: Topology) -> Self {
        Self::new(topology, Box::new(ResourceOnlyFitPolicy))
    }

    /// Bandwidth-path-aware scheduler with pack ordering and snapshot rollback.
    pub fn mesh(topology: Topology) -> Self {
        Self::new(topology, Box::new(PathAwareFitPolicy))
    }

    pub fn with_node_order(mut self, node_order: NodeOrder) -> Self {
        self.node_order = node_order;
        self
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Checked at every component pick and node advance. Firing it ends the
    /// attempt as infeasible (rolled back if the policy rolls back).
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn into_topology(self) -> Topology {
        self.topology
    }

    pub fn policy(&self) -> &dyn FitPolicy {
        self.policy.as_ref()
    }

    pub fn node_order(&self) -> NodeOrder {
        self.node_order
    }

    /// Places every component of `application` or reports why it cannot.
    ///
    /// Infeasibility is a regular return value with an empty assignment. For a
    /// rolling-back policy the topology is restored to its pre-call state on
    /// every infeasible return; otherwise usage booked before the failure stays.
    pub fn schedule(&mut self, application: &Application) -> ScheduleOutcome {
        log::info!(
            "Scheduling {} components onto {} nodes with the {} scheduler ({:?} order).",
            application.component_count(),
            self.topology.node_count(),
            self.policy.name(),
            self.node_order
        );

        let snapshot = self.policy.rolls_back().then(|| self.topology.snapshot());

        let outcome = self.run(application);

        if !outcome.feasible {
            if let Some(snapshot) = snapshot {
                log::debug!("Restoring topology snapshot after failed {} attempt.", self.policy.name());
                self.topology.restore(snapshot);
            }
        }

        match &outcome.infeasibility {
            None => log::info!("Schedule feasible: placed {} components.", outcome.assignment.len()),
            Some(reason) => log::info!("Schedule infeasible: {}.", reason),
        }

        outcome
    }

    fn run(&mut self, application: &Application) -> ScheduleOutcome {
        let topological = application.topological_order_with(self.tie_break);
        if !topological.feasible {
            return ScheduleOutcome::infeasible(Infeasibility::CyclicDependency);
        }

        let mut attempt = Attempt {
            pending: topological.order.into_iter().rev().collect(),
            in_flight: None,
            node_order: Vec::new(),
            cursor: 0,
            placed_this_round: 0,
            assignment: Assignment::new(),
        };

        if attempt.pending.is_empty() {
            return ScheduleOutcome::success(attempt.assignment);
        }

        let mut state = State::SelectNodeOrder;
        loop {
            log::trace!("{:?} (cursor {}, in flight {:?})", state, attempt.cursor, attempt.in_flight);

            state = match state {
                State::SelectNodeOrder => {
                    attempt.node_order = self.sorted_node_ids();
                    attempt.cursor = 0;
                    attempt.placed_this_round = 0;

                    if attempt.node_order.is_empty() {
                        attempt.exhausted()
                    } else {
                        State::PickComponent
                    }
                }
                State::PickComponent => {
                    if self.is_cancelled() {
                        State::Exhausted(Infeasibility::Cancelled)
                    } else if attempt.in_flight.is_some() {
                        State::TestFit
                    } else {
                        match attempt.pending.pop_front() {
                            Some(next) => {
                                attempt.in_flight = Some(next);
                                State::TestFit
                            }
                            None => State::Success,
                        }
                    }
                }
                State::TestFit => {
                    if self.test_fit(application, &attempt) { State::Assign } else { State::AdvanceNode }
                }
                State::Assign => {
                    self.assign(application, &mut attempt);
                    State::PickComponent
                }
                State::AdvanceNode => {
                    if self.is_cancelled() {
                        State::Exhausted(Infeasibility::Cancelled)
                    } else if attempt.placed_this_round > 0 {
                        // Utilization changed, the order may have too.
                        State::SelectNodeOrder
                    } else {
                        attempt.cursor += 1;
                        if attempt.cursor == attempt.node_order.len() {
                            attempt.exhausted()
                        } else {
                            State::PickComponent
                        }
                    }
                }
                State::Success => return ScheduleOutcome::success(attempt.assignment),
                State::Exhausted(reason) => return ScheduleOutcome::infeasible(reason),
            };
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    fn sorted_node_ids(&self) -> Vec<NodeId> {
        let mut nodes: Vec<&Node> = self.topology.nodes().iter().collect();
        self.node_order.sort(&mut nodes);
        nodes.into_iter().map(|node| node.id.clone()).collect()
    }

    fn in_flight_component<'a>(application: &'a Application, attempt: &Attempt) -> Option<&'a Component> {
        attempt.in_flight.as_ref().and_then(|id| application.component(id))
    }

    fn test_fit(&self, application: &Application, attempt: &Attempt) -> bool {
        let (Some(component), Some(node)) = (Self::in_flight_component(application, attempt), self.topology.node(attempt.current_node())) else {
            return false;
        };

        let ctx = FitContext { component, node, topology: &self.topology, application, assignment: &attempt.assignment };
        let fits = self.policy.fits(&ctx);

        if !fits {
            log::debug!("Cannot fit {} on node {}.", component.id, node.id);
        }
        fits
    }

    /// Books the in-flight component on the node under the cursor.
    ///
    /// CPU and memory are consumed on the node, then every dependency between
    /// this component and an already placed one on a different node is booked
    /// on the stored path between the two hosts, in the dependency's
    /// direction. All path bottlenecks are refreshed after each booking since
    /// paths share links.
    fn assign(&mut self, application: &Application, attempt: &mut Attempt) {
        let Some(component) = Self::in_flight_component(application, attempt) else {
            return;
        };
        let node_id = attempt.current_node().clone();

        if let Some(node) = self.topology.node_mut(&node_id) {
            node.reserve(component.cpu, component.memory);
        }
        attempt.assignment.assign(component.id.clone(), node_id.clone());

        for dependency in application.dependencies_touching(&component.id) {
            let Some(other) = dependency.other_end(&component.id) else {
                continue;
            };
            let Some(other_host) = attempt.assignment.node_of(other) else {
                continue;
            };
            if other_host == &node_id {
                continue;
            }

            let (src_host, dst_host) = if dependency.src == component.id { (&node_id, other_host) } else { (other_host, &node_id) };

            match self.topology.path_key(src_host, dst_host) {
                Some(path_key) => {
                    self.topology.update_path_bandwidth(path_key, dependency.bandwidth);
                    self.topology.recompute_all_bottlenecks();
                }
                None => log::warn!(
                    "NoPathFound: dependency {} -> {} placed on {} -> {} has no stored path, bandwidth not booked.",
                    dependency.src,
                    dependency.dst,
                    src_host,
                    dst_host
                ),
            }
        }

        log::debug!("Assigned {} to node {}.", component.id, node_id);

        attempt.placed_this_round += 1;
        attempt.in_flight = None;
    }
}
