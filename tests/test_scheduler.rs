use mesh_bw_scheduler::domain::application::application::Application;
use mesh_bw_scheduler::domain::application::component::Component;
use mesh_bw_scheduler::domain::application::dependency::Dependency;
use mesh_bw_scheduler::domain::evaluator::FeasibilityEvaluator;
use mesh_bw_scheduler::domain::scheduler::engine::PlacementEngine;
use mesh_bw_scheduler::domain::scheduler::node_order::NodeOrder;
use mesh_bw_scheduler::domain::scheduler::outcome::{Infeasibility, ScheduleOutcome};
use mesh_bw_scheduler::domain::scheduler::scheduler_type::SchedulerType;
use mesh_bw_scheduler::domain::topology::node::Node;
use mesh_bw_scheduler::domain::topology::topology::Topology;
use mesh_bw_scheduler::domain::utils::id::{ComponentId, NodeId};
use tokio_util::sync::CancellationToken;

fn create_topology(nodes: &[(&str, i64, i64)], links: &[(&str, &str, f64)], routes: &[&[&str]]) -> Topology {
    let mut topology = Topology::new();
    for (id, cpu, memory) in nodes {
        topology.add_node(Node::new(NodeId::new(*id), *cpu, *memory, false)).unwrap();
    }
    for (src, dst, capacity) in links {
        topology.add_link(NodeId::new(*src), NodeId::new(*dst), 1.0, *capacity).unwrap();
    }
    for route in routes {
        let hops: Vec<(NodeId, NodeId)> = route.windows(2).map(|pair| (NodeId::new(pair[0]), NodeId::new(pair[1]))).collect();
        topology.add_path(NodeId::new(route[0]), NodeId::new(route[route.len() - 1]), &hops).unwrap();
    }
    topology
}

fn create_application(components: &[(&str, i64, i64)], dependencies: &[(&str, &str, f64)]) -> Application {
    let mut application = Application::new();
    for (id, cpu, memory) in components {
        application.add_component(Component::new(*id, *cpu, *memory)).unwrap();
    }
    for (src, dst, bandwidth) in dependencies {
        application.add_dependency(Dependency::new(*src, *dst, 0.0, *bandwidth)).unwrap();
    }
    application
}

/// Bit-exact fingerprint of every mutable counter in the topology.
fn fingerprint(topology: &Topology) -> String {
    serde_json::to_string(&topology.snapshot()).unwrap()
}

fn host(outcome: &ScheduleOutcome, component: &str) -> String {
    outcome.assignment.node_of(&ComponentId::new(component)).map(|node| node.to_string()).unwrap_or_default()
}

// Two equal nodes joined by a capacity 10 link in both directions.
fn two_node_topology() -> Topology {
    create_topology(&[("n1", 4, 4), ("n2", 4, 4)], &[("n1", "n2", 10.0), ("n2", "n1", 10.0)], &[&["n1", "n2"], &["n2", "n1"]])
}

fn chain_application() -> Application {
    create_application(&[("c1", 2, 2), ("c2", 2, 2), ("c3", 2, 2)], &[("c1", "c2", 2.0), ("c2", "c3", 3.0)])
}

// Each node fits exactly one component. n2 has plenty of total link capacity
// but its only route back to n1 has a bottleneck of 10.
fn narrow_path_topology() -> Topology {
    create_topology(
        &[("n1", 1, 1), ("n2", 1, 1), ("n3", 0, 0)],
        &[("n1", "n2", 10.0), ("n2", "n1", 10.0), ("n2", "n3", 100.0)],
        &[&["n1", "n2"], &["n2", "n1"], &["n2", "n3"]],
    )
}

fn heavy_pair_application() -> Application {
    create_application(&[("c1", 1, 1), ("c2", 1, 1)], &[("c1", "c2", 20.0)])
}

#[test]
fn test_chain_is_fully_placed_by_both_schedulers() {
    for scheduler_type in SchedulerType::ALL {
        let mut engine = scheduler_type.get_instance(two_node_topology());
        let outcome = engine.schedule(&chain_application());

        assert!(outcome.feasible, "{} should place the chain", scheduler_type);
        assert_eq!(outcome.assignment.len(), 3);
        assert_eq!(outcome.infeasibility, None);

        // Sinks are placed first and packed onto the first node until it is full.
        assert_eq!(host(&outcome, "c3"), "n1");
        assert_eq!(host(&outcome, "c2"), "n1");
        assert_eq!(host(&outcome, "c1"), "n2");
    }
}

#[test]
fn test_chain_books_bandwidth_on_the_crossing_path() {
    let mut engine = PlacementEngine::mesh(two_node_topology());
    let outcome = engine.schedule(&chain_application());
    assert!(outcome.feasible);

    let topology = engine.topology();
    let crossing = topology.path(&NodeId::new("n2"), &NodeId::new("n1")).unwrap();
    assert_eq!(crossing.bottleneck_bandwidth, 8.0);
    assert_eq!(topology.link(&NodeId::new("n2"), &NodeId::new("n1")).unwrap().used_bandwidth, 2.0);

    // c2 -> c3 stayed on n1 and costs nothing.
    assert_eq!(topology.path(&NodeId::new("n1"), &NodeId::new("n2")).unwrap().bottleneck_bandwidth, 10.0);
    assert!(FeasibilityEvaluator::evaluate(&engine, &outcome).is_clean());
}

#[test]
fn test_cycle_is_infeasible_and_leaves_topology_untouched() {
    let application = create_application(&[("c1", 1, 1), ("c2", 1, 1)], &[("c1", "c2", 1.0), ("c2", "c1", 1.0)]);

    let order = application.topological_order();
    assert!(!order.feasible);
    assert!(order.order.is_empty());

    for scheduler_type in SchedulerType::ALL {
        let mut engine = scheduler_type.get_instance(two_node_topology());
        let before = fingerprint(engine.topology());

        let outcome = engine.schedule(&application);

        assert!(!outcome.feasible);
        assert!(outcome.assignment.is_empty());
        assert_eq!(outcome.infeasibility, Some(Infeasibility::CyclicDependency));
        assert_eq!(fingerprint(engine.topology()), before);
    }
}

#[test]
fn test_single_node_exhausted_rolls_back_for_mesh() {
    let topology = create_topology(&[("n1", 1, 8)], &[], &[]);
    let application = create_application(&[("c1", 1, 1), ("c2", 1, 1)], &[]);

    let mut engine = PlacementEngine::mesh(topology);
    let outcome = engine.schedule(&application);

    assert!(!outcome.feasible);
    assert!(outcome.assignment.is_empty());
    assert_eq!(outcome.infeasibility, Some(Infeasibility::Exhausted { component: ComponentId::new("c1") }));
    assert_eq!(engine.topology().node(&NodeId::new("n1")).unwrap().used_cpu, 0);
}

#[test]
fn test_single_node_exhausted_keeps_partial_usage_for_cluster() {
    let topology = create_topology(&[("n1", 1, 8)], &[], &[]);
    let application = create_application(&[("c1", 1, 1), ("c2", 1, 1)], &[]);

    let mut engine = PlacementEngine::cluster(topology);
    let outcome = engine.schedule(&application);

    assert!(!outcome.feasible);
    assert!(outcome.assignment.is_empty());
    assert_eq!(engine.topology().node(&NodeId::new("n1")).unwrap().used_cpu, 1);
}

#[test]
fn test_mesh_rejects_dependency_exceeding_path_bottleneck() {
    let mut engine = PlacementEngine::mesh(narrow_path_topology());
    let outcome = engine.schedule(&heavy_pair_application());

    assert!(!outcome.feasible);
    assert_eq!(outcome.infeasibility, Some(Infeasibility::Exhausted { component: ComponentId::new("c1") }));
}

#[test]
fn test_cluster_accepts_same_input_and_oversubscribes() {
    let mut engine = PlacementEngine::cluster(narrow_path_topology());
    let outcome = engine.schedule(&heavy_pair_application());

    assert!(outcome.feasible);
    assert_eq!(host(&outcome, "c2"), "n1");
    assert_eq!(host(&outcome, "c1"), "n2");

    let path = engine.topology().path(&NodeId::new("n2"), &NodeId::new("n1")).unwrap();
    assert_eq!(path.bottleneck_bandwidth, -10.0);

    let report = FeasibilityEvaluator::evaluate(&engine, &outcome);
    assert_eq!(report.violation_count(), 1);
    assert_eq!(report.residual(&NodeId::new("n2"), &NodeId::new("n1")), Some(-10.0));
    assert_eq!(report.total_deficit(), 10.0);
}

#[test]
fn test_failed_mesh_attempt_restores_every_counter() {
    let mut engine = PlacementEngine::mesh(narrow_path_topology());
    let before = fingerprint(engine.topology());

    // c2 is placed on n1 before c1 runs out of nodes, so there is state to undo.
    let outcome = engine.schedule(&heavy_pair_application());

    assert!(!outcome.feasible);
    assert_eq!(fingerprint(engine.topology()), before);
    assert!(engine.topology().nodes().iter().all(|node| node.used_cpu == 0 && node.used_memory == 0));
}

#[test]
fn test_successful_schedules_respect_node_capacity() {
    let topology = create_topology(
        &[("a", 3, 6), ("b", 5, 6), ("c", 2, 2)],
        &[("a", "b", 50.0), ("b", "a", 50.0), ("b", "c", 50.0), ("c", "b", 50.0), ("a", "c", 50.0), ("c", "a", 50.0)],
        &[&["a", "b"], &["b", "a"], &["b", "c"], &["c", "b"], &["a", "c"], &["c", "a"]],
    );
    let application = create_application(
        &[("web", 2, 2), ("api", 2, 1), ("db", 1, 3), ("cache", 1, 1), ("worker", 3, 2)],
        &[("web", "api", 5.0), ("api", "db", 5.0), ("api", "cache", 2.0), ("worker", "db", 4.0)],
    );

    for scheduler_type in SchedulerType::ALL {
        let mut engine = scheduler_type.get_instance(topology.clone());
        let outcome = engine.schedule(&application);
        assert!(outcome.feasible, "{} should place the application", scheduler_type);
        assert_eq!(outcome.assignment.len(), application.component_count());

        for node in engine.topology().nodes() {
            let (cpu, memory) = outcome
                .assignment
                .components_on(&node.id)
                .filter_map(|id| application.component(id))
                .fold((0, 0), |(cpu, memory), component| (cpu + component.cpu, memory + component.memory));

            assert_eq!(node.used_cpu, cpu);
            assert_eq!(node.used_memory, memory);
            assert!(node.used_cpu <= node.cpu_capacity);
            assert!(node.used_memory <= node.memory_capacity);
        }
    }
}

#[test]
fn test_empty_application_is_feasible_without_nodes() {
    for scheduler_type in SchedulerType::ALL {
        let mut engine = scheduler_type.get_instance(Topology::new());
        let outcome = engine.schedule(&Application::new());

        assert!(outcome.feasible);
        assert!(outcome.assignment.is_empty());
    }
}

#[test]
fn test_components_without_nodes_are_exhausted() {
    let mut engine = PlacementEngine::mesh(Topology::new());
    let outcome = engine.schedule(&create_application(&[("c1", 1, 1)], &[]));

    assert_eq!(outcome.infeasibility, Some(Infeasibility::Exhausted { component: ComponentId::new("c1") }));
}

#[test]
fn test_exhausted_without_nodes_names_first_pending_component() {
    // Sinks are placed first, so c3 is the first component that finds no node.
    for scheduler_type in SchedulerType::ALL {
        let mut engine = scheduler_type.get_instance(Topology::new());
        let outcome = engine.schedule(&chain_application());

        assert!(!outcome.feasible);
        assert_eq!(outcome.infeasibility, Some(Infeasibility::Exhausted { component: ComponentId::new("c3") }));
    }
}

#[test]
fn test_demands_at_i64_max_are_exhausted_without_overflow() {
    let application = create_application(&[("c1", i64::MAX, 1), ("c2", i64::MAX, 1)], &[]);

    let mut mesh = PlacementEngine::mesh(create_topology(&[("n1", i64::MAX, i64::MAX)], &[], &[]));
    let outcome = mesh.schedule(&application);

    assert!(!outcome.feasible);
    assert_eq!(outcome.infeasibility, Some(Infeasibility::Exhausted { component: ComponentId::new("c1") }));
    assert_eq!(mesh.topology().node(&NodeId::new("n1")).unwrap().used_cpu, 0);

    let mut cluster = PlacementEngine::cluster(create_topology(&[("n1", i64::MAX, i64::MAX)], &[], &[]));
    let outcome = cluster.schedule(&application);

    assert!(!outcome.feasible);
    assert_eq!(cluster.topology().node(&NodeId::new("n1")).unwrap().used_cpu, i64::MAX);
}

#[test]
fn test_node_order_override_changes_first_choice() {
    let topology = create_topology(&[("small", 2, 2), ("large", 8, 8)], &[], &[]);
    let application = create_application(&[("c1", 1, 1)], &[]);

    let mut spread = PlacementEngine::cluster(topology.clone());
    assert_eq!(host(&spread.schedule(&application), "c1"), "large");

    let mut pack = PlacementEngine::cluster(topology).with_node_order(NodeOrder::Pack);
    assert_eq!(pack.node_order(), NodeOrder::Pack);
    assert_eq!(host(&pack.schedule(&application), "c1"), "small");
}

#[test]
fn test_mesh_requires_a_stored_path_between_hosts() {
    // No routes at all: c1 and c2 cannot share a node and cannot talk across.
    let topology = create_topology(&[("n1", 1, 1), ("n2", 1, 1)], &[("n1", "n2", 10.0), ("n2", "n1", 10.0)], &[]);
    let application = create_application(&[("c1", 1, 1), ("c2", 1, 1)], &[("c1", "c2", 1.0)]);

    let mut mesh = PlacementEngine::mesh(topology.clone());
    assert!(!mesh.schedule(&application).feasible);

    let mut cluster = PlacementEngine::cluster(topology);
    let outcome = cluster.schedule(&application);
    assert!(outcome.feasible);
    assert!(cluster.topology().links().all(|link| link.used_bandwidth == 0.0));
}

#[test]
fn test_mesh_demand_equal_to_bottleneck_is_rejected() {
    let topology = create_topology(&[("n1", 1, 1), ("n2", 1, 1)], &[("n1", "n2", 10.0), ("n2", "n1", 10.0)], &[&["n1", "n2"], &["n2", "n1"]]);

    let mut exact = PlacementEngine::mesh(topology.clone());
    assert!(!exact.schedule(&create_application(&[("c1", 1, 1), ("c2", 1, 1)], &[("c1", "c2", 10.0)])).feasible);

    let mut below = PlacementEngine::mesh(topology);
    assert!(below.schedule(&create_application(&[("c1", 1, 1), ("c2", 1, 1)], &[("c1", "c2", 9.5)])).feasible);
}

#[test]
fn test_mesh_gateway_demand_needs_path_bandwidth() {
    let topology = create_topology(&[("edge", 4, 4), ("core", 4, 4)], &[("edge", "core", 5.0), ("core", "edge", 50.0)], &[&["edge", "core"], &["core", "edge"]]);

    let mut application = Application::new();
    application.add_component(Component::new("ingress", 1, 1).with_gateway_bandwidth(20.0)).unwrap();

    // Pack order tries edge first, its only route offers 5.
    let mut engine = PlacementEngine::mesh(topology);
    let outcome = engine.schedule(&application);

    assert!(outcome.feasible);
    assert_eq!(host(&outcome, "ingress"), "core");
}

#[test]
fn test_mesh_outgoing_demand_needs_link_budget() {
    let topology = create_topology(&[("n1", 4, 4), ("n2", 4, 4)], &[("n1", "n2", 5.0), ("n2", "n1", 5.0)], &[&["n1", "n2"], &["n2", "n1"]]);
    let application = create_application(&[("c1", 1, 1), ("c2", 1, 1)], &[("c1", "c2", 6.0)]);

    let mut engine = PlacementEngine::mesh(topology);
    let outcome = engine.schedule(&application);

    assert!(!outcome.feasible);
    assert_eq!(outcome.infeasibility, Some(Infeasibility::Exhausted { component: ComponentId::new("c1") }));
}

#[test]
fn test_mesh_checks_paths_one_dependency_at_a_time() {
    // Both routes out of x share the x -> r link (capacity 10). Each 6 unit
    // dependency passes on its own, together they overshoot by 2.
    let topology = create_topology(
        &[("a", 1, 1), ("b", 1, 1), ("x", 1, 1), ("r", 0, 0), ("y", 0, 0)],
        &[("x", "r", 10.0), ("r", "a", 10.0), ("r", "b", 10.0), ("x", "y", 100.0)],
        &[&["x", "r", "a"], &["x", "r", "b"], &["x", "y"]],
    );
    let application = create_application(&[("c0", 1, 1), ("c1", 1, 1), ("c2", 1, 1)], &[("c0", "c1", 6.0), ("c0", "c2", 6.0)]);

    let mut engine = PlacementEngine::mesh(topology);
    let outcome = engine.schedule(&application);

    assert!(outcome.feasible);
    assert_eq!(host(&outcome, "c0"), "x");

    let report = FeasibilityEvaluator::evaluate(&engine, &outcome);
    assert_eq!(report.violation_count(), 2);
    assert_eq!(report.residual(&NodeId::new("x"), &NodeId::new("a")), Some(-2.0));
    assert_eq!(report.residual(&NodeId::new("x"), &NodeId::new("b")), Some(-2.0));
}

#[test]
fn test_cancelled_schedule_is_infeasible_and_rolled_back() {
    let token = CancellationToken::new();
    token.cancel();

    let mut engine = PlacementEngine::mesh(two_node_topology()).with_cancellation(token);
    let before = fingerprint(engine.topology());
    let outcome = engine.schedule(&chain_application());

    assert!(!outcome.feasible);
    assert_eq!(outcome.infeasibility, Some(Infeasibility::Cancelled));
    assert_eq!(fingerprint(engine.topology()), before);
}

#[test]
fn test_schedule_is_deterministic() {
    let first = PlacementEngine::mesh(two_node_topology()).schedule(&chain_application());
    let second = PlacementEngine::mesh(two_node_topology()).schedule(&chain_application());

    assert_eq!(first, second);
}
