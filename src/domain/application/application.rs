use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::application_dto::ApplicationDto;
use crate::domain::application::component::Component;
use crate::domain::application::dependency::Dependency;
use crate::domain::utils::id::ComponentId;
use crate::error::{ConversionError, MalformedSpecError};

/// Result of a topological sort over the dependency graph.
///
/// `order` runs from sources to sinks. It is empty whenever `feasible` is
/// false, a partial order is never handed out for a cyclic graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologicalOrder {
    pub order: Vec<ComponentId>,
    pub feasible: bool,
}

impl TopologicalOrder {
    fn infeasible() -> Self {
        Self { order: Vec::new(), feasible: false }
    }
}

/// How ready (zero indegree) components are ordered against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// FIFO in discovery order. The initial ready set follows component
    /// declaration order, later ones follow dependency declaration order.
    #[default]
    Declaration,
    /// Smallest component id first.
    Lexicographic,
}

impl FromStr for TieBreak {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "declaration" | "fifo" => Ok(TieBreak::Declaration),
            "lexicographic" | "id" => Ok(TieBreak::Lexicographic),
            _ => Err(ConversionError::UnknownTieBreak(s.to_string())),
        }
    }
}

/// The component graph of a distributed application.
///
/// Invariant: every dependency's endpoints reference existing components, and
/// there is at most one dependency per ordered `(src, dst)` pair.
#[derive(Debug, Clone, Default)]
pub struct Application {
    components: HashMap<ComponentId, Component>,

    /// Component ids in declaration order.
    component_order: Vec<ComponentId>,

    /// All dependencies in declaration order.
    dependencies: Vec<Dependency>,

    /// `(src, dst)` to position in `dependencies`.
    dependency_index: HashMap<(ComponentId, ComponentId), usize>,

    /// `src` to positions in `dependencies`, in declaration order.
    outgoing_index: HashMap<ComponentId, Vec<usize>>,
}

impl Application {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the application model from its description.
    ///
    /// Fails if a component id is duplicated, a demand is negative, a
    /// dependency names an unknown component, or the same ordered pair is
    /// declared twice. Cycles are *not* rejected here, they surface as an
    /// infeasible [`TopologicalOrder`].
    pub fn from_dto(dto: ApplicationDto) -> Result<Self, MalformedSpecError> {
        let mut application = Application::new();

        for component_dto in &dto.components {
            application.add_component(Component::from(component_dto))?;
        }

        for dependency_dto in &dto.dependencies {
            application.add_dependency(Dependency::from(dependency_dto))?;
        }

        log::info!("Loaded application with {} components and {} dependencies.", application.component_count(), application.dependency_count());

        Ok(application)
    }

    pub fn add_component(&mut self, component: Component) -> Result<(), MalformedSpecError> {
        if self.components.contains_key(&component.id) {
            return Err(MalformedSpecError::DuplicateComponent(component.id.to_string()));
        }

        for (field, value) in [("cpu", component.cpu as f64), ("memory", component.memory as f64), ("gateway bandwidth", component.gateway_bandwidth)] {
            if value < 0.0 {
                return Err(MalformedSpecError::NegativeDemand { id: component.id.to_string(), field });
            }
        }

        self.component_order.push(component.id.clone());
        self.components.insert(component.id.clone(), component);
        Ok(())
    }

    pub fn add_dependency(&mut self, dependency: Dependency) -> Result<(), MalformedSpecError> {
        for endpoint in [&dependency.src, &dependency.dst] {
            if !self.components.contains_key(endpoint) {
                return Err(MalformedSpecError::UnknownComponent {
                    src: dependency.src.to_string(),
                    dst: dependency.dst.to_string(),
                    component: endpoint.to_string(),
                });
            }
        }

        let key = (dependency.src.clone(), dependency.dst.clone());
        if self.dependency_index.contains_key(&key) {
            return Err(MalformedSpecError::DuplicateDependency { src: dependency.src.to_string(), dst: dependency.dst.to_string() });
        }

        if dependency.bandwidth < 0.0 {
            return Err(MalformedSpecError::NegativeDemand { id: format!("{} -> {}", dependency.src, dependency.dst), field: "bandwidth" });
        }

        let position = self.dependencies.len();
        self.outgoing_index.entry(dependency.src.clone()).or_default().push(position);
        self.dependency_index.insert(key, position);
        self.dependencies.push(dependency);
        Ok(())
    }

    pub fn component(&self, id: &ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    /// Components in declaration order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.component_order.iter().filter_map(|id| self.components.get(id))
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn dependency_count(&self) -> usize {
        self.dependencies.len()
    }

    pub fn dependency(&self, src: &ComponentId, dst: &ComponentId) -> Option<&Dependency> {
        self.dependency_index.get(&(src.clone(), dst.clone())).map(|&position| &self.dependencies[position])
    }

    /// Dependencies leaving `src`, in declaration order.
    pub fn outgoing<'a>(&'a self, src: &ComponentId) -> impl Iterator<Item = &'a Dependency> + use<'a> {
        self.outgoing_index.get(src).into_iter().flatten().map(|&position| &self.dependencies[position])
    }

    /// Sum of the bandwidth demands of all dependencies leaving `src`.
    pub fn outgoing_bandwidth(&self, src: &ComponentId) -> f64 {
        self.outgoing(src).map(|dependency| dependency.bandwidth).sum()
    }

    /// Dependencies with `id` as either endpoint, in declaration order.
    pub fn dependencies_touching<'a>(&'a self, id: &'a ComponentId) -> impl Iterator<Item = &'a Dependency> + 'a {
        self.dependencies.iter().filter(move |dependency| &dependency.src == id || &dependency.dst == id)
    }

    /// Kahn's algorithm with a FIFO ready queue.
    ///
    /// The queue is seeded with zero-indegree components in declaration order;
    /// successors that reach zero indegree are appended in the order their
    /// dependencies were declared. The result therefore depends on declaration
    /// order, it is not a canonical sort.
    pub fn topological_order(&self) -> TopologicalOrder {
        let mut indegree = self.indegrees();
        let mut queue: VecDeque<&ComponentId> = self.component_order.iter().filter(|id| indegree[*id] == 0).collect();
        let mut order = Vec::with_capacity(self.component_order.len());
        let mut active_edges = self.dependencies.len();

        while let Some(current) = queue.pop_front() {
            order.push(current.clone());

            for dependency in self.outgoing(current) {
                active_edges -= 1;
                if let Some(count) = indegree.get_mut(&dependency.dst) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(&dependency.dst);
                    }
                }
            }
        }

        self.finish_order(order, active_edges)
    }

    /// Kahn's algorithm where the ready set is ordered by `comparator`.
    ///
    /// Each step removes the smallest ready component. Components the
    /// comparator considers equal keep their discovery order.
    pub fn topological_order_by<F>(&self, comparator: F) -> TopologicalOrder
    where
        F: Fn(&Component, &Component) -> Ordering,
    {
        let mut indegree = self.indegrees();
        let mut ready: Vec<&ComponentId> = self.component_order.iter().filter(|id| indegree[*id] == 0).collect();
        let mut order = Vec::with_capacity(self.component_order.len());
        let mut active_edges = self.dependencies.len();

        while !ready.is_empty() {
            let mut best = 0;
            for candidate in 1..ready.len() {
                if comparator(&self.components[ready[candidate]], &self.components[ready[best]]) == Ordering::Less {
                    best = candidate;
                }
            }
            let current = ready.remove(best);
            order.push(current.clone());

            for dependency in self.outgoing(current) {
                active_edges -= 1;
                if let Some(count) = indegree.get_mut(&dependency.dst) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push(&dependency.dst);
                    }
                }
            }
        }

        self.finish_order(order, active_edges)
    }

    pub fn topological_order_with(&self, tie_break: TieBreak) -> TopologicalOrder {
        match tie_break {
            TieBreak::Declaration => self.topological_order(),
            TieBreak::Lexicographic => self.topological_order_by(|a, b| a.id.cmp(&b.id)),
        }
    }

    fn indegrees(&self) -> HashMap<ComponentId, usize> {
        let mut indegree: HashMap<ComponentId, usize> = self.component_order.iter().map(|id| (id.clone(), 0)).collect();
        for dependency in &self.dependencies {
            *indegree.entry(dependency.dst.clone()).or_insert(0) += 1;
        }
        indegree
    }

    fn finish_order(&self, order: Vec<ComponentId>, active_edges: usize) -> TopologicalOrder {
        if active_edges > 0 {
            log::warn!("CyclicDependency: {} dependency edges remain active after topological sort.", active_edges);
            return TopologicalOrder::infeasible();
        }

        log::debug!("Topological order: {:?}", order.iter().map(|id| id.as_str()).collect::<Vec<_>>());
        TopologicalOrder { order, feasible: true }
    }
}
