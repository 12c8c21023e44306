use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::domain::application::application::{Application, TieBreak};
use crate::domain::evaluator::{FeasibilityEvaluator, OversubscriptionReport};
use crate::domain::scheduler::node_order::NodeOrder;
use crate::domain::scheduler::outcome::ScheduleOutcome;
use crate::domain::scheduler::scheduler_type::SchedulerType;
use crate::domain::topology::topology::Topology;
use crate::error::{ConversionError, Result};
use crate::loader::input::SchedulingInput;

/// Which scheduler variants a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SchedulerSelection {
    Single(SchedulerType),
    /// Every variant, each on its own copy of the topology.
    Both,
}

impl Default for SchedulerSelection {
    fn default() -> Self {
        SchedulerSelection::Single(SchedulerType::Mesh)
    }
}

impl SchedulerSelection {
    pub fn scheduler_types(&self) -> Vec<SchedulerType> {
        match self {
            SchedulerSelection::Single(scheduler_type) => vec![*scheduler_type],
            SchedulerSelection::Both => SchedulerType::ALL.to_vec(),
        }
    }
}

impl FromStr for SchedulerSelection {
    type Err = ConversionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("both") {
            return Ok(SchedulerSelection::Both);
        }
        s.parse::<SchedulerType>().map(SchedulerSelection::Single)
    }
}

impl TryFrom<String> for SchedulerSelection {
    type Error = ConversionError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for SchedulerSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerSelection::Single(scheduler_type) => write!(f, "{}", scheduler_type),
            SchedulerSelection::Both => write!(f, "both"),
        }
    }
}

impl From<SchedulerSelection> for String {
    fn from(selection: SchedulerSelection) -> Self {
        selection.to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSettings {
    pub selection: SchedulerSelection,
    /// Overrides the variant's own node order when set.
    pub node_order: Option<NodeOrder>,
    pub tie_break: TieBreak,
}

/// Everything one scheduler variant produced for the input.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub scheduler: SchedulerType,
    pub node_order: NodeOrder,
    #[serde(flatten)]
    pub outcome: ScheduleOutcome,
    pub oversubscription: OversubscriptionReport,
    pub total_deficit: f64,
    pub elapsed_ms: f64,
}

/// Schedules `application` with one variant on `topology` and evaluates the result.
///
/// Blocking, the topology is consumed by the engine.
pub fn run_variant(
    scheduler_type: SchedulerType,
    application: &Application,
    topology: Topology,
    settings: &RunSettings,
    cancellation: CancellationToken,
) -> RunReport {
    let mut engine = scheduler_type.get_instance(topology).with_tie_break(settings.tie_break).with_cancellation(cancellation);
    if let Some(node_order) = settings.node_order {
        engine = engine.with_node_order(node_order);
    }

    let start = Instant::now();
    let outcome = engine.schedule(application);
    let elapsed = start.elapsed();

    log::info!("{} scheduler finished in {:?} (feasible = {}).", scheduler_type, elapsed, outcome.feasible);
    engine.topology().log_state();

    let oversubscription = FeasibilityEvaluator::evaluate(&engine, &outcome);

    RunReport {
        scheduler: scheduler_type,
        node_order: engine.node_order(),
        total_deficit: oversubscription.total_deficit(),
        outcome,
        oversubscription,
        elapsed_ms: elapsed.as_secs_f64() * 1000.0,
    }
}

/// Runs every selected variant, concurrently when there is more than one.
///
/// Each variant gets its own clone of the topology and runs on the blocking
/// pool. A single `schedule()` call is never split across tasks.
pub async fn run(input: SchedulingInput, settings: RunSettings, cancellation: CancellationToken) -> Result<Vec<RunReport>> {
    let application = Arc::new(input.application);
    let settings = Arc::new(settings);

    let mut handles = Vec::new();
    for scheduler_type in settings.selection.scheduler_types() {
        let application = Arc::clone(&application);
        let settings = Arc::clone(&settings);
        let topology = input.topology.clone();
        let cancellation = cancellation.clone();

        handles.push(tokio::task::spawn_blocking(move || run_variant(scheduler_type, &application, topology, &settings, cancellation)));
    }

    let mut reports = Vec::with_capacity(handles.len());
    for handle in handles {
        reports.push(handle.await?);
    }

    Ok(reports)
}
