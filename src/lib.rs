use std::path::Path;

use crate::domain::scheduler::outcome::ScheduleOutcome;
use crate::domain::scheduler::scheduler_type::SchedulerType;
use crate::domain::topology::topology::Topology;
use crate::error::Result;
use crate::loader::input::SchedulingInput;

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;
pub mod runner;

/// Loads the JSON inputs and schedules them with one variant.
///
/// Returns the outcome together with the topology as the engine left it.
pub fn schedule_from_files(
    scheduler_type: SchedulerType,
    application_path: impl AsRef<Path>,
    topology_path: impl AsRef<Path>,
    paths_path: impl AsRef<Path>,
) -> Result<(ScheduleOutcome, Topology)> {
    let input = SchedulingInput::from_json_files(application_path, topology_path, Some(paths_path.as_ref()))?;
    log::info!("Input loaded successfully.");

    let mut engine = scheduler_type.get_instance(input.topology);
    let outcome = engine.schedule(&input.application);

    Ok((outcome, engine.into_topology()))
}
