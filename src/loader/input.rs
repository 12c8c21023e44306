use std::path::Path;

use crate::api::application_dto::ApplicationDto;
use crate::api::topology_dto::{PathsDto, TopologyDto};
use crate::domain::application::application::Application;
use crate::domain::topology::topology::Topology;
use crate::error::Result;
use crate::loader::csv_input::read_csv_dir;
use crate::loader::parser::parse_json_file;

/// A validated application together with the topology it is placed onto.
#[derive(Debug, Clone)]
pub struct SchedulingInput {
    pub application: Application,
    pub topology: Topology,
}

impl SchedulingInput {
    pub fn from_dtos(application: ApplicationDto, topology: TopologyDto, paths: PathsDto) -> Result<Self> {
        let application = Application::from_dto(application)?;
        let topology = Topology::from_dto(topology, paths)?;

        Ok(Self { application, topology })
    }

    /// Loads the three JSON documents. Without a paths file the topology has no routes.
    pub fn from_json_files(application: impl AsRef<Path>, topology: impl AsRef<Path>, paths: Option<&Path>) -> Result<Self> {
        let application_dto: ApplicationDto = parse_json_file(application)?;
        let topology_dto: TopologyDto = parse_json_file(topology)?;
        let paths_dto: PathsDto = match paths {
            Some(paths) => parse_json_file(paths)?,
            None => {
                log::warn!("No paths file given, the topology has no precomputed routes.");
                PathsDto::default()
            }
        };

        Self::from_dtos(application_dto, topology_dto, paths_dto)
    }

    pub fn from_csv_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let input = read_csv_dir(dir)?;
        Self::from_dtos(input.application, input.topology, input.paths)
    }
}
