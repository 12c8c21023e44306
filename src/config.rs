use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::application::application::TieBreak;
use crate::domain::scheduler::node_order::NodeOrder;
use crate::error::Result;
use crate::loader::parser::parse_json_file;
use crate::runner::SchedulerSelection;

/// Run settings read from a JSON config file. Every field is optional, a
/// value given on the command line always wins over the file.
///
/// ```json
/// { "scheduler": "both", "nodeOrder": "pack", "tieBreak": "lexicographic", "logLevel": "debug" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub scheduler: Option<SchedulerSelection>,
    #[serde(default)]
    pub node_order: Option<NodeOrder>,
    #[serde(default)]
    pub tie_break: Option<TieBreak>,
    #[serde(default)]
    pub log_level: Option<String>,
}

impl RunConfig {
    pub fn from_file(file_path: impl AsRef<Path>) -> Result<Self> {
        parse_json_file(file_path)
    }

    /// Fields set in `overrides` replace the ones in `self`.
    pub fn merge(self, overrides: RunConfig) -> RunConfig {
        RunConfig {
            scheduler: overrides.scheduler.or(self.scheduler),
            node_order: overrides.node_order.or(self.node_order),
            tie_break: overrides.tie_break.or(self.tie_break),
            log_level: overrides.log_level.or(self.log_level),
        }
    }
}
