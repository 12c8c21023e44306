use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse input JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to parse input CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Malformed input description: {0}")]
    MalformedSpec(#[from] MalformedSpecError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("Scheduling task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Structural problems in an application, topology or paths description.
///
/// These are fatal to the load step, scheduling never starts on a model that
/// produced one of them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MalformedSpecError {
    #[error("Component '{0}' is declared more than once")]
    DuplicateComponent(String),

    #[error("Dependency {src} -> {dst} references unknown component '{component}'")]
    UnknownComponent { src: String, dst: String, component: String },

    #[error("Dependency {src} -> {dst} is declared more than once")]
    DuplicateDependency { src: String, dst: String },

    #[error("Negative {field} demand on '{id}'")]
    NegativeDemand { id: String, field: &'static str },

    #[error("Negative {field} capacity on '{id}'")]
    NegativeCapacity { id: String, field: &'static str },

    #[error("Node '{0}' is declared more than once")]
    DuplicateNode(String),

    #[error("{context} references unknown node '{node}'")]
    UnknownNode { context: String, node: String },

    #[error("Link {src} -> {dst} is declared more than once")]
    DuplicateLink { src: String, dst: String },

    #[error("Path {path_src} -> {path_dst} has a hop {src} -> {dst} without a matching link")]
    UnknownLink { path_src: String, path_dst: String, src: String, dst: String },

    #[error("Path {src} -> {dst} has no hops")]
    EmptyPath { src: String, dst: String },

    #[error("Path {src} -> {dst} is declared more than once")]
    DuplicatePath { src: String, dst: String },

    #[error("Next-hop routing from {src} to {dst} does not terminate (stuck at '{at}')")]
    RoutingLoop { src: String, dst: String, at: String },

    #[error("Next-hop routing from {src} to {dst} has no entry or link at '{at}'")]
    DanglingNextHop { src: String, dst: String, at: String },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConversionError {
    #[error("Unknown scheduler type: '{0}'")]
    UnknownSchedulerType(String),

    #[error("Unknown node order: '{0}'")]
    UnknownNodeOrder(String),

    #[error("Unknown tie break: '{0}'")]
    UnknownTieBreak(String),
}

pub type Result<T> = std::result::Result<T, Error>;
