pub mod application;
pub mod evaluator;
pub mod scheduler;
pub mod topology;
pub mod utils;
