pub mod engine;
pub mod fit_policy;
pub mod node_order;
pub mod outcome;
pub mod scheduler_type;
