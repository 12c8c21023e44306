pub mod link;
pub mod node;
pub mod path;
pub mod topology;
