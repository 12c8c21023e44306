pub mod application;
pub mod component;
pub mod dependency;
