pub mod generator;
pub mod github;
pub mod notify;
pub mod orchestrator;
