/// Runtime orchestration - Gateway
mod chat;
mod orchestrator;

pub use chat::ChatRunner;
pub use orchestrator::Orchestrator;
