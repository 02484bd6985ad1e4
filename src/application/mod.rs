// Background sensor sampling
pub mod poller;

// Agent orchestrator
pub mod system;
