pub mod agent;
pub mod guardrails;
pub mod session_manager;
pub mod telemetry;
