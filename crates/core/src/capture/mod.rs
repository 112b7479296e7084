pub mod capture_orchestrator;
pub mod domain;
pub mod infrastructure;
