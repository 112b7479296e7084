pub mod collaborators;
pub mod engine_state;
pub mod validation_summary;
