pub mod cooldown_gate;
pub mod readiness_accumulator;
pub mod trigger_config;
