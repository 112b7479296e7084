use std::time::Instant;

use serde::Serialize;

use crate::classification::domain::observation::Observation;
use crate::trigger::domain::cooldown_gate::CooldownGate;
use crate::trigger::domain::readiness_accumulator::ReadinessAccumulator;
use crate::trigger::domain::trigger_config::TriggerConfig;

use super::collaborators::CaptureArtifact;

/// Capture lifecycle. Cooldown is an overlay on `Accumulating`, not a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapturePhase {
    /// Fresh session, nothing observed yet.
    Idle,
    Accumulating,
    /// A trigger fired; the acquirer is being invoked.
    Triggered,
    /// The acquirer accepted the request; awaiting its completion.
    Capturing,
    /// Terminal until reset.
    Captured,
}

/// Mutable state of one capture session.
///
/// Only the orchestrator holds one, behind its lock.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub(crate) accumulator: ReadinessAccumulator,
    pub(crate) cooldown: CooldownGate,
    pub(crate) has_captured: bool,
    pub(crate) is_capturing: bool,
    pub(crate) wrong_alert_shown: bool,
    pub(crate) phase: CapturePhase,
    pub(crate) last_observation: Option<Observation>,
    pub(crate) artifact: Option<CaptureArtifact>,
}

impl EngineState {
    pub fn new(config: &TriggerConfig) -> Self {
        Self {
            accumulator: ReadinessAccumulator::new(config),
            cooldown: CooldownGate::new(config.cooldown_duration()),
            has_captured: false,
            is_capturing: false,
            wrong_alert_shown: false,
            phase: CapturePhase::Idle,
            last_observation: None,
            artifact: None,
        }
    }

    /// In flight or already captured: no further trigger may start.
    pub fn capture_locked(&self) -> bool {
        self.is_capturing || self.has_captured
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            phase: self.phase,
            ready_count: self.accumulator.ready_count(),
            wrong_count: self.accumulator.wrong_count(),
            has_captured: self.has_captured,
            is_capturing: self.is_capturing,
            cooldown_until: self.cooldown.until(),
            wrong_alert_shown: self.wrong_alert_shown,
        }
    }
}

/// Read-only copy of the session state, for inspection and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSnapshot {
    pub phase: CapturePhase,
    pub ready_count: u32,
    pub wrong_count: u32,
    pub has_captured: bool,
    pub is_capturing: bool,
    pub cooldown_until: Option<Instant>,
    pub wrong_alert_shown: bool,
}
