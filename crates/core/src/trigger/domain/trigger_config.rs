use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::DEFAULT_COOLDOWN_MS;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be at least 1")]
    ZeroThreshold(&'static str),
    #[error("{name} must be between 0.0 and 1.0, got {value}")]
    ConfidenceOutOfRange { name: &'static str, value: f32 },
}

/// Named thresholds for one capture session.
///
/// Supplied at session start; the engine has no built-in fallback values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Consecutive on-target observations required to auto-capture.
    pub ready_threshold: u32,
    /// Consecutive off-target observations required to raise guidance.
    pub wrong_threshold: u32,
    /// Minimum confidence (inclusive) for an on-target observation to count.
    pub target_threshold: f32,
    /// Confidence an off-target observation must exceed to count.
    pub wrong_confidence_floor: f32,
    /// Suppression window after a confirmed wrong-class episode.
    pub cooldown_duration_ms: u64,
}

impl TriggerConfig {
    /// Back of an identity document. MRZ reads are fast and reliable, so a
    /// short run is enough.
    pub fn document_back() -> Self {
        Self {
            ready_threshold: 3,
            wrong_threshold: 10,
            target_threshold: 0.6,
            wrong_confidence_floor: 0.3,
            cooldown_duration_ms: DEFAULT_COOLDOWN_MS,
        }
    }

    pub fn document_front() -> Self {
        Self::document_back()
    }

    /// Selfie capture. Requires ~3 s of sustained face presence at the
    /// default sampling rate.
    pub fn selfie() -> Self {
        Self {
            ready_threshold: 20,
            wrong_threshold: 10,
            target_threshold: 0.7,
            wrong_confidence_floor: 0.3,
            cooldown_duration_ms: DEFAULT_COOLDOWN_MS,
        }
    }

    pub fn cooldown_duration(&self) -> Duration {
        Duration::from_millis(self.cooldown_duration_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ready_threshold == 0 {
            return Err(ConfigError::ZeroThreshold("ready_threshold"));
        }
        if self.wrong_threshold == 0 {
            return Err(ConfigError::ZeroThreshold("wrong_threshold"));
        }
        check_unit("target_threshold", self.target_threshold)?;
        check_unit("wrong_confidence_floor", self.wrong_confidence_floor)?;
        Ok(())
    }
}

fn check_unit(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ConfidenceOutOfRange { name, value })
    }
}
