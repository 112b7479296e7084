use crate::classification::domain::guidance::GuidanceKey;
use crate::classification::domain::observation::Observation;

use super::trigger_config::TriggerConfig;

/// Session flags the accumulator consults but does not own.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccumulateContext {
    pub in_cooldown: bool,
    /// A capture is in flight or has already succeeded.
    pub capture_locked: bool,
    pub wrong_alert_shown: bool,
}

/// Decision produced by one accumulation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSignal {
    AutoCapture,
    WrongClass(GuidanceKey),
}

/// Hysteresis counters for a noisy classifier.
///
/// Two mutually exclusive run lengths: on-target and off-target. A matching
/// observation extends its run and zeroes the other; an ambiguous one zeroes
/// both. Each run fires once it reaches its threshold.
#[derive(Debug, Clone)]
pub struct ReadinessAccumulator {
    ready_threshold: u32,
    wrong_threshold: u32,
    target_threshold: f32,
    wrong_confidence_floor: f32,
    ready_count: u32,
    wrong_count: u32,
}

impl ReadinessAccumulator {
    pub fn new(config: &TriggerConfig) -> Self {
        Self {
            ready_threshold: config.ready_threshold,
            wrong_threshold: config.wrong_threshold,
            target_threshold: config.target_threshold,
            wrong_confidence_floor: config.wrong_confidence_floor,
            ready_count: 0,
            wrong_count: 0,
        }
    }

    pub fn ready_count(&self) -> u32 {
        self.ready_count
    }

    pub fn wrong_count(&self) -> u32 {
        self.wrong_count
    }

    pub fn clear(&mut self) {
        self.ready_count = 0;
        self.wrong_count = 0;
    }

    pub fn accumulate(
        &mut self,
        observation: &Observation,
        ctx: AccumulateContext,
    ) -> Option<TriggerSignal> {
        if ctx.in_cooldown {
            self.clear();
            return None;
        }

        if observation.target_class_present
            && observation.confidence >= self.target_threshold
            && !ctx.capture_locked
        {
            self.ready_count = self.ready_count.saturating_add(1);
            self.wrong_count = 0;
        } else if observation.is_wrong_class_only()
            && observation.confidence > self.wrong_confidence_floor
        {
            self.wrong_count = self.wrong_count.saturating_add(1);
            self.ready_count = 0;
        } else {
            self.clear();
        }

        if self.ready_count >= self.ready_threshold {
            Some(TriggerSignal::AutoCapture)
        } else if self.wrong_count >= self.wrong_threshold
            && !ctx.wrong_alert_shown
            && !ctx.capture_locked
        {
            Some(TriggerSignal::WrongClass(observation.guidance()))
        } else {
            None
        }
    }
}
