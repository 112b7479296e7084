use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::classification::domain::guidance::GuidanceKey;
use crate::classification::domain::observation::Observation;
use crate::trigger::domain::readiness_accumulator::{AccumulateContext, TriggerSignal};
use crate::trigger::domain::trigger_config::{ConfigError, TriggerConfig};

use super::domain::collaborators::{
    CaptureArtifact, CaptureCompletion, CaptureOrigin, CaptureOutcome, CaptureRequest,
    GuidanceAcknowledgement, GuidanceAlert, GuidanceSink, PhotoAcquirer, SessionCallbacks,
};
use super::domain::engine_state::{CapturePhase, EngineSnapshot, EngineState};
use super::domain::validation_summary::ValidationSummary;

/// Result of a user-initiated capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualCaptureOutcome {
    Accepted,
    /// The last observation showed only the disallowed class.
    RejectedWrongClass(GuidanceKey),
    /// A capture is already in flight or done.
    RejectedBusy,
}

/// Work decided under the lock and carried out after releasing it.
enum Effect {
    StartCapture {
        generation: u64,
        request: CaptureRequest,
    },
    Alert {
        generation: u64,
        alert: GuidanceAlert,
    },
}

enum Notification {
    Captured(CaptureArtifact),
    Failed(String),
}

struct Session {
    /// Bumped on every reset; async results carry the value they started with.
    generation: u64,
    state: EngineState,
}

impl Session {
    fn process(&mut self, observation: Observation) -> Option<Effect> {
        if self.state.capture_locked() {
            // In flight or done: observations only feed the summary.
            self.state.last_observation = Some(observation);
            return None;
        }
        if self.state.phase == CapturePhase::Idle {
            self.state.phase = CapturePhase::Accumulating;
        }

        let at = observation.observed_at;
        let ctx = AccumulateContext {
            in_cooldown: self.state.cooldown.is_active(at),
            capture_locked: self.state.capture_locked(),
            wrong_alert_shown: self.state.wrong_alert_shown,
        };
        let signal = self.state.accumulator.accumulate(&observation, ctx);
        log::trace!(
            "observation conf={:.2} target={} wrong={} -> ready={} wrong={}",
            observation.confidence,
            observation.target_class_present,
            observation.wrong_class_present,
            self.state.accumulator.ready_count(),
            self.state.accumulator.wrong_count(),
        );

        let effect = match signal {
            Some(TriggerSignal::AutoCapture) => {
                log::info!("Auto-capture triggered");
                Some(self.begin_capture(CaptureOrigin::Automatic, Some(&observation)))
            }
            Some(TriggerSignal::WrongClass(reason)) => {
                let until = self.state.cooldown.enter(at);
                self.state.wrong_alert_shown = true;
                self.state.accumulator.clear();
                log::info!("Wrong class confirmed ({reason}), cooling down");
                Some(Effect::Alert {
                    generation: self.generation,
                    alert: GuidanceAlert {
                        reason,
                        origin: CaptureOrigin::Automatic,
                        cooldown_until: Some(until),
                    },
                })
            }
            None => None,
        };

        self.state.last_observation = Some(observation);
        effect
    }

    fn manual(&mut self) -> (ManualCaptureOutcome, Option<Effect>) {
        if self.state.capture_locked() {
            log::debug!("Manual capture rejected: capture already in progress or done");
            return (ManualCaptureOutcome::RejectedBusy, None);
        }

        let wrong_reason = self
            .state
            .last_observation
            .as_ref()
            .filter(|obs| obs.is_wrong_class_only())
            .map(Observation::guidance);
        if let Some(reason) = wrong_reason {
            // No cooldown here, unlike the automatic path.
            self.state.accumulator.clear();
            log::info!("Manual capture rejected: {reason}");
            let effect = Effect::Alert {
                generation: self.generation,
                alert: GuidanceAlert {
                    reason,
                    origin: CaptureOrigin::Manual,
                    cooldown_until: None,
                },
            };
            return (ManualCaptureOutcome::RejectedWrongClass(reason), Some(effect));
        }

        log::info!("Manual capture accepted");
        let last = self.state.last_observation.clone();
        let effect = self.begin_capture(CaptureOrigin::Manual, last.as_ref());
        (ManualCaptureOutcome::Accepted, Some(effect))
    }

    /// Check-and-set of the capture flags. Callers hold the lock.
    fn begin_capture(&mut self, origin: CaptureOrigin, source: Option<&Observation>) -> Effect {
        self.state.is_capturing = true;
        self.state.has_captured = true;
        self.state.phase = CapturePhase::Triggered;
        self.state.accumulator.clear();

        let source = source.filter(|obs| obs.target_class_present);
        Effect::StartCapture {
            generation: self.generation,
            request: CaptureRequest {
                origin,
                extracted_fields: source
                    .map(|obs| obs.extracted_fields.clone())
                    .unwrap_or_default(),
                observed_at: source.map(|obs| obs.observed_at),
            },
        }
    }

    fn complete(&mut self, generation: u64, outcome: CaptureOutcome) -> Option<Notification> {
        if generation != self.generation {
            log::debug!(
                "Discarding capture result from session {generation} (now {})",
                self.generation
            );
            return None;
        }
        if !matches!(
            self.state.phase,
            CapturePhase::Triggered | CapturePhase::Capturing
        ) {
            log::debug!("Discarding capture result in phase {:?}", self.state.phase);
            return None;
        }

        self.state.is_capturing = false;
        match outcome {
            CaptureOutcome::Succeeded(artifact) => {
                log::info!("Capture succeeded: {artifact}");
                self.state.phase = CapturePhase::Captured;
                self.state.artifact = Some(artifact.clone());
                Some(Notification::Captured(artifact))
            }
            CaptureOutcome::Failed(reason) => {
                log::warn!("Capture failed: {reason}");
                self.state.phase = CapturePhase::Idle;
                self.state.has_captured = false;
                self.state.accumulator.clear();
                Some(Notification::Failed(reason))
            }
        }
    }

    fn acknowledge(&mut self, generation: u64) {
        if generation != self.generation {
            log::debug!("Ignoring acknowledgement from session {generation}");
            return;
        }
        self.state.wrong_alert_shown = false;
        self.state.accumulator.clear();
        // A capture in flight or finished keeps the session locked.
        if !self.state.is_capturing && self.state.phase != CapturePhase::Captured {
            self.state.has_captured = false;
        }
        log::debug!("Guidance acknowledged");
    }
}

struct Shared {
    config: TriggerConfig,
    session: Mutex<Session>,
    acquirer: Box<dyn PhotoAcquirer>,
    guidance: Box<dyn GuidanceSink>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionCallbacks for Shared {
    fn complete_capture(&self, generation: u64, outcome: CaptureOutcome) {
        let notification = self.lock().complete(generation, outcome);
        match notification {
            Some(Notification::Captured(artifact)) => self.guidance.captured(&artifact),
            Some(Notification::Failed(reason)) => self.guidance.capture_failed(&reason),
            None => {}
        }
    }

    fn acknowledge(&self, generation: u64) {
        self.lock().acknowledge(generation);
    }
}

/// Top-level capture state machine for one capture screen.
///
/// All state changes go through a single lock, so concurrently completing
/// classifications, manual requests and acquirer callbacks are serialized.
/// Collaborators are always invoked after the lock is released.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct CaptureOrchestrator {
    shared: Arc<Shared>,
}

impl CaptureOrchestrator {
    /// Validates `config` and starts an idle session.
    pub fn new(
        config: TriggerConfig,
        acquirer: Box<dyn PhotoAcquirer>,
        guidance: Box<dyn GuidanceSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = EngineState::new(&config);
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                session: Mutex::new(Session {
                    generation: 0,
                    state,
                }),
                acquirer,
                guidance,
            }),
        })
    }

    /// Feeds one observation through the accumulator, firing a capture or a
    /// guidance alert when a threshold is reached.
    pub fn submit(&self, observation: Observation) {
        let effect = self.shared.lock().process(observation);
        if let Some(effect) = effect {
            self.run(effect);
        }
    }

    /// User-initiated capture. Bypasses the readiness threshold but not the
    /// wrong-class guard.
    pub fn manual_capture(&self) -> ManualCaptureOutcome {
        let (outcome, effect) = self.shared.lock().manual();
        if let Some(effect) = effect {
            self.run(effect);
        }
        outcome
    }

    /// Restores the initial state. Results of captures started before the
    /// reset are discarded when they arrive.
    pub fn reset(&self) {
        let mut session = self.shared.lock();
        session.generation += 1;
        session.state = EngineState::new(&self.shared.config);
        log::info!("Capture session reset (generation {})", session.generation);
    }

    pub fn retake(&self) {
        self.reset();
    }

    /// Summary of the most recently processed observation, if any.
    pub fn validation_summary(&self) -> Option<ValidationSummary> {
        self.shared
            .lock()
            .state
            .last_observation
            .as_ref()
            .map(ValidationSummary::from_observation)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.shared.lock().state.snapshot()
    }

    pub fn phase(&self) -> CapturePhase {
        self.shared.lock().state.phase
    }

    pub fn generation(&self) -> u64 {
        self.shared.lock().generation
    }

    pub fn artifact(&self) -> Option<CaptureArtifact> {
        self.shared.lock().state.artifact.clone()
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.shared.config
    }

    fn run(&self, effect: Effect) {
        match effect {
            Effect::StartCapture {
                generation,
                request,
            } => {
                let completion = CaptureCompletion::new(self.callbacks(), generation);
                self.shared.acquirer.acquire(request, completion);

                // The acquirer may already have resolved the capture.
                let mut session = self.shared.lock();
                if session.generation == generation
                    && session.state.phase == CapturePhase::Triggered
                {
                    session.state.phase = CapturePhase::Capturing;
                }
            }
            Effect::Alert { generation, alert } => {
                let ack = GuidanceAcknowledgement::new(self.callbacks(), generation);
                self.shared.guidance.alert(alert, ack);
            }
        }
    }

    fn callbacks(&self) -> Weak<dyn SessionCallbacks> {
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        weak
    }
}
