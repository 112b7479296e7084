use std::collections::HashMap;
use std::sync::Weak;
use std::time::Instant;

use crate::classification::domain::guidance::GuidanceKey;

/// Who asked for the capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOrigin {
    Automatic,
    Manual,
}

/// Reference to a captured photo, as returned by the acquirer (file path,
/// upload handle, ...). Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureArtifact(pub String);

impl std::fmt::Display for CaptureArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the acquirer needs to take the photo.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    pub origin: CaptureOrigin,
    /// Fields read from the last on-target observation, if any.
    pub extracted_fields: HashMap<String, String>,
    /// Timestamp of the observation that led to the trigger.
    pub observed_at: Option<Instant>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Succeeded(CaptureArtifact),
    Failed(String),
}

/// User-facing guidance raised by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuidanceAlert {
    pub reason: GuidanceKey,
    pub origin: CaptureOrigin,
    /// End of the suppression window. Only automatic alerts start one.
    pub cooldown_until: Option<Instant>,
}

/// Receiver side of the handles below. Implemented by the orchestrator.
pub(crate) trait SessionCallbacks: Send + Sync {
    fn complete_capture(&self, generation: u64, outcome: CaptureOutcome);
    fn acknowledge(&self, generation: u64);
}

/// One-shot completion handle for an in-flight capture.
///
/// May be resolved from any thread. Results from a session that has since
/// been reset are discarded. Dropping the handle unresolved counts as a
/// failure, so a lost acquirer can never leave the session stuck.
pub struct CaptureCompletion {
    target: Option<Weak<dyn SessionCallbacks>>,
    generation: u64,
}

impl CaptureCompletion {
    pub(crate) fn new(target: Weak<dyn SessionCallbacks>, generation: u64) -> Self {
        Self {
            target: Some(target),
            generation,
        }
    }

    pub fn succeed(mut self, artifact: CaptureArtifact) {
        self.resolve(CaptureOutcome::Succeeded(artifact));
    }

    pub fn fail(mut self, reason: impl Into<String>) {
        self.resolve(CaptureOutcome::Failed(reason.into()));
    }

    fn resolve(&mut self, outcome: CaptureOutcome) {
        if let Some(target) = self.target.take().and_then(|weak| weak.upgrade()) {
            target.complete_capture(self.generation, outcome);
        }
    }
}

impl Drop for CaptureCompletion {
    fn drop(&mut self) {
        if self.target.is_some() {
            log::warn!("Capture completion dropped without a result");
            self.resolve(CaptureOutcome::Failed("capture abandoned".to_string()));
        }
    }
}

impl std::fmt::Debug for CaptureCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureCompletion")
            .field("generation", &self.generation)
            .field("resolved", &self.target.is_none())
            .finish()
    }
}

/// Handed to the guidance sink with every alert. Acknowledging lets the
/// session retry.
pub struct GuidanceAcknowledgement {
    target: Weak<dyn SessionCallbacks>,
    generation: u64,
}

impl GuidanceAcknowledgement {
    pub(crate) fn new(target: Weak<dyn SessionCallbacks>, generation: u64) -> Self {
        Self { target, generation }
    }

    pub fn acknowledge(self) {
        if let Some(target) = self.target.upgrade() {
            target.acknowledge(self.generation);
        }
    }
}

impl std::fmt::Debug for GuidanceAcknowledgement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuidanceAcknowledgement")
            .field("generation", &self.generation)
            .finish()
    }
}

/// Takes the actual photo.
///
/// Must not block: start the acquisition and resolve `completion` later,
/// from any thread.
pub trait PhotoAcquirer: Send + Sync {
    fn acquire(&self, request: CaptureRequest, completion: CaptureCompletion);
}

/// Presentation-side receiver for guidance and capture results.
pub trait GuidanceSink: Send + Sync {
    fn alert(&self, alert: GuidanceAlert, ack: GuidanceAcknowledgement);

    fn capture_failed(&self, reason: &str);

    fn captured(&self, _artifact: &CaptureArtifact) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder {
        completions: Mutex<Vec<(u64, CaptureOutcome)>>,
        acks: Mutex<Vec<u64>>,
    }

    impl SessionCallbacks for Recorder {
        fn complete_capture(&self, generation: u64, outcome: CaptureOutcome) {
            self.completions.lock().unwrap().push((generation, outcome));
        }

        fn acknowledge(&self, generation: u64) {
            self.acks.lock().unwrap().push(generation);
        }
    }

    fn weak(recorder: &Arc<Recorder>) -> Weak<dyn SessionCallbacks> {
        let target: Arc<dyn SessionCallbacks> = recorder.clone();
        Arc::downgrade(&target)
    }

    #[test]
    fn test_succeed_reports_once() {
        let recorder = Arc::new(Recorder::default());
        let completion = CaptureCompletion::new(weak(&recorder), 3);

        completion.succeed(CaptureArtifact("photo.jpg".into()));

        let calls = recorder.completions.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            (3, CaptureOutcome::Succeeded(CaptureArtifact("photo.jpg".into())))
        );
    }

    #[test]
    fn test_drop_without_result_reports_failure() {
        let recorder = Arc::new(Recorder::default());
        drop(CaptureCompletion::new(weak(&recorder), 1));

        let calls = recorder.completions.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls[0].1, CaptureOutcome::Failed(_)));
    }

    #[test]
    fn test_completion_after_target_dropped_is_noop() {
        let recorder = Arc::new(Recorder::default());
        let completion = CaptureCompletion::new(weak(&recorder), 1);
        drop(recorder);
        completion.fail("late");
    }

    #[test]
    fn test_acknowledge_forwards_generation() {
        let recorder = Arc::new(Recorder::default());
        GuidanceAcknowledgement::new(weak(&recorder), 7).acknowledge();
        assert_eq!(*recorder.acks.lock().unwrap(), vec![7]);
    }
}
