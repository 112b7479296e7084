use std::error::Error;
use std::sync::{Arc, Mutex};

use crate::capture::capture_orchestrator::{CaptureOrchestrator, ManualCaptureOutcome};
use crate::capture::domain::collaborators::{CaptureArtifact, GuidanceSink, PhotoAcquirer};
use crate::capture::domain::engine_state::{CapturePhase, EngineSnapshot};
use crate::capture::domain::validation_summary::ValidationSummary;
use crate::classification::domain::frame_classifier::FrameClassifier;
use crate::classification::domain::observation::Observation;
use crate::shared::constants::DEFAULT_DECIMATION;
use crate::shared::frame::Frame;
use crate::trigger::domain::trigger_config::TriggerConfig;

use super::capture_target::CaptureTarget;
use super::classification_dispatcher::{
    lock_logger, ClassificationDispatcher, ClassificationStage, DispatchOutcome,
    DispatcherConfig, SharedLogger,
};
use super::frame_sampler::FrameSampler;
use super::infrastructure::inline_classification_dispatcher::InlineClassificationDispatcher;
use super::infrastructure::threaded_classification_dispatcher::ThreadedClassificationDispatcher;
use super::session_logger::SessionLogger;

/// Tunables for one capture session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub trigger: TriggerConfig,
    pub decimation: usize,
    pub dispatcher: DispatcherConfig,
}

impl SessionOptions {
    pub fn for_target(target: CaptureTarget) -> Self {
        Self {
            trigger: target.preset(),
            decimation: DEFAULT_DECIMATION,
            dispatcher: DispatcherConfig::default(),
        }
    }
}

/// Runs one capture screen end to end.
///
/// Wires `FrameSampler → dispatcher [classify/adapt] → CaptureOrchestrator`.
/// The camera thread calls `push_frame` for every frame; the UI calls
/// `manual_capture`, `retake` and reads `summary`.
pub struct CaptureSessionUseCase {
    target: CaptureTarget,
    sampler: FrameSampler,
    orchestrator: CaptureOrchestrator,
    dispatcher: Box<dyn ClassificationDispatcher>,
    logger: SharedLogger,
}

impl CaptureSessionUseCase {
    pub fn new(
        target: CaptureTarget,
        options: SessionOptions,
        classifier: Arc<dyn FrameClassifier>,
        acquirer: Box<dyn PhotoAcquirer>,
        guidance: Box<dyn GuidanceSink>,
        logger: Box<dyn SessionLogger>,
    ) -> Result<Self, Box<dyn Error>> {
        let sampler = FrameSampler::new(options.decimation)?;
        let orchestrator = CaptureOrchestrator::new(options.trigger, acquirer, guidance)?;
        let logger: SharedLogger = Arc::new(Mutex::new(logger));

        let sink = orchestrator.clone();
        let stage = ClassificationStage::new(
            classifier,
            target.adapter(),
            Arc::new(move |observation: Observation| sink.submit(observation)),
            logger.clone(),
        );
        let dispatcher: Box<dyn ClassificationDispatcher> = if options.dispatcher.workers == 0 {
            Box::new(InlineClassificationDispatcher::new(stage))
        } else {
            Box::new(ThreadedClassificationDispatcher::new(options.dispatcher, stage))
        };

        lock_logger(&logger).info(&format!(
            "Capture session started: {target}, every {} frame(s), {} worker(s)",
            options.decimation, options.dispatcher.workers
        ));

        Ok(Self {
            target,
            sampler,
            orchestrator,
            dispatcher,
            logger,
        })
    }

    /// Offers one camera frame. Returns `true` if it was handed to the
    /// classifier, `false` if it was skipped by sampling or dropped.
    pub fn push_frame(&mut self, frame: Frame) -> bool {
        let index = frame.index();
        let sampled = self.sampler.admit(index);
        lock_logger(&self.logger).frame(index, sampled);
        if !sampled {
            return false;
        }

        let depth = self.dispatcher.queue_depth();
        lock_logger(&self.logger).metric("queue_depth", depth as f64);

        match self.dispatcher.dispatch(frame) {
            DispatchOutcome::Queued => true,
            DispatchOutcome::Dropped => {
                lock_logger(&self.logger).dropped(index);
                false
            }
        }
    }

    pub fn manual_capture(&self) -> ManualCaptureOutcome {
        self.orchestrator.manual_capture()
    }

    pub fn retake(&self) {
        self.orchestrator.retake();
    }

    pub fn summary(&self) -> Option<ValidationSummary> {
        self.orchestrator.validation_summary()
    }

    pub fn phase(&self) -> CapturePhase {
        self.orchestrator.phase()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.orchestrator.snapshot()
    }

    pub fn artifact(&self) -> Option<CaptureArtifact> {
        self.orchestrator.artifact()
    }

    pub fn target(&self) -> CaptureTarget {
        self.target
    }

    pub fn orchestrator(&self) -> &CaptureOrchestrator {
        &self.orchestrator
    }

    /// Waits for in-flight classifications, then logs the session summary.
    /// The session stays readable afterwards; new frames are dropped.
    pub fn shutdown(&mut self) -> Result<(), Box<dyn Error>> {
        self.dispatcher.shutdown()?;

        let mut logger = lock_logger(&self.logger);
        logger.info(&format!(
            "Capture session ended in phase {:?} ({} sampled, {} skipped)",
            self.orchestrator.phase(),
            self.sampler.sampled(),
            self.sampler.skipped()
        ));
        logger.summary();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use crate::capture::domain::collaborators::{
        CaptureCompletion, CaptureRequest, GuidanceAcknowledgement, GuidanceAlert,
    };
    use crate::classification::domain::frame_classifier::ClassifierError;
    use crate::classification::domain::guidance::GuidanceKey;
    use crate::classification::domain::raw_classification::{
        FaceDetection, RawClassification, TextBlock, TextRecognition,
    };
    use crate::pipeline::session_logger::NullSessionLogger;

    const MRZ: [&str; 2] = [
        "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<",
        "L898902C36UTO7408122F1204159ZE184226B<<<<<10",
    ];

    // --- Stubs ---

    struct FnClassifier<F>(F);

    impl<F> FrameClassifier for FnClassifier<F>
    where
        F: Fn(&Frame) -> Option<RawClassification> + Send + Sync,
    {
        fn classify(&self, frame: &Frame) -> Result<Option<RawClassification>, ClassifierError> {
            Ok((self.0)(frame))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingAcquirer(Arc<Mutex<Vec<(CaptureRequest, CaptureCompletion)>>>);

    impl PhotoAcquirer for RecordingAcquirer {
        fn acquire(&self, request: CaptureRequest, completion: CaptureCompletion) {
            self.0.lock().unwrap().push((request, completion));
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink(Arc<Mutex<Vec<GuidanceAlert>>>);

    impl GuidanceSink for RecordingSink {
        fn alert(&self, alert: GuidanceAlert, _ack: GuidanceAcknowledgement) {
            self.0.lock().unwrap().push(alert);
        }

        fn capture_failed(&self, _reason: &str) {}
    }

    fn one_face() -> RawClassification {
        RawClassification::Faces {
            faces: vec![FaceDetection {
                confidence: 0.95,
                x: 0,
                y: 0,
                width: 0,
                height: 0,
            }],
        }
    }

    fn text(lines: &[&str]) -> RawClassification {
        RawClassification::Text(TextRecognition {
            blocks: lines
                .iter()
                .map(|l| TextBlock {
                    text: l.to_string(),
                    confidence: 0.9,
                })
                .collect(),
        })
    }

    fn inline(target: CaptureTarget) -> SessionOptions {
        SessionOptions {
            dispatcher: DispatcherConfig {
                workers: 0,
                queue_capacity: 1,
            },
            ..SessionOptions::for_target(target)
        }
    }

    fn session<F>(
        target: CaptureTarget,
        options: SessionOptions,
        classify: F,
    ) -> (CaptureSessionUseCase, RecordingAcquirer, RecordingSink)
    where
        F: Fn(&Frame) -> Option<RawClassification> + Send + Sync + 'static,
    {
        let acquirer = RecordingAcquirer::default();
        let sink = RecordingSink::default();
        let session = CaptureSessionUseCase::new(
            target,
            options,
            Arc::new(FnClassifier(classify)),
            Box::new(acquirer.clone()),
            Box::new(sink.clone()),
            Box::new(NullSessionLogger),
        )
        .unwrap();
        (session, acquirer, sink)
    }

    fn frames(count: usize) -> impl Iterator<Item = Frame> {
        let start = Instant::now();
        (0..count).map(move |i| Frame::empty(i, start + Duration::from_millis(33 * i as u64)))
    }

    #[test]
    fn test_document_back_captures_after_three_mrz_reads() {
        let (mut session, acquirer, _sink) =
            session(CaptureTarget::DocumentBack, inline(CaptureTarget::DocumentBack), |_| {
                Some(text(&MRZ))
            });

        let dispatched = frames(15).filter(|f| session.push_frame(f.clone())).count();

        assert_eq!(dispatched, 3);
        let pending = acquirer.0.lock().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(
            pending[0].0.extracted_fields.get("document_number"),
            Some(&"L898902C3".to_string())
        );
        drop(pending);
        assert_eq!(session.phase(), CapturePhase::Capturing);
        assert_eq!(session.summary().unwrap().message, GuidanceKey::HoldSteady);
    }

    #[test]
    fn test_front_side_shown_for_back_raises_guidance() {
        let options = SessionOptions {
            decimation: 1,
            ..inline(CaptureTarget::DocumentBack)
        };
        let (mut session, acquirer, sink) = session(CaptureTarget::DocumentBack, options, |_| {
            Some(text(&["IDENTITY CARD", "SURNAME", "ERIKSSON"]))
        });

        for frame in frames(12) {
            session.push_frame(frame);
        }

        let alerts = sink.0.lock().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].reason, GuidanceKey::WrongDocumentSide);
        assert!(acquirer.0.lock().unwrap().is_empty());
        assert!(session.snapshot().wrong_alert_shown);
    }

    #[test]
    fn test_selfie_with_worker_pool_captures_once() {
        let options = SessionOptions {
            dispatcher: DispatcherConfig {
                workers: 3,
                queue_capacity: 256,
            },
            ..SessionOptions::for_target(CaptureTarget::Selfie)
        };
        let (mut session, acquirer, _sink) =
            session(CaptureTarget::Selfie, options, |_| Some(one_face()));

        for frame in frames(500) {
            session.push_frame(frame);
        }
        session.shutdown().unwrap();

        assert_eq!(acquirer.0.lock().unwrap().len(), 1);
        assert!(session.snapshot().has_captured);
    }

    #[test]
    fn test_retake_after_capture_starts_fresh() {
        let (mut session, acquirer, _sink) =
            session(CaptureTarget::DocumentBack, inline(CaptureTarget::DocumentBack), |_| {
                Some(text(&MRZ))
            });
        for frame in frames(15) {
            session.push_frame(frame);
        }
        for (_, completion) in acquirer.0.lock().unwrap().drain(..) {
            completion.succeed(CaptureArtifact("back.jpg".into()));
        }
        assert_eq!(session.phase(), CapturePhase::Captured);
        assert_eq!(session.artifact(), Some(CaptureArtifact("back.jpg".into())));

        session.retake();

        assert_eq!(session.phase(), CapturePhase::Idle);
        assert!(session.summary().is_none());
        assert!(session.artifact().is_none());
    }

    #[test]
    fn test_manual_capture_passes_through() {
        let (session, acquirer, _sink) =
            session(CaptureTarget::Selfie, inline(CaptureTarget::Selfie), |_| None);

        assert_eq!(session.manual_capture(), ManualCaptureOutcome::Accepted);
        assert_eq!(acquirer.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unrecognized_frames_leave_summary_empty() {
        let (mut session, _acquirer, _sink) =
            session(CaptureTarget::DocumentFront, inline(CaptureTarget::DocumentFront), |_| {
                Some(one_face())
            });
        for frame in frames(20) {
            session.push_frame(frame);
        }
        assert!(session.summary().is_none());
        assert_eq!(session.phase(), CapturePhase::Idle);
    }

    #[test]
    fn test_zero_decimation_rejected() {
        let options = SessionOptions {
            decimation: 0,
            ..SessionOptions::for_target(CaptureTarget::Selfie)
        };
        let result = CaptureSessionUseCase::new(
            CaptureTarget::Selfie,
            options,
            Arc::new(FnClassifier(|_: &Frame| -> Option<RawClassification> { None })),
            Box::new(RecordingAcquirer::default()),
            Box::new(RecordingSink::default()),
            Box::new(NullSessionLogger),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_trigger_config_rejected() {
        let mut options = SessionOptions::for_target(CaptureTarget::Selfie);
        options.trigger.ready_threshold = 0;
        let result = CaptureSessionUseCase::new(
            CaptureTarget::Selfie,
            options,
            Arc::new(FnClassifier(|_: &Frame| -> Option<RawClassification> { None })),
            Box::new(RecordingAcquirer::default()),
            Box::new(RecordingSink::default()),
            Box::new(NullSessionLogger),
        );
        let err = result.err().unwrap();
        assert!(err.to_string().contains("ready_threshold"));
    }
}
