use std::any::Any;
use std::error::Error;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::classification::domain::classification_adapter::ClassificationAdapter;
use crate::classification::domain::frame_classifier::FrameClassifier;
use crate::classification::domain::observation::Observation;
use crate::shared::constants::{DEFAULT_CLASSIFIER_QUEUE, DEFAULT_CLASSIFIER_WORKERS};
use crate::shared::frame::Frame;

use super::session_logger::SessionLogger;

/// Logger shared between the producer and the classifier workers.
pub type SharedLogger = Arc<Mutex<Box<dyn SessionLogger>>>;

/// Receives every observation produced by the classification stage.
pub type ObservationHandler = Arc<dyn Fn(Observation) + Send + Sync>;

pub(crate) fn lock_logger(logger: &SharedLogger) -> MutexGuard<'_, Box<dyn SessionLogger>> {
    logger.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Worker pool sizing for the classification stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Classifier threads. `0` classifies on the caller's thread, which
    /// makes replays deterministic.
    pub workers: usize,
    /// Sampled frames allowed to wait for a worker before new ones are dropped.
    pub queue_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_CLASSIFIER_WORKERS,
            queue_capacity: DEFAULT_CLASSIFIER_QUEUE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Queued,
    /// The queue was full or closed; the frame will not be classified.
    Dropped,
}

/// Runs classification for sampled frames without blocking the producer.
///
/// Completion order across frames is not guaranteed.
pub trait ClassificationDispatcher: Send {
    fn dispatch(&self, frame: Frame) -> DispatchOutcome;

    /// Frames waiting for a worker.
    fn queue_depth(&self) -> usize;

    /// Stops accepting frames, finishes queued work and joins workers.
    fn shutdown(&mut self) -> Result<(), Box<dyn Error>>;
}

/// Classify, adapt and deliver one frame.
#[derive(Clone)]
pub struct ClassificationStage {
    classifier: Arc<dyn FrameClassifier>,
    adapter: Arc<dyn ClassificationAdapter>,
    handler: ObservationHandler,
    logger: SharedLogger,
}

impl ClassificationStage {
    pub fn new(
        classifier: Arc<dyn FrameClassifier>,
        adapter: Arc<dyn ClassificationAdapter>,
        handler: ObservationHandler,
        logger: SharedLogger,
    ) -> Self {
        Self {
            classifier,
            adapter,
            handler,
            logger,
        }
    }

    /// Classifier errors, panics and unrecognizable results yield no
    /// observation.
    pub fn process(&self, frame: &Frame) {
        let start = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.classifier.classify(frame)));
        let classify_ms = start.elapsed().as_secs_f64() * 1000.0;
        lock_logger(&self.logger).timing("classify", classify_ms);

        let raw = match result {
            Ok(Ok(Some(raw))) => raw,
            Ok(Ok(None)) => {
                log::trace!("Frame {}: no classifier signal", frame.index());
                return;
            }
            Ok(Err(e)) => {
                log::debug!("Frame {}: classifier error: {e}", frame.index());
                return;
            }
            Err(payload) => {
                log::warn!(
                    "Frame {}: classifier panicked: {}",
                    frame.index(),
                    panic_message(payload.as_ref())
                );
                return;
            }
        };

        match self.adapter.adapt(&raw, frame) {
            Some(observation) => (self.handler)(observation),
            None => log::trace!("Frame {}: result not applicable", frame.index()),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
