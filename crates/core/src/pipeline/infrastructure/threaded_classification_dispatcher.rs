use std::error::Error;
use std::thread::JoinHandle;

use crossbeam_channel::{Sender, TrySendError};

use crate::pipeline::classification_dispatcher::{
    ClassificationDispatcher, ClassificationStage, DispatchOutcome, DispatcherConfig,
};
use crate::shared::frame::Frame;

/// Classifies sampled frames on a fixed pool of worker threads.
///
/// Layout: `producer --try_send--> bounded queue --> workers [classify/adapt] --> handler`
///
/// The producer never blocks: when every worker is busy and the queue is
/// full, the frame is dropped. Workers finish in arbitrary order.
pub struct ThreadedClassificationDispatcher {
    frame_tx: Option<Sender<Frame>>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadedClassificationDispatcher {
    pub fn new(config: DispatcherConfig, stage: ClassificationStage) -> Self {
        let (frame_tx, frame_rx) =
            crossbeam_channel::bounded::<Frame>(config.queue_capacity.max(1));

        let workers = (0..config.workers.max(1))
            .map(|id| {
                let frame_rx = frame_rx.clone();
                let stage = stage.clone();
                std::thread::spawn(move || {
                    for frame in frame_rx {
                        stage.process(&frame);
                    }
                    log::debug!("Classifier worker {id} stopped");
                })
            })
            .collect();

        Self {
            frame_tx: Some(frame_tx),
            workers,
        }
    }
}

impl ClassificationDispatcher for ThreadedClassificationDispatcher {
    fn dispatch(&self, frame: Frame) -> DispatchOutcome {
        let Some(frame_tx) = &self.frame_tx else {
            return DispatchOutcome::Dropped;
        };
        match frame_tx.try_send(frame) {
            Ok(()) => DispatchOutcome::Queued,
            Err(TrySendError::Full(frame)) => {
                log::debug!("Classifier queue full, dropping frame {}", frame.index());
                DispatchOutcome::Dropped
            }
            Err(TrySendError::Disconnected(_)) => DispatchOutcome::Dropped,
        }
    }

    fn queue_depth(&self) -> usize {
        self.frame_tx.as_ref().map_or(0, Sender::len)
    }

    fn shutdown(&mut self) -> Result<(), Box<dyn Error>> {
        // Closing the queue lets workers drain it and exit.
        drop(self.frame_tx.take());

        let mut first_error: Option<Box<dyn Error>> = None;
        for handle in self.workers.drain(..) {
            if handle.join().is_err() && first_error.is_none() {
                first_error = Some("Classifier worker panicked".into());
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for ThreadedClassificationDispatcher {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!("{e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    use crossbeam_channel::Receiver;

    use crate::classification::domain::frame_classifier::{ClassifierError, FrameClassifier};
    use crate::classification::domain::observation::Observation;
    use crate::classification::domain::raw_classification::RawClassification;
    use crate::classification::infrastructure::face_presence_adapter::FacePresenceAdapter;
    use crate::pipeline::session_logger::{NullSessionLogger, SessionLogger};

    /// Returns "no face" for every frame, optionally holding each call
    /// until the test releases it. Frames below `panic_below` panic instead.
    struct GatedClassifier {
        started: Sender<usize>,
        release: Option<Receiver<()>>,
        panic_below: usize,
    }

    impl FrameClassifier for GatedClassifier {
        fn classify(&self, frame: &Frame) -> Result<Option<RawClassification>, ClassifierError> {
            let _ = self.started.send(frame.index());
            if frame.index() < self.panic_below {
                panic!("classifier failed on frame {}", frame.index());
            }
            if let Some(release) = &self.release {
                let _ = release.recv();
            }
            Ok(Some(RawClassification::Faces { faces: Vec::new() }))
        }
    }

    fn dispatcher(
        config: DispatcherConfig,
        classifier: GatedClassifier,
    ) -> (ThreadedClassificationDispatcher, Arc<Mutex<Vec<Observation>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let logger: Box<dyn SessionLogger> = Box::new(NullSessionLogger);
        let stage = ClassificationStage::new(
            Arc::new(classifier),
            Arc::new(FacePresenceAdapter::default()),
            Arc::new(move |obs: Observation| sink.lock().unwrap().push(obs)),
            Arc::new(Mutex::new(logger)),
        );
        (ThreadedClassificationDispatcher::new(config, stage), seen)
    }

    #[test]
    fn test_all_queued_frames_classified_before_shutdown_returns() {
        let (started_tx, _started_rx) = crossbeam_channel::unbounded();
        let config = DispatcherConfig {
            workers: 3,
            queue_capacity: 64,
        };
        let (mut dispatcher, seen) = dispatcher(
            config,
            GatedClassifier {
                started: started_tx,
                release: None,
                panic_below: 0,
            },
        );

        for i in 0..20 {
            assert_eq!(
                dispatcher.dispatch(Frame::empty(i, Instant::now())),
                DispatchOutcome::Queued
            );
        }
        dispatcher.shutdown().unwrap();

        assert_eq!(seen.lock().unwrap().len(), 20);
    }

    #[test]
    fn test_full_queue_drops_without_blocking() {
        let (started_tx, started_rx) = crossbeam_channel::unbounded();
        let (release_tx, release_rx) = crossbeam_channel::unbounded();
        let config = DispatcherConfig {
            workers: 1,
            queue_capacity: 1,
        };
        let (mut dispatcher, seen) = dispatcher(
            config,
            GatedClassifier {
                started: started_tx,
                release: Some(release_rx),
                panic_below: 0,
            },
        );

        assert_eq!(
            dispatcher.dispatch(Frame::empty(0, Instant::now())),
            DispatchOutcome::Queued
        );
        // Worker is now busy with frame 0.
        assert_eq!(started_rx.recv().unwrap(), 0);

        assert_eq!(
            dispatcher.dispatch(Frame::empty(5, Instant::now())),
            DispatchOutcome::Queued
        );
        assert_eq!(dispatcher.queue_depth(), 1);
        assert_eq!(
            dispatcher.dispatch(Frame::empty(10, Instant::now())),
            DispatchOutcome::Dropped
        );

        drop(release_tx);
        dispatcher.shutdown().unwrap();

        assert_eq!(seen.lock().unwrap().len(), 2);
        assert_eq!(dispatcher.queue_depth(), 0);
    }

    #[test]
    fn test_dispatch_after_shutdown_is_dropped() {
        let (started_tx, _started_rx) = crossbeam_channel::unbounded();
        let (mut dispatcher, _seen) = dispatcher(
            DispatcherConfig::default(),
            GatedClassifier {
                started: started_tx,
                release: None,
                panic_below: 0,
            },
        );
        dispatcher.shutdown().unwrap();

        assert_eq!(
            dispatcher.dispatch(Frame::empty(0, Instant::now())),
            DispatchOutcome::Dropped
        );
    }

    #[test]
    fn test_workers_survive_classifier_panics() {
        let (started_tx, _started_rx) = crossbeam_channel::unbounded();
        let config = DispatcherConfig {
            workers: 2,
            queue_capacity: 64,
        };
        let (mut dispatcher, seen) = dispatcher(
            config,
            GatedClassifier {
                started: started_tx,
                release: None,
                panic_below: 10,
            },
        );

        for i in 0..30 {
            assert_eq!(
                dispatcher.dispatch(Frame::empty(i, Instant::now())),
                DispatchOutcome::Queued
            );
        }
        dispatcher.shutdown().unwrap();

        assert_eq!(seen.lock().unwrap().len(), 20);
    }
}
