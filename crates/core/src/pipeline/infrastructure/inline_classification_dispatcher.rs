use std::error::Error;

use crate::pipeline::classification_dispatcher::{
    ClassificationDispatcher, ClassificationStage, DispatchOutcome,
};
use crate::shared::frame::Frame;

/// Classifies on the caller's thread.
///
/// Blocks the producer for the duration of each classification, so it is
/// meant for replays and tests where a deterministic order matters more
/// than latency.
pub struct InlineClassificationDispatcher {
    stage: ClassificationStage,
}

impl InlineClassificationDispatcher {
    pub fn new(stage: ClassificationStage) -> Self {
        Self { stage }
    }
}

impl ClassificationDispatcher for InlineClassificationDispatcher {
    fn dispatch(&self, frame: Frame) -> DispatchOutcome {
        self.stage.process(&frame);
        DispatchOutcome::Queued
    }

    fn queue_depth(&self) -> usize {
        0
    }

    fn shutdown(&mut self) -> Result<(), Box<dyn Error>> {
        Ok(())
    }
}
