use crate::shared::frame::Frame;

use super::observation::Observation;
use super::raw_classification::RawClassification;

/// Normalizes raw classifier output into an [`Observation`].
///
/// Returns `None` when the raw result cannot be interpreted for this
/// capture target; such frames are dropped, not counted.
pub trait ClassificationAdapter: Send + Sync {
    fn adapt(&self, raw: &RawClassification, frame: &Frame) -> Option<Observation>;
}
