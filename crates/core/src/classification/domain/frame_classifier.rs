use crate::shared::frame::Frame;

use super::raw_classification::RawClassification;

pub type ClassifierError = Box<dyn std::error::Error + Send + Sync>;

/// Domain interface for the external per-frame classifier (text recognition
/// or face detection).
///
/// Shared by every classifier worker thread, hence `&self`. `Ok(None)` means
/// the frame carried no recognizable signal.
pub trait FrameClassifier: Send + Sync {
    fn classify(&self, frame: &Frame) -> Result<Option<RawClassification>, ClassifierError>;
}
