use crate::classification::domain::classification_adapter::ClassificationAdapter;
use crate::classification::domain::guidance::GuidanceKey;
use crate::classification::domain::observation::Observation;
use crate::classification::domain::raw_classification::RawClassification;
use crate::shared::constants::DEFAULT_MIN_FACE_AREA_RATIO;
use crate::shared::frame::Frame;

/// Interprets face detection output for selfie capture.
///
/// - exactly one face large enough: target
/// - more than one face: wrong class (`multiple_faces`)
/// - one face below `min_face_area_ratio` of the frame: wrong class (`face_too_small`)
/// - no face: neither, confidence 0
///
/// The size check is skipped for frames without dimensions.
pub struct FacePresenceAdapter {
    min_face_area_ratio: f64,
}

impl FacePresenceAdapter {
    pub fn new(min_face_area_ratio: f64) -> Self {
        Self {
            min_face_area_ratio: min_face_area_ratio.clamp(0.0, 1.0),
        }
    }
}

impl Default for FacePresenceAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_FACE_AREA_RATIO)
    }
}

impl ClassificationAdapter for FacePresenceAdapter {
    fn adapt(&self, raw: &RawClassification, frame: &Frame) -> Option<Observation> {
        let RawClassification::Faces { faces } = raw else {
            return None;
        };
        let at = frame.captured_at();

        match faces.as_slice() {
            [] => Some(Observation::neither(0.0, at)),
            [face] => {
                let frame_area = frame.area();
                let ratio = if frame_area == 0 {
                    1.0
                } else {
                    face.area() as f64 / frame_area as f64
                };
                if ratio < self.min_face_area_ratio {
                    Some(Observation::wrong(
                        face.confidence,
                        GuidanceKey::FaceTooSmall,
                        at,
                    ))
                } else {
                    Some(Observation::target(face.confidence, at))
                }
            }
            many => {
                let confidence = many.iter().map(|f| f.confidence).fold(0.0, f32::max);
                Some(Observation::wrong(confidence, GuidanceKey::MultipleFaces, at))
            }
        }
    }
}
