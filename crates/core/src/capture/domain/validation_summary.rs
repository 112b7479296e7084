use serde::Serialize;

use crate::classification::domain::guidance::GuidanceKey;
use crate::classification::domain::observation::Observation;

/// What the overlay shows for the most recently processed observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub target_class_present: bool,
    pub wrong_class_present: bool,
    pub confidence: f32,
    pub message: GuidanceKey,
}

impl ValidationSummary {
    pub fn from_observation(observation: &Observation) -> Self {
        let message = if observation.target_class_present {
            GuidanceKey::HoldSteady
        } else if observation.wrong_class_present {
            observation.guidance()
        } else {
            GuidanceKey::Searching
        };
        Self {
            target_class_present: observation.target_class_present,
            wrong_class_present: observation.wrong_class_present,
            confidence: observation.confidence,
            message,
        }
    }
}
