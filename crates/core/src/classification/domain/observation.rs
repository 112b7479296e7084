use std::collections::HashMap;
use std::time::Instant;

use super::guidance::GuidanceKey;

/// One classifier verdict for one sampled frame, normalized to a canonical
/// shape.
///
/// `target_class_present` and `wrong_class_present` may both be set by a
/// classifier; the accumulator decides how to count such frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub confidence: f32,
    pub target_class_present: bool,
    pub wrong_class_present: bool,
    /// Structured data read from the subject. Only populated on target frames.
    pub extracted_fields: HashMap<String, String>,
    /// Why the frame is off-target, when the classifier can tell.
    pub wrong_reason: Option<GuidanceKey>,
    /// Acquisition time of the frame this verdict belongs to.
    pub observed_at: Instant,
}

impl Observation {
    /// Frame matching the wanted class.
    pub fn target(confidence: f32, observed_at: Instant) -> Self {
        Self {
            confidence: clamp_unit(confidence),
            target_class_present: true,
            wrong_class_present: false,
            extracted_fields: HashMap::new(),
            wrong_reason: None,
            observed_at,
        }
    }

    /// Frame matching a disallowed class.
    pub fn wrong(confidence: f32, reason: GuidanceKey, observed_at: Instant) -> Self {
        Self {
            confidence: clamp_unit(confidence),
            target_class_present: false,
            wrong_class_present: true,
            extracted_fields: HashMap::new(),
            wrong_reason: Some(reason),
            observed_at,
        }
    }

    /// Frame where neither class was recognized.
    pub fn neither(confidence: f32, observed_at: Instant) -> Self {
        Self {
            confidence: clamp_unit(confidence),
            target_class_present: false,
            wrong_class_present: false,
            extracted_fields: HashMap::new(),
            wrong_reason: None,
            observed_at,
        }
    }

    /// Attaches extracted fields. Ignored unless the target class is present.
    pub fn with_fields(mut self, fields: HashMap<String, String>) -> Self {
        if self.target_class_present {
            self.extracted_fields = fields;
        }
        self
    }

    /// True when only the disallowed class was seen. This is what the
    /// manual-capture guard checks.
    pub fn is_wrong_class_only(&self) -> bool {
        self.wrong_class_present && !self.target_class_present
    }

    /// Reason to show the user for an off-target frame.
    pub fn guidance(&self) -> GuidanceKey {
        self.wrong_reason.unwrap_or(GuidanceKey::NoSubject)
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
