use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::classification::domain::classification_adapter::ClassificationAdapter;
use crate::classification::infrastructure::document_side_adapter::{
    DocumentSide, DocumentSideAdapter,
};
use crate::classification::infrastructure::face_presence_adapter::FacePresenceAdapter;
use crate::trigger::domain::trigger_config::TriggerConfig;

/// What the capture screen is trying to photograph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureTarget {
    DocumentBack,
    DocumentFront,
    Selfie,
}

impl CaptureTarget {
    pub const ALL: [CaptureTarget; 3] = [
        CaptureTarget::DocumentBack,
        CaptureTarget::DocumentFront,
        CaptureTarget::Selfie,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CaptureTarget::DocumentBack => "document-back",
            CaptureTarget::DocumentFront => "document-front",
            CaptureTarget::Selfie => "selfie",
        }
    }

    /// Threshold preset tuned for this target.
    pub fn preset(self) -> TriggerConfig {
        match self {
            CaptureTarget::DocumentBack => TriggerConfig::document_back(),
            CaptureTarget::DocumentFront => TriggerConfig::document_front(),
            CaptureTarget::Selfie => TriggerConfig::selfie(),
        }
    }

    pub fn adapter(self) -> Arc<dyn ClassificationAdapter> {
        match self {
            CaptureTarget::DocumentBack => {
                Arc::new(DocumentSideAdapter::with_default_markers(DocumentSide::Back))
            }
            CaptureTarget::DocumentFront => {
                Arc::new(DocumentSideAdapter::with_default_markers(DocumentSide::Front))
            }
            CaptureTarget::Selfie => Arc::new(FacePresenceAdapter::default()),
        }
    }
}

impl fmt::Display for CaptureTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaptureTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaptureTarget::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                format!("unknown capture target '{s}' (expected document-back, document-front or selfie)")
            })
    }
}
