use crate::classification::domain::classification_adapter::ClassificationAdapter;
use crate::classification::domain::guidance::GuidanceKey;
use crate::classification::domain::observation::Observation;
use crate::classification::domain::raw_classification::{RawClassification, TextRecognition};
use crate::shared::constants::DEFAULT_FRONT_MARKERS;
use crate::shared::frame::Frame;

use super::mrz_parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSide {
    Front,
    /// The side carrying the machine-readable zone.
    Back,
}

/// What the recognized text says about which side is facing the camera.
#[derive(Debug)]
enum SideEvidence {
    /// A complete MRZ block that passed check-digit validation.
    ValidMrz(mrz_parser::MrzRecord),
    /// MRZ-shaped lines that failed to parse (misread or partial).
    PartialMrz,
    FrontMarkers,
    Nothing,
}

/// Interprets text recognition output for one side of an identity document.
///
/// The back is recognized by its machine-readable zone, the front by marker
/// phrases printed on it. Showing the other side is reported as the wrong
/// class.
pub struct DocumentSideAdapter {
    wanted: DocumentSide,
    front_markers: Vec<String>,
}

impl DocumentSideAdapter {
    pub fn new(wanted: DocumentSide, front_markers: Vec<String>) -> Self {
        Self {
            wanted,
            front_markers: front_markers
                .into_iter()
                .map(|m| m.to_uppercase())
                .collect(),
        }
    }

    pub fn with_default_markers(wanted: DocumentSide) -> Self {
        Self::new(
            wanted,
            DEFAULT_FRONT_MARKERS.iter().map(|m| m.to_string()).collect(),
        )
    }

    fn evidence(&self, text: &TextRecognition) -> SideEvidence {
        let lines: Vec<&str> = text.blocks.iter().flat_map(|b| b.text.lines()).collect();

        match mrz_parser::find_and_parse(lines.iter().copied()) {
            Some(Ok(record)) => return SideEvidence::ValidMrz(record),
            Some(Err(e)) => {
                log::debug!("MRZ rejected: {e}");
                return SideEvidence::PartialMrz;
            }
            None => {}
        }
        if lines
            .iter()
            .any(|l| mrz_parser::candidate_line(l).is_some())
        {
            return SideEvidence::PartialMrz;
        }

        let has_marker = lines.iter().any(|line| {
            let upper = line.to_uppercase();
            self.front_markers.iter().any(|m| upper.contains(m.as_str()))
        });
        if has_marker {
            SideEvidence::FrontMarkers
        } else {
            SideEvidence::Nothing
        }
    }
}

impl ClassificationAdapter for DocumentSideAdapter {
    fn adapt(&self, raw: &RawClassification, frame: &Frame) -> Option<Observation> {
        let RawClassification::Text(text) = raw else {
            return None;
        };
        if text.blocks.is_empty() {
            return None;
        }

        let confidence = text.mean_confidence();
        let at = frame.captured_at();

        let observation = match (self.wanted, self.evidence(text)) {
            (DocumentSide::Back, SideEvidence::ValidMrz(record)) => {
                Observation::target(confidence, at).with_fields(record.to_fields())
            }
            (DocumentSide::Back, SideEvidence::FrontMarkers) => {
                Observation::wrong(confidence, GuidanceKey::WrongDocumentSide, at)
            }
            (DocumentSide::Front, SideEvidence::FrontMarkers) => {
                Observation::target(confidence, at)
            }
            // A back side read while the front is wanted, complete or not.
            (DocumentSide::Front, SideEvidence::ValidMrz(_) | SideEvidence::PartialMrz) => {
                Observation::wrong(confidence, GuidanceKey::WrongDocumentSide, at)
            }
            (DocumentSide::Back, SideEvidence::PartialMrz) | (_, SideEvidence::Nothing) => {
                Observation::neither(confidence, at)
            }
        };
        Some(observation)
    }
}
