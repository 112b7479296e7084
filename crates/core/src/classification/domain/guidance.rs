use serde::Serialize;

/// Stable, human-readable reason keys surfaced to the presentation layer.
///
/// The presentation layer maps keys to localized copy; the engine only
/// ever deals in keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceKey {
    /// The opposite side of the document is facing the camera.
    WrongDocumentSide,
    MultipleFaces,
    FaceTooSmall,
    /// Generic off-target condition when the classifier gives no reason.
    NoSubject,
    HoldSteady,
    Searching,
}

impl GuidanceKey {
    pub fn as_key(&self) -> &'static str {
        match self {
            GuidanceKey::WrongDocumentSide => "wrong_document_side",
            GuidanceKey::MultipleFaces => "multiple_faces",
            GuidanceKey::FaceTooSmall => "face_too_small",
            GuidanceKey::NoSubject => "no_subject",
            GuidanceKey::HoldSteady => "hold_steady",
            GuidanceKey::Searching => "searching",
        }
    }
}

impl std::fmt::Display for GuidanceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_key())
    }
}
