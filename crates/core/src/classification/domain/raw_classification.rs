use serde::Deserialize;

/// One line or block of recognized text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextBlock {
    pub text: String,
    pub confidence: f32,
}

/// Output of a text-recognition classifier for one frame.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TextRecognition {
    pub blocks: Vec<TextBlock>,
}

impl TextRecognition {
    /// Mean block confidence, or 0.0 for an empty result.
    pub fn mean_confidence(&self) -> f32 {
        if self.blocks.is_empty() {
            return 0.0;
        }
        let total: f32 = self.blocks.iter().map(|b| b.confidence).sum();
        total / self.blocks.len() as f32
    }
}

/// One detected face, in pixel coordinates of the classified frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FaceDetection {
    pub confidence: f32,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl FaceDetection {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Raw result of an external classifier, before normalization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawClassification {
    Text(TextRecognition),
    Faces { faces: Vec<FaceDetection> },
}
