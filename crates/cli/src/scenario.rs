use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use capture_trigger_core::classification::domain::frame_classifier::{
    ClassifierError, FrameClassifier,
};
use capture_trigger_core::classification::domain::raw_classification::RawClassification;
use capture_trigger_core::pipeline::capture_target::CaptureTarget;
use capture_trigger_core::shared::frame::Frame;
use capture_trigger_core::trigger::domain::trigger_config::TriggerConfig;

const DEFAULT_INTERVAL_MS: u64 = 33;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Failed to read scenario {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid scenario {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Scenario has no frames")]
    Empty,
    #[error("Entry {entry}: at_ms {at_ms} goes back in time (previous frame at {previous_ms})")]
    TimeTravel {
        entry: usize,
        at_ms: u64,
        previous_ms: u64,
    },
    #[error("Entry {entry}: frame time overflows the replay clock")]
    TimeOverflow { entry: usize },
}

/// Recorded classifier output for one capture attempt.
///
/// ```json
/// {
///   "target": "document-back",
///   "interval_ms": 33,
///   "frames": [
///     { "repeat": 20 },
///     { "repeat": 15, "classification": { "kind": "text", "blocks": [...] } },
///     { "manual": true }
///   ]
/// }
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub target: Option<CaptureTarget>,
    /// Replaces the target's preset thresholds.
    #[serde(default)]
    pub trigger: Option<TriggerConfig>,
    /// Spacing of frames without an explicit `at_ms`.
    #[serde(default = "default_interval")]
    pub interval_ms: u64,
    pub frames: Vec<FrameEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameEntry {
    /// Timestamp of the first repetition, relative to replay start.
    #[serde(default)]
    pub at_ms: Option<u64>,
    #[serde(default = "default_repeat")]
    pub repeat: usize,
    /// Classifier result for these frames. Absent means "nothing recognized".
    #[serde(default)]
    pub classification: Option<RawClassification>,
    /// Press the manual capture button after the last repetition.
    #[serde(default)]
    pub manual: bool,
    /// Press "retake" after the last repetition.
    #[serde(default)]
    pub retake: bool,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_MS
}

fn default_repeat() -> usize {
    1
}

/// One camera frame of the replay, with the user actions that follow it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedFrame {
    pub index: usize,
    pub at_ms: u64,
    pub classification: Option<RawClassification>,
    pub manual: bool,
    pub retake: bool,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ScenarioError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Flattens repeated entries into consecutive frames.
    pub fn expand(&self) -> Result<Vec<ScriptedFrame>, ScenarioError> {
        let mut frames = Vec::new();
        // None once the implicit clock has run past u64::MAX.
        let mut next_ms = Some(0u64);
        let mut previous_ms: Option<u64> = None;

        for (entry_idx, entry) in self.frames.iter().enumerate() {
            if let Some(at_ms) = entry.at_ms {
                if let Some(previous_ms) = previous_ms.filter(|&p| at_ms < p) {
                    return Err(ScenarioError::TimeTravel {
                        entry: entry_idx,
                        at_ms,
                        previous_ms,
                    });
                }
                next_ms = Some(at_ms);
            }

            let repeat = entry.repeat.max(1);
            for r in 0..repeat {
                let last = r + 1 == repeat;
                let at_ms = next_ms.ok_or(ScenarioError::TimeOverflow { entry: entry_idx })?;
                frames.push(ScriptedFrame {
                    index: frames.len(),
                    at_ms,
                    classification: entry.classification.clone(),
                    manual: last && entry.manual,
                    retake: last && entry.retake,
                });
                previous_ms = Some(at_ms);
                next_ms = at_ms.checked_add(self.interval_ms);
            }
        }

        if frames.is_empty() {
            return Err(ScenarioError::Empty);
        }
        Ok(frames)
    }
}

/// Answers classification requests from the recorded results.
pub struct ScriptedClassifier {
    results: HashMap<usize, RawClassification>,
}

impl ScriptedClassifier {
    pub fn new(frames: &[ScriptedFrame]) -> Self {
        let results = frames
            .iter()
            .filter_map(|f| f.classification.clone().map(|c| (f.index, c)))
            .collect();
        Self { results }
    }
}

impl FrameClassifier for ScriptedClassifier {
    fn classify(&self, frame: &Frame) -> Result<Option<RawClassification>, ClassifierError> {
        Ok(self.results.get(&frame.index()).cloned())
    }
}
