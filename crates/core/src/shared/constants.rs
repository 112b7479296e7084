/// Default frame decimation: classify every 5th frame (~6 classifications/s at 30 fps).
pub const DEFAULT_DECIMATION: usize = 5;

/// Default number of classifier worker threads.
pub const DEFAULT_CLASSIFIER_WORKERS: usize = 2;

/// Sampled frames allowed to wait for a classifier worker before new ones are dropped.
pub const DEFAULT_CLASSIFIER_QUEUE: usize = 4;

/// Default wall-clock suppression after a confirmed wrong-class episode.
pub const DEFAULT_COOLDOWN_MS: u64 = 2000;

/// A lone face covering less than this share of the frame is too far away.
pub const DEFAULT_MIN_FACE_AREA_RATIO: f64 = 0.04;

/// Words printed on the front of common identity cards.
pub const DEFAULT_FRONT_MARKERS: &[&str] = &[
    "IDENTITY CARD",
    "DATE OF BIRTH",
    "SURNAME",
    "GIVEN NAMES",
    "NATIONALITY",
    "SIGNATURE",
];
