pub mod classification_adapter;
pub mod frame_classifier;
pub mod guidance;
pub mod observation;
pub mod raw_classification;
