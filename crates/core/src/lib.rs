//! Auto-capture trigger engine.
//!
//! Turns a stream of camera frames into at most one capture per session:
//! frames are sampled, classified off-thread, normalized into
//! observations and debounced until the subject is steady. Off-target
//! subjects raise guidance and a short cooldown instead.

pub mod capture;
pub mod classification;
pub mod pipeline;
pub mod shared;
pub mod trigger;
