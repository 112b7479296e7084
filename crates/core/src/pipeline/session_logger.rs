use std::collections::HashMap;
use std::time::Instant;

/// Observability hook for a running capture session.
///
/// Worker threads report through the same logger as the producer, so
/// implementations are shared behind a mutex.
pub trait SessionLogger: Send {
    /// A camera frame arrived; `sampled` tells whether it went to the classifier.
    fn frame(&mut self, index: usize, sampled: bool);

    /// A sampled frame was dropped because the classifier queue was full.
    fn dropped(&mut self, index: usize);

    /// Time spent in a named stage for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Point-in-time value such as queue depth.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// End-of-session report. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything. Used by embedders with their own telemetry and
/// by tests.
pub struct NullSessionLogger;

impl SessionLogger for NullSessionLogger {
    fn frame(&mut self, _index: usize, _sampled: bool) {}
    fn dropped(&mut self, _index: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Collects stage timings and metrics and prints a summary through `log`
/// when the session ends.
pub struct StdoutSessionLogger {
    started: Instant,
    frames: u64,
    sampled: u64,
    dropped: u64,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
}

impl StdoutSessionLogger {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            frames: 0,
            sampled: 0,
            dropped: 0,
            timings: HashMap::new(),
            metrics: HashMap::new(),
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn sampled(&self) -> u64 {
        self.sampled
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }

    /// Formatted report, or `None` before the first frame.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames == 0 {
            return None;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Session summary ({} frames, {} sampled, {} dropped, {elapsed:.1}s):",
            self.frames, self.sampled, self.dropped
        )];

        let mut stages: Vec<_> = self.timings.iter().collect();
        stages.sort_by(|a, b| a.0.cmp(b.0));
        for (stage, durations) in stages {
            let total: f64 = durations.iter().sum();
            let avg = mean(durations);
            let max = durations.iter().copied().fold(0.0, f64::max);
            lines.push(format!(
                "  {stage:12}: avg {avg:6.1}ms  max {max:6.1}ms  total {total:7.0}ms"
            ));
        }

        let mut names: Vec<_> = self.metrics.iter().collect();
        names.sort_by(|a, b| a.0.cmp(b.0));
        for (name, values) in names {
            lines.push(format!("  {name}: avg {:.1}", mean(values)));
        }

        Some(lines.join("\n"))
    }
}

impl Default for StdoutSessionLogger {
    fn default() -> Self {
        Self::new()
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl SessionLogger for StdoutSessionLogger {
    fn frame(&mut self, index: usize, sampled: bool) {
        self.frames += 1;
        if sampled {
            self.sampled += 1;
            log::debug!("Frame {index} sampled");
        }
    }

    fn dropped(&mut self, index: usize) {
        self.dropped += 1;
        log::warn!("Frame {index} dropped: classifier queue full");
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
