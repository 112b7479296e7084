use crate::capture::domain::collaborators::{
    CaptureArtifact, GuidanceAcknowledgement, GuidanceAlert, GuidanceSink,
};

/// Guidance sink for headless runs: writes every event to the log.
///
/// With `auto_acknowledge`, each alert is acknowledged as soon as it is
/// logged, as if the user dismissed it immediately.
pub struct LogGuidanceSink {
    auto_acknowledge: bool,
}

impl LogGuidanceSink {
    pub fn new(auto_acknowledge: bool) -> Self {
        Self { auto_acknowledge }
    }
}

impl Default for LogGuidanceSink {
    fn default() -> Self {
        Self::new(false)
    }
}

impl GuidanceSink for LogGuidanceSink {
    fn alert(&self, alert: GuidanceAlert, ack: GuidanceAcknowledgement) {
        log::info!(
            "Guidance: {} ({:?}, cooldown: {})",
            alert.reason,
            alert.origin,
            if alert.cooldown_until.is_some() { "yes" } else { "no" },
        );
        if self.auto_acknowledge {
            ack.acknowledge();
        }
    }

    fn capture_failed(&self, reason: &str) {
        log::warn!("Capture failed: {reason}");
    }

    fn captured(&self, artifact: &CaptureArtifact) {
        log::info!("Captured {artifact}");
    }
}
