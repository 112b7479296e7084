use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use capture_trigger_core::capture::domain::collaborators::{
    CaptureArtifact, CaptureCompletion, CaptureOrigin, CaptureRequest, PhotoAcquirer,
};

/// Stands in for the camera during a replay: every capture succeeds at
/// once with a numbered file name, except optionally the first one.
pub struct ReplayAcquirer {
    fail_next: AtomicBool,
    taken: AtomicUsize,
}

impl ReplayAcquirer {
    pub fn new(fail_first: bool) -> Self {
        Self {
            fail_next: AtomicBool::new(fail_first),
            taken: AtomicUsize::new(0),
        }
    }
}

impl PhotoAcquirer for ReplayAcquirer {
    fn acquire(&self, request: CaptureRequest, completion: CaptureCompletion) {
        let kind = match request.origin {
            CaptureOrigin::Automatic => "auto",
            CaptureOrigin::Manual => "manual",
        };
        if self.fail_next.swap(false, Ordering::SeqCst) {
            log::info!("Simulating camera failure for {kind} capture");
            completion.fail("simulated camera failure");
            return;
        }

        let n = self.taken.fetch_add(1, Ordering::SeqCst) + 1;
        if !request.extracted_fields.is_empty() {
            let mut fields: Vec<_> = request.extracted_fields.iter().collect();
            fields.sort();
            log::info!("Fields read before {kind} capture: {fields:?}");
        }
        completion.succeed(CaptureArtifact(format!("capture-{n:03}-{kind}.jpg")));
    }
}
