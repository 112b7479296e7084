use crossbeam_channel::{Receiver, Sender};

use crate::capture::domain::collaborators::{CaptureCompletion, CaptureRequest, PhotoAcquirer};

/// A capture request waiting to be fulfilled by a camera thread.
#[derive(Debug)]
pub struct PendingCapture {
    pub request: CaptureRequest,
    pub completion: CaptureCompletion,
}

/// Hands capture requests to another thread over a bounded channel.
///
/// The receiving side takes the photo and resolves the completion. If the
/// queue is full or the receiver is gone, the request is dropped and the
/// completion's drop reports the failure.
pub struct ChannelPhotoAcquirer {
    tx: Sender<PendingCapture>,
}

impl ChannelPhotoAcquirer {
    pub fn new(capacity: usize) -> (Self, Receiver<PendingCapture>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl PhotoAcquirer for ChannelPhotoAcquirer {
    fn acquire(&self, request: CaptureRequest, completion: CaptureCompletion) {
        if let Err(e) = self.tx.try_send(PendingCapture {
            request,
            completion,
        }) {
            log::warn!("Capture request not delivered: {e}");
        }
    }
}
