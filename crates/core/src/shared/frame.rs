use std::time::Instant;

/// A single camera frame: contiguous pixel bytes in row-major order,
/// stamped with its position in the stream and the time it was acquired.
///
/// The engine never inspects pixels; they are handed to the classifier
/// as-is.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
    captured_at: Instant,
}

impl Frame {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
        index: usize,
        captured_at: Instant,
    ) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
            captured_at,
        }
    }

    /// A frame with no pixel payload, used when replaying recorded
    /// classifier output.
    pub fn empty(index: usize, captured_at: Instant) -> Self {
        Self::new(Vec::new(), 0, 0, 3, index, captured_at)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    /// Total pixel count, zero for payload-less frames.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}
