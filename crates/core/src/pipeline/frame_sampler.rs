use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SamplerError {
    #[error("decimation factor must be >= 1")]
    ZeroDecimation,
}

/// Picks every N-th frame of the camera stream for classification.
///
/// Frame `index` is sampled exactly when `index % N == 0`. The decision
/// depends only on the index, so dropped or reordered frames upstream
/// never shift the sampling grid.
#[derive(Debug, Clone)]
pub struct FrameSampler {
    decimation: usize,
    sampled: u64,
    skipped: u64,
}

impl FrameSampler {
    pub fn new(decimation: usize) -> Result<Self, SamplerError> {
        if decimation < 1 {
            return Err(SamplerError::ZeroDecimation);
        }
        Ok(Self {
            decimation,
            sampled: 0,
            skipped: 0,
        })
    }

    pub fn decimation(&self) -> usize {
        self.decimation
    }

    pub fn should_sample(&self, index: usize) -> bool {
        index % self.decimation == 0
    }

    /// Same as [`should_sample`](Self::should_sample), but counts the decision.
    pub fn admit(&mut self, index: usize) -> bool {
        let sample = self.should_sample(index);
        if sample {
            self.sampled += 1;
        } else {
            self.skipped += 1;
        }
        sample
    }

    pub fn sampled(&self) -> u64 {
        self.sampled
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}
