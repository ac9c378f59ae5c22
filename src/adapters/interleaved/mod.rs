// In-memory sample source - Interleaved samples already held in memory

use crate::domain::errors::DomainError;
use crate::domain::model::{BlockDescription, SampleBlock};
use crate::ports::SampleSource;

/// Serves an interleaved sample buffer in fixed-size blocks
#[derive(Debug, Clone)]
pub struct InterleavedSource {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
    block_size: usize,
    /// Next frame to serve
    cursor: usize,
}

impl InterleavedSource {
    /// Create a source over `samples`; the final block may be shorter than `block_size`
    pub fn new(
        samples: Vec<f32>,
        channels: usize,
        sample_rate: u32,
        block_size: usize,
    ) -> Result<Self, DomainError> {
        if channels == 0 {
            return Err(DomainError::BadArgs("Channel count cannot be zero".to_string()));
        }
        if block_size == 0 {
            return Err(DomainError::BadArgs("Block size cannot be zero".to_string()));
        }
        if samples.len() % channels != 0 {
            return Err(DomainError::InvalidFormat(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                channels
            )));
        }
        Ok(Self {
            samples,
            channels,
            sample_rate,
            block_size,
            cursor: 0,
        })
    }

    /// Total frames in the buffer
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels
    }
}

impl SampleSource for InterleavedSource {
    fn next_block(&mut self) -> Result<Option<SampleBlock>, DomainError> {
        let remaining = self.frame_count() - self.cursor;
        if remaining == 0 {
            return Ok(None);
        }
        let frames = remaining.min(self.block_size);
        let from = self.cursor * self.channels;
        let to = from + frames * self.channels;
        self.cursor += frames;

        let info = BlockDescription::new(frames, self.channels, self.sample_rate)?;
        SampleBlock::new(info, self.samples[from..to].to_vec()).map(Some)
    }

    fn channel_count(&self) -> usize {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
