//! Per-block channel activity detection
//!
//! The analyser reduces a complete sample stream into an [`ActivityMatrix`].
//! It never emits partial results: the matrix only exists once the source
//! has signalled end of stream and [`ActivityAnalyser::finish`] has appended
//! the terminal all-inactive block.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::{ActivityMatrix, AnalyserSettings, SampleBlock, NS_PER_SECOND};
use crate::ports::SampleSource;

/// Accumulates activity flags block by block
#[derive(Debug, Clone)]
pub struct ActivityAnalyser {
    threshold: f64,
    time_base_hz: u32,
    /// Frames consumed so far
    samples: u64,
    channel_count: usize,
    matrix: ActivityMatrix,
}

impl ActivityAnalyser {
    /// Create an analyser with the default threshold and 48 kHz time base
    pub fn new() -> Self {
        Self::from_settings(&AnalyserSettings::default())
    }

    pub fn from_settings(settings: &AnalyserSettings) -> Self {
        Self {
            threshold: settings.threshold,
            time_base_hz: settings.time_base_hz,
            samples: 0,
            channel_count: 0,
            matrix: ActivityMatrix::default(),
        }
    }

    /// Set the RMS magnitude above which a channel is active
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the rate used to turn frame counts into nanoseconds
    pub fn with_time_base(mut self, time_base_hz: u32) -> Self {
        self.time_base_hz = time_base_hz;
        self
    }

    /// Number of blocks processed so far
    pub fn blocks_seen(&self) -> usize {
        self.matrix.len()
    }

    fn current_time_ns(&self) -> i64 {
        let hz = self.time_base_hz.max(1) as u128;
        (self.samples as u128 * NS_PER_SECOND as u128 / hz) as i64
    }

    /// Classify every channel of one block and record its start time
    pub fn push_block(&mut self, block: &SampleBlock) {
        let channels = block.info.channel_count;
        let flags: Vec<bool> = (0..channels)
            .map(|ch| block.channel_rms(ch) > self.threshold)
            .collect();

        if channels != self.channel_count && self.channel_count != 0 {
            debug!(
                block = self.matrix.len(),
                from = self.channel_count,
                to = channels,
                "Channel count changed mid-stream"
            );
        }
        self.channel_count = channels;

        self.matrix.active.push(flags);
        self.matrix.block_times.push(self.current_time_ns());
        self.samples += block.info.sample_count as u64;
    }

    /// Close the stream: append the all-inactive terminal block and the file length
    pub fn finish(mut self) -> ActivityMatrix {
        let end = self.current_time_ns();
        self.matrix.active.push(vec![false; self.channel_count]);
        self.matrix.block_times.push(end);
        self.matrix.file_length_ns = end;
        self.matrix
    }
}

impl Default for ActivityAnalyser {
    fn default() -> Self {
        Self::new()
    }
}

/// Drain a sample source into a completed activity matrix
pub fn analyse_source(
    source: &mut dyn SampleSource,
    settings: &AnalyserSettings,
) -> Result<ActivityMatrix, DomainError> {
    settings.validate()?;
    if source.sample_rate() != settings.time_base_hz {
        warn!(
            sample_rate = source.sample_rate(),
            time_base_hz = settings.time_base_hz,
            "Sample rate differs from the analysis time base; block times follow the time base"
        );
    }
    let mut analyser = ActivityAnalyser::from_settings(settings);

    while let Some(block) = source.next_block()? {
        analyser.push_block(&block);
    }

    let matrix = analyser.finish();
    info!(
        blocks = matrix.len(),
        channels = source.channel_count(),
        file_length_ns = matrix.file_length_ns,
        "Activity analysis complete"
    );
    Ok(matrix)
}

/// Per-channel activity overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelActivity {
    pub channel: usize,
    pub active_blocks: usize,
    /// Start time of the first active block
    pub first_active_ns: Option<i64>,
    /// Start time of the block following the last active block
    pub last_active_end_ns: Option<i64>,
}

/// Overview of an activity matrix for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub blocks: usize,
    pub file_length_ns: i64,
    pub channels: Vec<ChannelActivity>,
}

impl ActivitySummary {
    pub fn from_matrix(matrix: &ActivityMatrix) -> Self {
        let channel_count = matrix.active.iter().map(|flags| flags.len()).max().unwrap_or(0);
        let channels = (0..channel_count)
            .map(|ch| {
                let active: Vec<usize> = (0..matrix.len()).filter(|&b| matrix.is_active(b, ch)).collect();
                let end_of = |block: usize| {
                    matrix
                        .block_times
                        .get(block + 1)
                        .copied()
                        .unwrap_or(matrix.file_length_ns)
                };
                ChannelActivity {
                    channel: ch,
                    active_blocks: active.len(),
                    first_active_ns: active.first().map(|&b| matrix.block_time(b)),
                    last_active_end_ns: active.last().map(|&b| end_of(b)),
                }
            })
            .collect();

        Self {
            blocks: matrix.len(),
            file_length_ns: matrix.file_length_ns,
            channels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InterleavedSource;
    use crate::domain::model::BlockDescription;

    fn block(frames: usize, channels: usize, value: f32) -> SampleBlock {
        let info = BlockDescription::new(frames, channels, 48_000).unwrap();
        SampleBlock::new(info, vec![value; frames * channels]).unwrap()
    }

    #[test]
    fn test_silence_is_inactive_and_constant_is_active() {
        for channels in [1, 2, 6] {
            for frames in [1, 64, 1024] {
                let mut analyser = ActivityAnalyser::new();
                analyser.push_block(&block(frames, channels, 0.0));
                analyser.push_block(&block(frames, channels, 0.5));
                let matrix = analyser.finish();
                assert!(matrix.active[0].iter().all(|a| !a));
                assert!(matrix.active[1].iter().all(|a| *a));
            }
        }
    }

    #[test]
    fn test_two_channel_literal_signal() {
        let duration = 1000;
        let block_size = 100;
        let channels = 2;

        let mut input = Vec::with_capacity(duration * channels);
        for i in 0..duration {
            input.push(if i < duration / 4 { 0.0 } else { 0.5 });
            input.push(if i >= duration / 2 { 0.0 } else { -0.5 });
        }

        let mut source = InterleavedSource::new(input, channels, 48_000, block_size).unwrap();
        let matrix = analyse_source(&mut source, &AnalyserSettings::default()).unwrap();

        let blocks = duration / block_size;
        assert_eq!(matrix.len(), blocks + 1);
        for i in 0..blocks {
            assert_eq!(matrix.is_active(i, 0), i >= blocks / 4, "block {} channel 0", i);
            assert_eq!(matrix.is_active(i, 1), i < blocks / 2, "block {} channel 1", i);
        }
    }

    #[test]
    fn test_terminal_block_and_times() {
        let mut analyser = ActivityAnalyser::new();
        for _ in 0..3 {
            analyser.push_block(&block(480, 2, 0.5));
        }
        let matrix = analyser.finish();

        assert_eq!(matrix.block_times, vec![0, 10_000_000, 20_000_000, 30_000_000]);
        assert_eq!(matrix.file_length_ns, 30_000_000);
        assert_eq!(matrix.active[3], vec![false, false]);
        assert!(matrix.validate().is_ok());
    }

    #[test]
    fn test_custom_time_base_and_threshold() {
        let mut analyser = ActivityAnalyser::new().with_time_base(1000).with_threshold(0.6);
        analyser.push_block(&block(500, 1, 0.5));
        let matrix = analyser.finish();
        assert!(!matrix.is_active(0, 0));
        assert_eq!(matrix.file_length_ns, 500_000_000);
    }

    #[test]
    fn test_empty_stream_yields_terminal_block_only() {
        let matrix = ActivityAnalyser::new().finish();
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix.file_length_ns, 0);
    }

    #[test]
    fn test_summary() {
        let mut analyser = ActivityAnalyser::new();
        analyser.push_block(&block(480, 1, 0.0));
        analyser.push_block(&block(480, 1, 0.5));
        let summary = ActivitySummary::from_matrix(&analyser.finish());
        assert_eq!(summary.blocks, 3);
        assert_eq!(summary.channels[0].active_blocks, 1);
        assert_eq!(summary.channels[0].first_active_ns, Some(10_000_000));
        assert_eq!(summary.channels[0].last_active_end_ns, Some(20_000_000));
    }
}
