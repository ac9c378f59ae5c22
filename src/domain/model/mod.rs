// Domain models - Core types and data structures

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::ids::TrackUidId;
use crate::domain::errors::DomainError;
use crate::utils::time::format_ns;

/// Nanoseconds per millisecond
pub const NS_PER_MS: i64 = 1_000_000;

/// Nanoseconds per second
pub const NS_PER_SECOND: i64 = 1_000_000_000;

/// Default RMS magnitude above which a channel counts as active.
/// Not zero so that dither noise reads as silence.
pub const DEFAULT_ACTIVITY_THRESHOLD: f64 = 5.0e-7;

/// Half-open time interval `[start, end)` in nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: i64,
    pub end: i64,
}

impl Interval {
    /// Create a new interval, rejecting reversed bounds
    pub fn new(start: i64, end: i64) -> Result<Self, DomainError> {
        if end < start {
            return Err(DomainError::BadArgs(format!(
                "Interval end ({}) is before start ({})",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Duration in nanoseconds
    pub fn duration(&self) -> i64 {
        self.end.saturating_sub(self.start)
    }

    /// True when the interval covers no time
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Gap between the end of this interval and the start of `next`
    pub fn gap_to(&self, next: &Interval) -> i64 {
        next.start.saturating_sub(self.end)
    }

    /// Check whether an instant lies inside the interval
    pub fn contains(&self, ns: i64) -> bool {
        ns >= self.start && ns < self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", format_ns(self.start), format_ns(self.end))
    }
}

/// Describes the layout of one block of interleaved samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDescription {
    pub sample_count: usize,
    pub channel_count: usize,
    pub sample_rate: u32,
}

impl BlockDescription {
    /// Create a new block description with validation
    pub fn new(sample_count: usize, channel_count: usize, sample_rate: u32) -> Result<Self, DomainError> {
        if channel_count == 0 {
            return Err(DomainError::BadArgs("Channel count cannot be zero".to_string()));
        }
        if sample_rate == 0 {
            return Err(DomainError::BadArgs("Sample rate cannot be zero".to_string()));
        }
        Ok(Self {
            sample_count,
            channel_count,
            sample_rate,
        })
    }
}

/// A block of interleaved floating-point samples
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBlock {
    pub info: BlockDescription,
    pub data: Vec<f32>,
}

impl SampleBlock {
    /// Create a sample block, checking the buffer matches the description
    pub fn new(info: BlockDescription, data: Vec<f32>) -> Result<Self, DomainError> {
        if data.len() != info.sample_count * info.channel_count {
            return Err(DomainError::InvalidFormat(format!(
                "Sample block holds {} values, expected {} frames x {} channels",
                data.len(),
                info.sample_count,
                info.channel_count
            )));
        }
        Ok(Self { info, data })
    }

    /// Sample at `frame` for `channel`
    pub fn sample(&self, frame: usize, channel: usize) -> f32 {
        self.data[frame * self.info.channel_count + channel]
    }

    /// Root-mean-square level of one channel over the whole block
    pub fn channel_rms(&self, channel: usize) -> f64 {
        if self.info.sample_count == 0 {
            return 0.0;
        }
        let energy: f64 = (0..self.info.sample_count)
            .map(|frame| {
                let s = self.sample(frame, channel) as f64;
                s * s
            })
            .sum();
        (energy / self.info.sample_count as f64).sqrt()
    }
}

/// Per-block, per-channel activity flags for a whole file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivityMatrix {
    /// One flag vector per processed block
    pub active: Vec<Vec<bool>>,
    /// Start time of each block in nanoseconds
    pub block_times: Vec<i64>,
    /// Total file duration in nanoseconds
    pub file_length_ns: i64,
}

impl ActivityMatrix {
    /// Number of blocks, including the terminal block
    pub fn len(&self) -> usize {
        self.block_times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.block_times.is_empty()
    }

    /// Start time of a block
    pub fn block_time(&self, block: usize) -> i64 {
        self.block_times[block]
    }

    /// Channel flag for a block; channels beyond the observed count read as inactive
    pub fn is_active(&self, block: usize, channel: usize) -> bool {
        self.active
            .get(block)
            .and_then(|flags| flags.get(channel))
            .copied()
            .unwrap_or(false)
    }

    /// Channel count observed for a block
    pub fn channel_count(&self, block: usize) -> usize {
        self.active.get(block).map(|flags| flags.len()).unwrap_or(0)
    }

    /// First block index whose start time is at or after `ns`
    pub fn first_block_at_or_after(&self, ns: i64) -> usize {
        self.block_times.partition_point(|&t| t < ns)
    }

    /// Check the structural invariant between flags and times
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.active.len() != self.block_times.len() {
            return Err(DomainError::InvalidFormat(format!(
                "Activity matrix has {} flag vectors but {} block times",
                self.active.len(),
                self.block_times.len()
            )));
        }
        Ok(())
    }
}

/// Stable mapping from track UID to zero-based channel index
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ChannelMapEntry>", into = "Vec<ChannelMapEntry>")]
pub struct ChannelMap {
    entries: BTreeMap<TrackUidId, usize>,
}

/// One track UID to channel binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMapEntry {
    pub track_uid: TrackUidId,
    pub channel: usize,
}

impl ChannelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Channel index for a track UID
    pub fn channel(&self, track_uid: &TrackUidId) -> Option<usize> {
        self.entries.get(track_uid).copied()
    }

    pub fn insert(&mut self, track_uid: TrackUidId, channel: usize) {
        self.entries.insert(track_uid, channel);
    }

    pub fn remove(&mut self, track_uid: &TrackUidId) -> Option<usize> {
        self.entries.remove(track_uid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TrackUidId, &usize)> {
        self.entries.iter()
    }

    /// Highest channel index in the map
    pub fn max_channel(&self) -> Option<usize> {
        self.entries.values().copied().max()
    }
}

impl From<Vec<ChannelMapEntry>> for ChannelMap {
    fn from(entries: Vec<ChannelMapEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.track_uid, e.channel)).collect(),
        }
    }
}

impl From<ChannelMap> for Vec<ChannelMapEntry> {
    fn from(map: ChannelMap) -> Self {
        map.entries
            .into_iter()
            .map(|(track_uid, channel)| ChannelMapEntry { track_uid, channel })
            .collect()
    }
}

impl FromIterator<(TrackUidId, usize)> for ChannelMap {
    fn from_iter<I: IntoIterator<Item = (TrackUidId, usize)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Padding, merge and floor policy applied when resolving object intervals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionProfileLimits {
    /// Adjacent intervals closer than this are merged
    pub min_gap_ns: i64,
    /// Padding subtracted from a found start
    #[serde(alias = "pre_gap_ns")]
    pub lead_in_ns: i64,
    /// Padding added to a found end
    #[serde(alias = "post_gap_ns")]
    pub lead_out_ns: i64,
    /// Floor on the duration of a resolved interval
    pub min_duration_ns: i64,
    /// Longest internal silence tolerated inside an object (informational)
    pub max_gap_ns: i64,
    /// Keep resolved intervals inside the original object bounds
    pub crop_objects: bool,
}

impl Default for ProductionProfileLimits {
    fn default() -> Self {
        Self {
            min_gap_ns: 1000 * NS_PER_MS,
            lead_in_ns: 20 * NS_PER_MS,
            lead_out_ns: 20 * NS_PER_MS,
            min_duration_ns: 100 * NS_PER_MS,
            max_gap_ns: 5000 * NS_PER_MS,
            crop_objects: true,
        }
    }
}

impl ProductionProfileLimits {
    /// Reject negative values
    pub fn validate(&self) -> Result<(), DomainError> {
        let fields = [
            ("min_gap_ns", self.min_gap_ns),
            ("lead_in_ns", self.lead_in_ns),
            ("lead_out_ns", self.lead_out_ns),
            ("min_duration_ns", self.min_duration_ns),
            ("max_gap_ns", self.max_gap_ns),
        ];
        for (name, value) in fields {
            if value < 0 {
                return Err(DomainError::BadArgs(format!("{} cannot be negative", name)));
            }
        }
        Ok(())
    }
}

/// Settings for the activity analyser
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyserSettings {
    /// RMS magnitude above which a channel is active
    pub threshold: f64,
    /// Frames per analysed block
    pub block_size: usize,
    /// Rate used to convert cumulative sample counts to nanoseconds
    pub time_base_hz: u32,
}

impl Default for AnalyserSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_ACTIVITY_THRESHOLD,
            block_size: 1024,
            time_base_hz: 48_000,
        }
    }
}

impl AnalyserSettings {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.threshold.is_nan() || self.threshold < 0.0 {
            return Err(DomainError::BadArgs("Activity threshold must be non-negative".to_string()));
        }
        if self.block_size == 0 {
            return Err(DomainError::BadArgs("Block size cannot be zero".to_string()));
        }
        if self.time_base_hz == 0 {
            return Err(DomainError::BadArgs("Time base cannot be zero".to_string()));
        }
        Ok(())
    }
}

/// A track referenced by an object and the channel it plays on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub track_uid: TrackUidId,
    /// `None` when the track UID is missing from the channel map
    pub channel: Option<usize>,
}

#[cfg(test)]
mod tests;
