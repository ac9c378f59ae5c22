//! Object interval planning
//!
//! Builds one [`ObjectRecord`] per timed object and resolves it against the
//! activity matrix. Planning never touches the document; the rewriter takes
//! the complete record set afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::document::ids::ObjectId;
use crate::document::{AudioObject, Document, Handle};
use crate::domain::errors::DomainError;
use crate::domain::model::*;

pub mod resolver;

pub use resolver::IntervalResolver;

/// What resolution decided for one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Resolution {
    /// Active across its whole original window
    Unchanged,
    /// One interval narrower than the original
    Trimmed { interval: Interval },
    /// Several disjoint intervals, each becoming a child object
    Split { intervals: Vec<Interval> },
    /// No activity at all
    Removed,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Unchanged => write!(f, "unchanged"),
            Resolution::Trimmed { interval } => write!(f, "trimmed to {}", interval),
            Resolution::Split { intervals } => {
                write!(f, "split into {}:", intervals.len())?;
                for interval in intervals {
                    write!(f, " {}", interval)?;
                }
                Ok(())
            }
            Resolution::Removed => write!(f, "removed"),
        }
    }
}

/// Per-object working state for one rewrite pass
#[derive(Debug, Clone)]
pub struct ObjectRecord {
    pub object: Handle<AudioObject>,
    pub object_id: ObjectId,
    pub name: String,
    pub original: Interval,
    pub tracks: Vec<TrackInfo>,
    /// Index 0 holds the original interval, the rest the resolved ones
    pub intervals: Vec<Interval>,
    /// One per child object once a split is applied
    pub new_object_ids: Vec<ObjectId>,
    pub removed: bool,
    pub limits: ProductionProfileLimits,
}

impl ObjectRecord {
    /// Resolved intervals, excluding the original
    pub fn resolved(&self) -> &[Interval] {
        self.intervals.get(1..).unwrap_or(&[])
    }

    /// Replace the resolved intervals, keeping the original at index 0
    pub fn set_resolved(&mut self, resolved: Vec<Interval>) {
        self.intervals.truncate(1);
        self.removed = resolved.is_empty();
        self.intervals.extend(resolved);
    }

    /// Channels of the referenced tracks that appear in the channel map
    pub fn channels(&self) -> Vec<usize> {
        let mut channels: Vec<usize> = self.tracks.iter().filter_map(|t| t.channel).collect();
        channels.sort_unstable();
        channels.dedup();
        channels
    }

    pub fn is_split(&self) -> bool {
        self.resolved().len() > 1
    }

    pub fn resolution(&self) -> Resolution {
        match self.resolved() {
            [] => Resolution::Removed,
            [only] if *only == self.original => Resolution::Unchanged,
            [only] => Resolution::Trimmed { interval: *only },
            many => Resolution::Split {
                intervals: many.to_vec(),
            },
        }
    }
}

/// Build a record for every object that carries packs or track UIDs.
///
/// Pure grouping objects are skipped. A missing start reads as zero and a
/// missing duration as running to the end of the file.
pub fn collect_records(
    document: &Document,
    channel_map: &ChannelMap,
    file_length_ns: i64,
    limits: &ProductionProfileLimits,
) -> Vec<ObjectRecord> {
    let mut objects: Vec<(Handle<AudioObject>, &AudioObject)> = document.objects.iter().collect();
    objects.sort_by_key(|(_, obj)| obj.id);

    objects
        .into_iter()
        .filter(|(_, obj)| {
            let grouping = obj.pack_refs.is_empty() && obj.track_uid_refs.is_empty();
            if grouping {
                debug!(object = %obj.id, "Skipping grouping object");
            }
            !grouping
        })
        .map(|(handle, obj)| {
            let start = obj.start_or_zero();
            let end = obj.end_or(file_length_ns).max(start);
            let original = Interval { start, end };
            let tracks = obj
                .track_uid_refs
                .iter()
                .filter_map(|h| document.track_uids.id_of(*h))
                .map(|track_uid| TrackInfo {
                    track_uid,
                    channel: channel_map.channel(&track_uid),
                })
                .collect();
            ObjectRecord {
                object: handle,
                object_id: obj.id,
                name: obj.name.clone(),
                original,
                tracks,
                intervals: vec![original],
                new_object_ids: Vec::new(),
                removed: false,
                limits: *limits,
            }
        })
        .collect()
}

/// Resolved records for a whole document plus the conditions absorbed on the way
#[derive(Debug, Clone)]
pub struct ObjectPlan {
    pub records: Vec<ObjectRecord>,
    pub recovered: Vec<DomainError>,
}

/// Serializable view of one planned object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub object_id: ObjectId,
    pub name: String,
    pub original: Interval,
    pub resolution: Resolution,
}

impl ObjectPlan {
    /// Collect and resolve every object against a completed activity matrix
    pub fn build(
        document: &Document,
        channel_map: &ChannelMap,
        matrix: &ActivityMatrix,
        limits: &ProductionProfileLimits,
    ) -> Result<Self, DomainError> {
        matrix.validate()?;
        limits.validate()?;

        let mut records = collect_records(document, channel_map, matrix.file_length_ns, limits);
        let resolver = IntervalResolver::new(matrix);
        let recovered = resolver.resolve_all(&mut records);

        info!(
            objects = records.len(),
            removed = records.iter().filter(|r| r.removed).count(),
            split = records.iter().filter(|r| r.is_split()).count(),
            "Object plan ready"
        );
        Ok(Self { records, recovered })
    }

    pub fn entries(&self) -> Vec<PlanEntry> {
        self.records
            .iter()
            .map(|r| PlanEntry {
                object_id: r.object_id,
                name: r.name.clone(),
                original: r.original,
                resolution: r.resolution(),
            })
            .collect()
    }

    /// True when no object changes
    pub fn is_noop(&self) -> bool {
        self.records
            .iter()
            .all(|r| r.resolution() == Resolution::Unchanged)
    }
}
