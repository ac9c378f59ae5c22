//! Scanning the activity matrix for each object's active spans

use tracing::{debug, info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::{ActivityMatrix, Interval};
use crate::domain::rules::IntervalPolicy;
use crate::planner::ObjectRecord;

/// Resolves object records against one completed activity matrix
pub struct IntervalResolver<'a> {
    matrix: &'a ActivityMatrix,
}

impl<'a> IntervalResolver<'a> {
    pub fn new(matrix: &'a ActivityMatrix) -> Self {
        Self { matrix }
    }

    fn any_active(&self, block: usize, channels: &[usize]) -> bool {
        channels.iter().any(|&ch| self.matrix.is_active(block, ch))
    }

    /// First block at or after `from` where any channel is active and which
    /// starts before `end`
    pub fn find_start(&self, from: usize, channels: &[usize], end: i64) -> Option<usize> {
        (from..self.matrix.len())
            .take_while(|&block| self.matrix.block_time(block) < end)
            .find(|&block| self.any_active(block, channels))
    }

    /// First block at or after `from` where every channel is inactive.
    ///
    /// Returns the block index where scanning stopped and the span end time.
    /// If the window closes first, the end is the window end.
    pub fn find_end(&self, from: usize, channels: &[usize], end: i64) -> (usize, i64) {
        let mut block = from;
        while block < self.matrix.len() && self.matrix.block_time(block) < end {
            if !self.any_active(block, channels) {
                return (block, self.matrix.block_time(block));
            }
            block += 1;
        }
        (block, end)
    }

    /// Raw active spans of a channel set inside a window, before any policy
    pub fn active_spans(&self, window: Interval, channels: &[usize]) -> Vec<Interval> {
        let mut spans = Vec::new();
        let mut block = self.matrix.first_block_at_or_after(window.start);

        while let Some(start) = self.find_start(block, channels, window.end) {
            let (stop, end) = self.find_end(start, channels, window.end);
            let span = Interval {
                start: self.matrix.block_time(start),
                end,
            };
            debug!(span = %span, first_block = start, "Active span");
            spans.push(span);
            if end >= window.end {
                break;
            }
            block = stop;
        }
        spans
    }

    /// Resolve one record in place.
    ///
    /// Returns the condition absorbed when the record's activity could not be
    /// read; the record is then resolved as entirely inactive.
    pub fn resolve(&self, record: &mut ObjectRecord) -> Option<DomainError> {
        let channels = record.channels();

        let unresolved = if record.tracks.is_empty() {
            Some(format!("{} references no track UIDs", record.object_id))
        } else if channels.is_empty() {
            Some(format!(
                "{} has no track UID in the channel map",
                record.object_id
            ))
        } else if record.original.start >= self.matrix.file_length_ns && !record.original.is_empty() {
            Some(format!(
                "{} starts at or after the end of the analysed audio",
                record.object_id
            ))
        } else {
            None
        };

        let resolved = match &unresolved {
            Some(_) => Vec::new(),
            None => {
                let spans = self.active_spans(record.original, &channels);
                IntervalPolicy::resolve(
                    &spans,
                    record.original,
                    &record.limits,
                    self.matrix.file_length_ns,
                )
            }
        };
        record.set_resolved(resolved);

        info!(
            object = %record.object_id,
            original = %record.original,
            resolution = %record.resolution(),
            "Resolved object"
        );

        unresolved.map(|message| {
            warn!(object = %record.object_id, "{}; treating as inactive", message);
            DomainError::UnresolvedActivity(message)
        })
    }

    /// Resolve every record, collecting absorbed conditions
    pub fn resolve_all(&self, records: &mut [ObjectRecord]) -> Vec<DomainError> {
        records.iter_mut().filter_map(|r| self.resolve(r)).collect()
    }
}
