// Domain rules - Interval padding, merge and clamping policy

use crate::domain::model::*;

/// Policy turning raw activity spans into resolved object intervals
pub struct IntervalPolicy;

impl IntervalPolicy {
    /// Widen a raw activity span by the lead-in and lead-out pads.
    /// The start never goes below zero.
    pub fn pad(span: Interval, limits: &ProductionProfileLimits) -> Interval {
        Interval {
            start: span.start.saturating_sub(limits.lead_in_ns).max(0),
            end: span.end.saturating_add(limits.lead_out_ns),
        }
    }

    /// Extend the end so the interval lasts at least `min_duration_ns`
    pub fn apply_floor(interval: Interval, min_duration_ns: i64) -> Interval {
        Interval {
            start: interval.start,
            end: interval.end.max(interval.start.saturating_add(min_duration_ns)),
        }
    }

    /// Pad then floor one candidate
    pub fn shape(span: Interval, limits: &ProductionProfileLimits) -> Interval {
        Self::apply_floor(Self::pad(span, limits), limits.min_duration_ns)
    }

    /// Collapse adjacent intervals closer than `min_gap_ns`.
    ///
    /// Repeats full adjacent-pair scans until a scan merges nothing, so any
    /// number of intervals can fold into one. Input must be sorted by start.
    pub fn merge_close_intervals(intervals: &mut Vec<Interval>, min_gap_ns: i64) {
        loop {
            let mut merged = false;
            let mut i = 0;
            while i + 1 < intervals.len() {
                if intervals[i].gap_to(&intervals[i + 1]) < min_gap_ns {
                    let next = intervals.remove(i + 1);
                    intervals[i].end = intervals[i].end.max(next.end);
                    merged = true;
                } else {
                    i += 1;
                }
            }
            if !merged {
                break;
            }
        }
    }

    /// Bounds a resolved interval may occupy
    pub fn bounds(original: Interval, limits: &ProductionProfileLimits, file_length_ns: i64) -> Interval {
        if limits.crop_objects {
            original
        } else {
            Interval {
                start: 0,
                end: file_length_ns.max(original.end),
            }
        }
    }

    /// Clamp every interval into `bounds`.
    ///
    /// An interval cut below the floor is regrown inside the bounds, first
    /// forwards and then backwards. Empty results are dropped and neighbours
    /// that now sit too close are merged again.
    pub fn clamp(intervals: Vec<Interval>, bounds: Interval, limits: &ProductionProfileLimits) -> Vec<Interval> {
        let mut clamped: Vec<Interval> = intervals
            .into_iter()
            .filter(|interval| interval.start < bounds.end && interval.end > bounds.start)
            .map(|interval| {
                let mut start = interval.start.max(bounds.start);
                let mut end = interval.end.min(bounds.end);
                if end.saturating_sub(start) < limits.min_duration_ns {
                    end = start.saturating_add(limits.min_duration_ns).min(bounds.end);
                    start = end.saturating_sub(limits.min_duration_ns).max(bounds.start);
                }
                Interval { start, end }
            })
            .filter(|interval| !interval.is_empty())
            .collect();
        clamped.sort();
        Self::merge_close_intervals(&mut clamped, limits.min_gap_ns);
        clamped
    }

    /// Full policy over the raw activity spans of one object
    pub fn resolve(
        spans: &[Interval],
        original: Interval,
        limits: &ProductionProfileLimits,
        file_length_ns: i64,
    ) -> Vec<Interval> {
        let mut shaped: Vec<Interval> = spans.iter().map(|s| Self::shape(*s, limits)).collect();
        shaped.sort();
        Self::merge_close_intervals(&mut shaped, limits.min_gap_ns);
        Self::clamp(shaped, Self::bounds(original, limits, file_length_ns), limits)
    }

    /// Ordered, non-overlapping and separated by at least `min_gap_ns`
    pub fn is_well_formed(intervals: &[Interval], min_gap_ns: i64) -> bool {
        intervals.iter().all(|i| !i.is_empty())
            && intervals
                .windows(2)
                .all(|pair| pair[0].end <= pair[1].start && pair[0].gap_to(&pair[1]) >= min_gap_ns)
    }
}
