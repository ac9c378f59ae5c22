//! Trimming parameter blocks to a new object window

use tracing::{debug, info};

use crate::document::blocks::{ChannelBlocks, ObjectsBlock, TimedBlock};
use crate::document::{AudioObject, ChannelFormat, Handle};
use crate::domain::model::{Interval, NS_PER_MS};
use crate::engine::RewriteSession;
use crate::planner::{ObjectRecord, Resolution};

/// New object window relative to the object's original start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockWindow {
    pub off_start: i64,
    pub off_end: i64,
}

impl BlockWindow {
    pub fn new(original: Interval, resolved: Interval) -> Self {
        Self {
            off_start: resolved.start.saturating_sub(original.start),
            off_end: resolved.end.saturating_sub(original.start),
        }
    }
}

/// Block timing after classification; `end` is `None` for unbounded blocks
#[derive(Debug, Clone, Copy)]
struct Kept {
    index: usize,
    start: i64,
    end: Option<i64>,
}

fn classify<B: TimedBlock>(index: usize, block: &B, window: &BlockWindow) -> Option<Kept> {
    let start = block.rtime();
    let end = block.duration().map(|d| start.saturating_add(d));

    if matches!(end, Some(end) if end <= window.off_start) || start > window.off_end {
        return None;
    }
    Some(Kept {
        index,
        start: start.max(window.off_start),
        end: end.map(|e| e.min(window.off_end)),
    })
}

/// Trim a block sequence to `window`.
///
/// The result always starts at relative time zero and is never empty when
/// the input was not. Dropping a leading run inserts a zero-length boundary
/// block with counter 1 in front of the kept blocks. Unbounded blocks stay
/// unbounded; bounded ones always carry both rtime and duration.
pub fn trim_blocks<B: TimedBlock>(blocks: &[B], window: &BlockWindow) -> Vec<B> {
    let kept: Vec<Kept> = blocks
        .iter()
        .enumerate()
        .filter_map(|(i, b)| classify(i, b, window))
        .collect();

    let Some(first) = kept.first().copied() else {
        // Nothing overlaps: keep one unbounded block so the channel is never empty
        return blocks
            .first()
            .map(|b| {
                let mut replacement = b.clone();
                replacement.set_counter(1);
                replacement.set_rtime(None);
                replacement.set_duration(None);
                vec![replacement]
            })
            .unwrap_or_default();
    };

    let boundary = first.index > 0;
    let mut trimmed = Vec::with_capacity(kept.len() + usize::from(boundary));

    if boundary {
        let mut zero = blocks[first.index].clone();
        zero.set_counter(1);
        zero.set_rtime(Some(0));
        zero.set_duration(Some(0));
        trimmed.push(zero);
    }

    for (n, k) in kept.iter().enumerate() {
        let mut block = blocks[k.index].clone();
        let counter = n + 1 + usize::from(boundary);
        block.set_counter(counter as u32);
        let rtime = k.start.saturating_sub(first.start);
        match k.end {
            Some(end) => {
                block.set_rtime(Some(rtime));
                block.set_duration(Some(end.saturating_sub(k.start)));
            }
            None => {
                block.set_rtime((rtime != 0).then_some(rtime));
                block.set_duration(None);
            }
        }
        trimmed.push(block);
    }
    trimmed
}

/// Keep jump-position interpolation inside each object block
pub fn clamp_interpolation(blocks: &mut [ObjectsBlock]) {
    for block in blocks.iter_mut() {
        let duration = block.timing.duration_ns;
        let Some(jump) = block.jump_position.as_mut() else {
            continue;
        };
        if !jump.flag {
            continue;
        }
        if duration == Some(0) {
            jump.flag = false;
            jump.interpolation_length_ns = None;
            continue;
        }
        if let Some(length) = jump.interpolation_length_ns {
            let length = match duration {
                Some(d) => length.min(d),
                None => length,
            };
            jump.interpolation_length_ns = (length >= NS_PER_MS).then_some(length);
        }
    }
}

/// Trim a channel's blocks whatever its type definition
pub fn rewrite_channel_blocks(blocks: &mut ChannelBlocks, window: &BlockWindow) {
    match blocks {
        ChannelBlocks::DirectSpeakers(b) => *b = trim_blocks(b, window),
        ChannelBlocks::Matrix(b) => *b = trim_blocks(b, window),
        ChannelBlocks::Objects(b) => {
            *b = trim_blocks(b, window);
            clamp_interpolation(b);
        }
        ChannelBlocks::Hoa(b) => *b = trim_blocks(b, window),
        ChannelBlocks::Binaural(b) => *b = trim_blocks(b, window),
    }
}

impl RewriteSession<'_> {
    /// Another live object reaches this channel through its packs
    pub fn channel_shared_with_live(&self, channel: Handle<ChannelFormat>, owner: Handle<AudioObject>) -> bool {
        self.document
            .objects_using_channel(channel)
            .into_iter()
            .any(|other| other != owner && !self.removed.contains(&other))
    }

    /// Trim the blocks of every channel owned by the objects carrying a record
    pub fn rewrite_blocks(&mut self, record: &ObjectRecord) {
        if record.resolution() == Resolution::Unchanged {
            return;
        }

        for (object, interval) in self.targets(record) {
            let window = BlockWindow::new(record.original, interval);
            let packs = self
                .document
                .objects
                .get(object)
                .map(|obj| self.document.packs.live(&obj.pack_refs))
                .unwrap_or_default();

            for pack in packs {
                for channel in self.document.channels_of_pack(pack) {
                    let Some(channel_id) = self.document.channels.id_of(channel) else {
                        continue;
                    };
                    if channel_id.is_common_definition() {
                        continue;
                    }
                    if self.channel_shared_with_live(channel, object) {
                        debug!(channel = %channel_id, "Channel shared with another object, blocks kept");
                        continue;
                    }
                    if let Some(format) = self.document.channels.get_mut(channel) {
                        let before = format.blocks.len();
                        rewrite_channel_blocks(&mut format.blocks, &window);
                        debug!(
                            channel = %channel_id,
                            before,
                            after = format.blocks.len(),
                            "Rewrote blocks"
                        );
                        self.report.trimmed_channels.push(channel_id.to_string());
                    }
                }
            }
        }
        info!(object = %record.object_id, "Blocks rewritten");
    }
}
