//! Document element kinds and their forward references

use crate::document::arena::{Element, Handle};
use crate::document::blocks::ChannelBlocks;
use crate::document::ids::*;

/// An audio object: a time interval plus the content it plays
#[derive(Debug, Clone, PartialEq)]
pub struct AudioObject {
    pub id: ObjectId,
    pub name: String,
    pub start_ns: Option<i64>,
    pub duration_ns: Option<i64>,
    pub pack_refs: Vec<Handle<PackFormat>>,
    pub object_refs: Vec<Handle<AudioObject>>,
    pub track_uid_refs: Vec<Handle<TrackUid>>,
}

impl AudioObject {
    pub fn new(id: ObjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            start_ns: None,
            duration_ns: None,
            pack_refs: Vec::new(),
            object_refs: Vec::new(),
            track_uid_refs: Vec::new(),
        }
    }

    /// Start, defaulting to the file start
    pub fn start_or_zero(&self) -> i64 {
        self.start_ns.unwrap_or(0)
    }

    /// End, defaulting to `file_length_ns` when no duration is set
    pub fn end_or(&self, file_length_ns: i64) -> i64 {
        match self.duration_ns {
            Some(duration) => self.start_or_zero().saturating_add(duration),
            None => file_length_ns,
        }
    }

    /// Copy of the element's own properties without any references
    pub fn detached_copy(&self, id: ObjectId) -> Self {
        Self {
            id,
            name: self.name.clone(),
            start_ns: self.start_ns,
            duration_ns: self.duration_ns,
            pack_refs: Vec::new(),
            object_refs: Vec::new(),
            track_uid_refs: Vec::new(),
        }
    }
}

impl Element for AudioObject {
    type Id = ObjectId;

    fn id(&self) -> ObjectId {
        self.id
    }

    fn kind() -> &'static str {
        "audioObject"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackFormat {
    pub id: PackFormatId,
    pub name: String,
    pub channel_refs: Vec<Handle<ChannelFormat>>,
}

impl PackFormat {
    pub fn new(id: PackFormatId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            channel_refs: Vec::new(),
        }
    }
}

impl Element for PackFormat {
    type Id = PackFormatId;

    fn id(&self) -> PackFormatId {
        self.id
    }

    fn kind() -> &'static str {
        "audioPackFormat"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelFormat {
    pub id: ChannelFormatId,
    pub name: String,
    pub blocks: ChannelBlocks,
}

impl ChannelFormat {
    pub fn new(id: ChannelFormatId, name: impl Into<String>, blocks: ChannelBlocks) -> Self {
        Self {
            id,
            name: name.into(),
            blocks,
        }
    }

    /// Copy under a new ID, renaming and relabelling its blocks
    pub fn duplicate(&self, id: ChannelFormatId, name: String) -> Self {
        let mut blocks = self.blocks.clone();
        blocks.relabel(id);
        Self { id, name, blocks }
    }
}

impl Element for ChannelFormat {
    type Id = ChannelFormatId;

    fn id(&self) -> ChannelFormatId {
        self.id
    }

    fn kind() -> &'static str {
        "audioChannelFormat"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamFormat {
    pub id: StreamFormatId,
    pub name: String,
    pub channel_ref: Option<Handle<ChannelFormat>>,
}

impl Element for StreamFormat {
    type Id = StreamFormatId;

    fn id(&self) -> StreamFormatId {
        self.id
    }

    fn kind() -> &'static str {
        "audioStreamFormat"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackFormat {
    pub id: TrackFormatId,
    pub name: String,
    pub stream_ref: Option<Handle<StreamFormat>>,
}

impl Element for TrackFormat {
    type Id = TrackFormatId;

    fn id(&self) -> TrackFormatId {
        self.id
    }

    fn kind() -> &'static str {
        "audioTrackFormat"
    }
}

/// Binds a physical track to a channel format and pack format
#[derive(Debug, Clone, PartialEq)]
pub struct TrackUid {
    pub id: TrackUidId,
    pub sample_rate: Option<u32>,
    pub bit_depth: Option<u32>,
    pub channel_ref: Option<Handle<ChannelFormat>>,
    pub pack_ref: Option<Handle<PackFormat>>,
    pub track_format_ref: Option<Handle<TrackFormat>>,
}

impl TrackUid {
    pub fn new(id: TrackUidId) -> Self {
        Self {
            id,
            sample_rate: None,
            bit_depth: None,
            channel_ref: None,
            pack_ref: None,
            track_format_ref: None,
        }
    }
}

impl Element for TrackUid {
    type Id = TrackUidId;

    fn id(&self) -> TrackUidId {
        self.id
    }

    fn kind() -> &'static str {
        "audioTrackUID"
    }
}
