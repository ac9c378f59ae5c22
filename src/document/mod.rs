//! Arena-backed audio definition document
//!
//! Elements live in one [`Arena`] per kind and refer to each other through
//! forward handle lists only. Reverse lookups ("who references this pack?")
//! are answered by scanning those lists, so the graph never owns a cycle.
//! Removing an element scrubs every forward reference to it.

pub mod arena;
pub mod blocks;
pub mod data;
pub mod elements;
pub mod ids;

use crate::domain::model::ChannelMap;

pub use arena::{Arena, Element, Handle};
pub use blocks::{ChannelBlocks, TimedBlock};
pub use data::DocumentData;
pub use elements::*;

/// The document graph
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub objects: Arena<AudioObject>,
    pub packs: Arena<PackFormat>,
    pub channels: Arena<ChannelFormat>,
    pub streams: Arena<StreamFormat>,
    pub track_formats: Arena<TrackFormat>,
    pub track_uids: Arena<TrackUid>,
}

/// A document together with its track UID to channel mapping
#[derive(Debug, Clone, Default)]
pub struct AdmBundle {
    pub document: Document,
    pub channel_map: ChannelMap,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------
    // Removal
    // ---------------------------------------------------------------

    pub fn remove_object(&mut self, handle: Handle<AudioObject>) -> Option<AudioObject> {
        let removed = self.objects.remove(handle)?;
        for other in self.objects.handles() {
            if let Some(obj) = self.objects.get_mut(other) {
                obj.object_refs.retain(|h| *h != handle);
            }
        }
        Some(removed)
    }

    pub fn remove_pack(&mut self, handle: Handle<PackFormat>) -> Option<PackFormat> {
        let removed = self.packs.remove(handle)?;
        for obj_handle in self.objects.handles() {
            if let Some(obj) = self.objects.get_mut(obj_handle) {
                obj.pack_refs.retain(|h| *h != handle);
            }
        }
        for uid_handle in self.track_uids.handles() {
            if let Some(uid) = self.track_uids.get_mut(uid_handle) {
                if uid.pack_ref == Some(handle) {
                    uid.pack_ref = None;
                }
            }
        }
        Some(removed)
    }

    pub fn remove_channel(&mut self, handle: Handle<ChannelFormat>) -> Option<ChannelFormat> {
        let removed = self.channels.remove(handle)?;
        for pack_handle in self.packs.handles() {
            if let Some(pack) = self.packs.get_mut(pack_handle) {
                pack.channel_refs.retain(|h| *h != handle);
            }
        }
        for stream_handle in self.streams.handles() {
            if let Some(stream) = self.streams.get_mut(stream_handle) {
                if stream.channel_ref == Some(handle) {
                    stream.channel_ref = None;
                }
            }
        }
        for uid_handle in self.track_uids.handles() {
            if let Some(uid) = self.track_uids.get_mut(uid_handle) {
                if uid.channel_ref == Some(handle) {
                    uid.channel_ref = None;
                }
            }
        }
        Some(removed)
    }

    pub fn remove_stream(&mut self, handle: Handle<StreamFormat>) -> Option<StreamFormat> {
        let removed = self.streams.remove(handle)?;
        for track_handle in self.track_formats.handles() {
            if let Some(track) = self.track_formats.get_mut(track_handle) {
                if track.stream_ref == Some(handle) {
                    track.stream_ref = None;
                }
            }
        }
        Some(removed)
    }

    pub fn remove_track_format(&mut self, handle: Handle<TrackFormat>) -> Option<TrackFormat> {
        let removed = self.track_formats.remove(handle)?;
        for uid_handle in self.track_uids.handles() {
            if let Some(uid) = self.track_uids.get_mut(uid_handle) {
                if uid.track_format_ref == Some(handle) {
                    uid.track_format_ref = None;
                }
            }
        }
        Some(removed)
    }

    pub fn remove_track_uid(&mut self, handle: Handle<TrackUid>) -> Option<TrackUid> {
        let removed = self.track_uids.remove(handle)?;
        for obj_handle in self.objects.handles() {
            if let Some(obj) = self.objects.get_mut(obj_handle) {
                obj.track_uid_refs.retain(|h| *h != handle);
            }
        }
        Some(removed)
    }

    // ---------------------------------------------------------------
    // Referrer queries
    // ---------------------------------------------------------------

    /// Objects referencing a pack format directly
    pub fn objects_using_pack(&self, pack: Handle<PackFormat>) -> Vec<Handle<AudioObject>> {
        self.objects
            .iter()
            .filter(|(_, obj)| obj.pack_refs.contains(&pack))
            .map(|(h, _)| h)
            .collect()
    }

    /// Objects reaching a channel format through one of their packs
    pub fn objects_using_channel(&self, channel: Handle<ChannelFormat>) -> Vec<Handle<AudioObject>> {
        self.objects
            .iter()
            .filter(|(_, obj)| {
                obj.pack_refs.iter().any(|p| {
                    self.packs
                        .get(*p)
                        .map(|pack| pack.channel_refs.contains(&channel))
                        .unwrap_or(false)
                })
            })
            .map(|(h, _)| h)
            .collect()
    }

    pub fn objects_using_track_uid(&self, uid: Handle<TrackUid>) -> Vec<Handle<AudioObject>> {
        self.objects
            .iter()
            .filter(|(_, obj)| obj.track_uid_refs.contains(&uid))
            .map(|(h, _)| h)
            .collect()
    }

    pub fn streams_using_channel(&self, channel: Handle<ChannelFormat>) -> Vec<Handle<StreamFormat>> {
        self.streams
            .iter()
            .filter(|(_, stream)| stream.channel_ref == Some(channel))
            .map(|(h, _)| h)
            .collect()
    }

    pub fn track_formats_using_stream(&self, stream: Handle<StreamFormat>) -> Vec<Handle<TrackFormat>> {
        self.track_formats
            .iter()
            .filter(|(_, track)| track.stream_ref == Some(stream))
            .map(|(h, _)| h)
            .collect()
    }

    pub fn track_uids_using_channel(&self, channel: Handle<ChannelFormat>) -> Vec<Handle<TrackUid>> {
        self.track_uids
            .iter()
            .filter(|(_, uid)| uid.channel_ref == Some(channel))
            .map(|(h, _)| h)
            .collect()
    }

    pub fn track_uids_using_pack(&self, pack: Handle<PackFormat>) -> Vec<Handle<TrackUid>> {
        self.track_uids
            .iter()
            .filter(|(_, uid)| uid.pack_ref == Some(pack))
            .map(|(h, _)| h)
            .collect()
    }

    pub fn track_uids_using_track_format(&self, track: Handle<TrackFormat>) -> Vec<Handle<TrackUid>> {
        self.track_uids
            .iter()
            .filter(|(_, uid)| uid.track_format_ref == Some(track))
            .map(|(h, _)| h)
            .collect()
    }

    /// Live channel handles of a pack, in pack order
    pub fn channels_of_pack(&self, pack: Handle<PackFormat>) -> Vec<Handle<ChannelFormat>> {
        self.packs
            .get(pack)
            .map(|p| self.channels.live(&p.channel_refs))
            .unwrap_or_default()
    }

    /// Total number of elements across all kinds
    pub fn element_count(&self) -> usize {
        self.objects.len()
            + self.packs.len()
            + self.channels.len()
            + self.streams.len()
            + self.track_formats.len()
            + self.track_uids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::blocks::ChannelBlocks;
    use crate::document::ids::*;

    fn small_document() -> (Document, Handle<AudioObject>, Handle<PackFormat>, Handle<ChannelFormat>) {
        let mut doc = Document::new();
        let channel_id = ChannelFormatId::new(TypeDefinition::Objects, 0x1001);
        let channel = doc
            .channels
            .insert(ChannelFormat::new(channel_id, "ch", ChannelBlocks::empty(TypeDefinition::Objects)))
            .unwrap();
        let mut pack = PackFormat::new(PackFormatId::new(TypeDefinition::Objects, 0x1001), "pack");
        pack.channel_refs.push(channel);
        let pack = doc.packs.insert(pack).unwrap();
        let stream = doc
            .streams
            .insert(StreamFormat {
                id: StreamFormatId::new(TypeDefinition::Objects, 0x1001),
                name: "PCM_ch".to_string(),
                channel_ref: Some(channel),
            })
            .unwrap();
        doc.track_formats
            .insert(TrackFormat {
                id: TrackFormatId::new(TypeDefinition::Objects, 0x1001, 1),
                name: "PCM_ch".to_string(),
                stream_ref: Some(stream),
            })
            .unwrap();
        let mut uid = TrackUid::new(TrackUidId(1));
        uid.channel_ref = Some(channel);
        uid.pack_ref = Some(pack);
        let uid = doc.track_uids.insert(uid).unwrap();
        let mut obj = AudioObject::new(ObjectId(0x1001), "obj");
        obj.pack_refs.push(pack);
        obj.track_uid_refs.push(uid);
        let obj = doc.objects.insert(obj).unwrap();
        (doc, obj, pack, channel)
    }

    #[test]
    fn test_referrer_queries() {
        let (doc, obj, pack, channel) = small_document();
        assert_eq!(doc.objects_using_pack(pack), vec![obj]);
        assert_eq!(doc.objects_using_channel(channel), vec![obj]);
        assert_eq!(doc.streams_using_channel(channel).len(), 1);
        assert_eq!(doc.track_uids_using_pack(pack).len(), 1);
        assert_eq!(doc.track_uids_using_channel(channel).len(), 1);
    }

    #[test]
    fn test_remove_channel_scrubs_references() {
        let (mut doc, _obj, pack, channel) = small_document();
        doc.remove_channel(channel).unwrap();
        assert!(doc.channels_of_pack(pack).is_empty());
        assert!(doc.streams.iter().all(|(_, s)| s.channel_ref.is_none()));
        assert!(doc.track_uids.iter().all(|(_, u)| u.channel_ref.is_none()));
    }

    #[test]
    fn test_remove_pack_scrubs_objects() {
        let (mut doc, obj, pack, _channel) = small_document();
        doc.remove_pack(pack).unwrap();
        assert!(doc.objects.get(obj).unwrap().pack_refs.is_empty());
        assert!(doc.objects_using_pack(pack).is_empty());
        assert_eq!(doc.element_count(), 5);
    }
}
