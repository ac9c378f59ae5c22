//! Deleting removed objects and everything only they own

use tracing::{debug, info, warn};

use crate::document::{AudioObject, ChannelFormat, Handle, PackFormat, TrackFormat, TrackUid};
use crate::domain::errors::DomainError;
use crate::engine::RewriteSession;
use crate::planner::ObjectRecord;

impl RewriteSession<'_> {
    /// An object other than `owner` that survives the pass
    fn is_live_other(&self, other: Handle<AudioObject>, owner: Handle<AudioObject>) -> bool {
        other != owner && !self.removed.contains(&other)
    }

    /// A track UID held by a surviving object other than `owner`
    fn track_uid_held_live(&self, uid: Handle<TrackUid>, owner: Handle<AudioObject>) -> bool {
        self.document
            .objects_using_track_uid(uid)
            .into_iter()
            .any(|other| self.is_live_other(other, owner))
    }

    fn track_format_held_live(&self, track: Handle<TrackFormat>, owner: Handle<AudioObject>) -> bool {
        self.document
            .track_uids_using_track_format(track)
            .into_iter()
            .any(|uid| self.track_uid_held_live(uid, owner))
    }

    fn keep_shared(&mut self, element: String) {
        let conflict = DomainError::SharedElementConflict(format!(
            "{} is still used by a surviving object and was kept",
            element
        ));
        warn!(element = %element, "{}", conflict);
        self.report.recovered(&conflict);
    }

    /// Delete a removed object with its exclusive packs, channels, stream and
    /// track formats and track UIDs.
    ///
    /// Anything still reached by a surviving object is kept and the conflict
    /// is recorded in the report.
    pub fn remove_object_tree(&mut self, record: &ObjectRecord) {
        let owner = record.object;
        let Some(obj) = self.document.objects.get(owner).cloned() else {
            return;
        };

        for pack in self.document.packs.live(&obj.pack_refs) {
            self.remove_pack_tree(pack, owner);
        }

        for uid_handle in self.document.track_uids.live(&obj.track_uid_refs) {
            if self.track_uid_held_live(uid_handle, owner) {
                continue;
            }
            if let Some(uid) = self.document.remove_track_uid(uid_handle) {
                self.channel_map.remove(&uid.id);
                self.report.deleted(uid.id);
            }
        }

        if self.document.remove_object(owner).is_some() {
            self.report.deleted(record.object_id);
        }
        info!(object = %record.object_id, "Removed inactive object");
    }

    /// Delete a pack that `owner` no longer needs, with the channels only it reaches
    pub fn remove_pack_tree(&mut self, pack: Handle<PackFormat>, owner: Handle<AudioObject>) {
        let Some(pack_id) = self.document.packs.id_of(pack) else {
            return;
        };
        if pack_id.is_common_definition() {
            debug!(pack = %pack_id, "Common definition pack kept");
            return;
        }

        for channel in self.document.channels_of_pack(pack) {
            self.remove_channel_tree(channel, owner);
        }

        let pack_shared = self
            .document
            .objects_using_pack(pack)
            .into_iter()
            .any(|other| self.is_live_other(other, owner))
            || self
                .document
                .track_uids_using_pack(pack)
                .into_iter()
                .any(|uid| self.track_uid_held_live(uid, owner));
        if pack_shared {
            debug!(pack = %pack_id, "Pack still used by another object");
            return;
        }
        if self.document.remove_pack(pack).is_some() {
            self.report.deleted(pack_id);
        }
    }

    fn remove_channel_tree(&mut self, channel: Handle<ChannelFormat>, owner: Handle<AudioObject>) {
        let Some(channel_id) = self.document.channels.id_of(channel) else {
            return;
        };
        if channel_id.is_common_definition() {
            return;
        }

        let shared = self
            .document
            .objects_using_channel(channel)
            .into_iter()
            .any(|other| self.is_live_other(other, owner))
            || self
                .document
                .track_uids_using_channel(channel)
                .into_iter()
                .any(|uid| self.track_uid_held_live(uid, owner));
        if shared {
            self.keep_shared(channel_id.to_string());
            return;
        }

        // A stream stays while one of its track formats is bound by a
        // surviving track UID; the channel stays while one of its streams does.
        let mut streams_kept = false;
        for stream in self.document.streams_using_channel(channel) {
            let mut tracks_kept = false;
            for track in self.document.track_formats_using_stream(stream) {
                if self.track_format_held_live(track, owner) {
                    if let Some(track_id) = self.document.track_formats.id_of(track) {
                        self.keep_shared(track_id.to_string());
                    }
                    tracks_kept = true;
                    continue;
                }
                if let Some(removed) = self.document.remove_track_format(track) {
                    self.report.deleted(removed.id);
                }
            }
            if tracks_kept {
                streams_kept = true;
                continue;
            }
            if let Some(removed) = self.document.remove_stream(stream) {
                self.report.deleted(removed.id);
            }
        }
        if streams_kept {
            debug!(channel = %channel_id, "Channel kept under a surviving stream");
            return;
        }
        if self.document.remove_channel(channel).is_some() {
            self.report.deleted(channel_id);
        }
    }
}
