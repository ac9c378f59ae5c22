//! Applying resolved intervals to audio objects

use tracing::{debug, info};

use crate::document::{AudioObject, Handle, TrackUid};
use crate::domain::errors::DomainError;
use crate::domain::model::Interval;
use crate::engine::RewriteSession;
use crate::planner::{ObjectRecord, Resolution};

fn set_interval(obj: &mut AudioObject, interval: Interval) {
    obj.start_ns = Some(interval.start);
    obj.duration_ns = Some(interval.duration());
}

impl RewriteSession<'_> {
    /// Trim, split or flag one object according to its record
    pub fn apply_record(&mut self, record: &mut ObjectRecord) -> Result<(), DomainError> {
        match record.resolution() {
            Resolution::Unchanged => Ok(()),
            Resolution::Trimmed { interval } => {
                if let Some(obj) = self.document.objects.get_mut(record.object) {
                    set_interval(obj, interval);
                }
                debug!(object = %record.object_id, interval = %interval, "Trimmed in place");
                Ok(())
            }
            Resolution::Split { intervals } => self.split_object(record, &intervals),
            Resolution::Removed => {
                self.removed.insert(record.object);
                Ok(())
            }
        }
    }

    /// Turn an object into a parent of one child per interval.
    ///
    /// Every child references the parent's first pack and gets fresh track
    /// UIDs bound to that pack's channels in order. The parent keeps only its
    /// grouping references; its own track UIDs are deleted, and so are its
    /// other packs unless a surviving object still reaches them.
    fn split_object(&mut self, record: &mut ObjectRecord, intervals: &[Interval]) -> Result<(), DomainError> {
        let parent = self
            .document
            .objects
            .get(record.object)
            .cloned()
            .ok_or_else(|| DomainError::MalformedReference(format!("{} vanished", record.object_id)))?;

        let pack = *parent.pack_refs.first().ok_or_else(|| {
            DomainError::MalformedReference(format!(
                "{} is split but references no audioPackFormat",
                parent.id
            ))
        })?;
        let channels = self.document.channels_of_pack(pack);

        let mut children: Vec<Handle<AudioObject>> = Vec::with_capacity(intervals.len());
        for (index, interval) in intervals.iter().enumerate() {
            let child_id = self.ceiling.next_object()?;
            let mut child = parent.detached_copy(child_id);
            child.name = format!("{}_{}", parent.name, index + 1);
            set_interval(&mut child, *interval);
            child.pack_refs.push(pack);

            for (slot, uid_handle) in parent.track_uid_refs.iter().enumerate() {
                let Some(source) = self.document.track_uids.get(*uid_handle).cloned() else {
                    continue;
                };
                let source_id = source.id;
                let uid = TrackUid {
                    id: self.ceiling.next_track_uid()?,
                    channel_ref: channels.get(slot).copied().or(source.channel_ref),
                    pack_ref: Some(pack),
                    ..source
                };
                if let Some(channel) = self.channel_map.channel(&source_id) {
                    self.channel_map.insert(uid.id, channel);
                }
                self.report.created(uid.id);
                let new_uid = self.document.track_uids.insert(uid)?;
                child.track_uid_refs.push(new_uid);
            }

            self.report.created(child_id);
            children.push(self.document.objects.insert(child)?);
            record.new_object_ids.push(child_id);
        }

        if let Some(obj) = self.document.objects.get_mut(record.object) {
            obj.pack_refs.clear();
            obj.track_uid_refs.clear();
            obj.start_ns = None;
            obj.duration_ns = None;
            obj.object_refs.extend(children.iter().copied());
        }

        for uid_handle in &parent.track_uid_refs {
            if self.document.objects_using_track_uid(*uid_handle).is_empty() {
                if let Some(uid) = self.document.remove_track_uid(*uid_handle) {
                    self.channel_map.remove(&uid.id);
                    self.report.deleted(uid.id);
                }
            }
        }

        for extra in parent.pack_refs.iter().skip(1).filter(|p| **p != pack) {
            self.remove_pack_tree(*extra, record.object);
        }

        info!(
            object = %record.object_id,
            children = ?record.new_object_ids.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
            "Split object"
        );
        Ok(())
    }
}
