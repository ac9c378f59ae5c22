//! Giving split children their own pack and channel formats

use tracing::{debug, info};

use crate::document::ids::{StreamFormatId, TrackFormatId};
use crate::document::{AudioObject, ChannelFormat, Handle, PackFormat, StreamFormat, TrackFormat};
use crate::domain::errors::DomainError;
use crate::engine::RewriteSession;
use crate::planner::ObjectRecord;

/// A channel format as it ends up in a duplicated pack
struct ChannelCopy {
    channel: Handle<ChannelFormat>,
    /// Track format to bind, `None` to keep the track UID's current one
    track_format: Option<Handle<TrackFormat>>,
}

impl RewriteSession<'_> {
    /// Duplicate the reference pack for every child of a split after the first.
    ///
    /// The first child keeps the original pack. Names get `_<n>` with `n`
    /// counting from 2. Common-definition packs are shared as they are.
    pub fn duplicate_packs(&mut self, record: &ObjectRecord) -> Result<(), DomainError> {
        let Some(first) = record
            .new_object_ids
            .first()
            .and_then(|id| self.document.objects.lookup(id))
        else {
            return Ok(());
        };
        let Some(reference) = self
            .document
            .objects
            .get(first)
            .and_then(|obj| obj.pack_refs.first().copied())
        else {
            return Ok(());
        };
        let Some(reference_id) = self.document.packs.id_of(reference) else {
            return Ok(());
        };
        if reference_id.is_common_definition() {
            debug!(pack = %reference_id, "Common definition pack shared by all children");
            return Ok(());
        }

        for (offset, child_id) in record.new_object_ids.iter().enumerate().skip(1) {
            let Some(child) = self.document.objects.lookup(child_id) else {
                continue;
            };
            let suffix = offset + 1;
            let (pack, copies) = self.copy_pack(reference, suffix)?;
            self.rewire_child(child, pack, &copies)?;
            info!(
                object = %child_id,
                pack = %self.document.packs.id_of(pack).map(|id| id.to_string()).unwrap_or_default(),
                "Duplicated pack for child"
            );
        }
        Ok(())
    }

    fn copy_pack(
        &mut self,
        reference: Handle<PackFormat>,
        suffix: usize,
    ) -> Result<(Handle<PackFormat>, Vec<ChannelCopy>), DomainError> {
        let source = self
            .document
            .packs
            .get(reference)
            .cloned()
            .ok_or_else(|| DomainError::MalformedReference("reference pack vanished".to_string()))?;

        let mut copies = Vec::with_capacity(source.channel_refs.len());
        for channel in self.document.channels.live(&source.channel_refs) {
            let Some(original) = self.document.channels.get(channel).cloned() else {
                continue;
            };
            if original.id.is_common_definition() {
                copies.push(ChannelCopy {
                    channel,
                    track_format: None,
                });
                continue;
            }

            let id = self.ceiling.next_channel(original.id.type_def)?;
            let duplicate = original.duplicate(id, format!("{}_{}", original.name, suffix));
            let name = duplicate.name.clone();
            let handle = self.document.channels.insert(duplicate)?;
            self.report.created(id);

            let track_format = self.generate_stream_track(handle, &name)?;
            copies.push(ChannelCopy {
                channel: handle,
                track_format: Some(track_format),
            });
        }

        let pack_id = self.ceiling.next_pack(source.id.type_def)?;
        let mut pack = PackFormat::new(pack_id, format!("{}_{}", source.name, suffix));
        pack.channel_refs = copies.iter().map(|c| c.channel).collect();
        let handle = self.document.packs.insert(pack)?;
        self.report.created(pack_id);
        Ok((handle, copies))
    }

    /// PCM stream and track format for a new channel format
    fn generate_stream_track(
        &mut self,
        channel: Handle<ChannelFormat>,
        name: &str,
    ) -> Result<Handle<TrackFormat>, DomainError> {
        let channel_id = self
            .document
            .channels
            .id_of(channel)
            .ok_or_else(|| DomainError::MalformedReference("new channel vanished".to_string()))?;
        let type_def = channel_id.type_def;
        let value = self.ceiling.stream_value_for(&*self.document, type_def, channel_id.value)?;

        let stream_id = StreamFormatId::new(type_def, value);
        let stream = self.document.streams.insert(StreamFormat {
            id: stream_id,
            name: format!("PCM_{}", name),
            channel_ref: Some(channel),
        })?;
        self.report.created(stream_id);

        let track_id = TrackFormatId::new(type_def, value, 1);
        let track = self.document.track_formats.insert(TrackFormat {
            id: track_id,
            name: format!("PCM_{}", name),
            stream_ref: Some(stream),
        })?;
        self.report.created(track_id);
        Ok(track)
    }

    /// Point a child and its track UIDs at a duplicated pack
    fn rewire_child(
        &mut self,
        child: Handle<AudioObject>,
        pack: Handle<PackFormat>,
        copies: &[ChannelCopy],
    ) -> Result<(), DomainError> {
        let Some(obj) = self.document.objects.get_mut(child) else {
            return Ok(());
        };
        obj.pack_refs = vec![pack];
        let uids = obj.track_uid_refs.clone();
        let child_id = obj.id;

        if uids.len() != copies.len() {
            return Err(DomainError::MalformedReference(format!(
                "{} has {} track UIDs but its pack has {} channel formats",
                child_id,
                uids.len(),
                copies.len()
            )));
        }

        for (uid_handle, copy) in uids.iter().zip(copies) {
            if let Some(uid) = self.document.track_uids.get_mut(*uid_handle) {
                uid.channel_ref = Some(copy.channel);
                uid.pack_ref = Some(pack);
                if let Some(track_format) = copy.track_format {
                    uid.track_format_ref = Some(track_format);
                }
            }
        }
        Ok(())
    }
}
