//! ID ceilings and allocation of fresh element IDs

use tracing::debug;

use crate::document::ids::*;
use crate::document::Document;
use crate::domain::errors::DomainError;

/// Custom (non common-definition) format and object values start above this
const CUSTOM_VALUE_FLOOR: u32 = COMMON_DEFINITIONS_MAX + 1;

/// Highest ID value in use per element kind.
///
/// Format ceilings ignore common definitions and never drop below the
/// custom range, so every allocated value is a custom one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdCeiling {
    pub object: u32,
    pub pack: u32,
    pub channel: u32,
    pub stream: u32,
    pub track_uid: u32,
}

fn custom_max<I: Iterator<Item = u32>>(values: I) -> u32 {
    values
        .filter(|v| !is_common_definition(*v))
        .max()
        .unwrap_or(0)
        .max(CUSTOM_VALUE_FLOOR - 1)
}

fn bump(current: &mut u32, limit: u32, kind: &str) -> Result<u32, DomainError> {
    match current.checked_add(1) {
        Some(next) if next <= limit => {
            *current = next;
            Ok(next)
        }
        _ => Err(DomainError::IdSpaceExhausted(format!(
            "no {} ID left above {:#X}",
            kind, current
        ))),
    }
}

impl IdCeiling {
    /// Scan the whole document once
    pub fn scan(document: &Document) -> Self {
        let ceiling = Self {
            object: document
                .objects
                .iter()
                .map(|(_, o)| o.id.0)
                .max()
                .unwrap_or(0)
                .max(CUSTOM_VALUE_FLOOR - 1),
            pack: custom_max(document.packs.iter().map(|(_, p)| p.id.value)),
            channel: custom_max(document.channels.iter().map(|(_, c)| c.id.value)),
            stream: custom_max(document.streams.iter().map(|(_, s)| s.id.value)),
            track_uid: document
                .track_uids
                .iter()
                .map(|(_, u)| u.id.0)
                .max()
                .unwrap_or(0),
        };
        debug!(?ceiling, "ID ceilings");
        ceiling
    }

    pub fn next_object(&mut self) -> Result<ObjectId, DomainError> {
        bump(&mut self.object, OBJECT_VALUE_MAX, "audioObject").map(ObjectId)
    }

    pub fn next_track_uid(&mut self) -> Result<TrackUidId, DomainError> {
        bump(&mut self.track_uid, u32::MAX, "audioTrackUID").map(TrackUidId)
    }

    pub fn next_pack(&mut self, type_def: TypeDefinition) -> Result<PackFormatId, DomainError> {
        bump(&mut self.pack, FORMAT_VALUE_MAX, "audioPackFormat").map(|v| PackFormatId::new(type_def, v))
    }

    pub fn next_channel(&mut self, type_def: TypeDefinition) -> Result<ChannelFormatId, DomainError> {
        bump(&mut self.channel, FORMAT_VALUE_MAX, "audioChannelFormat")
            .map(|v| ChannelFormatId::new(type_def, v))
    }

    /// Stream value for a new PCM stream: `preferred` when neither the stream
    /// nor its first track format exists yet, otherwise the next value above
    /// the stream ceiling
    pub fn stream_value_for(
        &mut self,
        document: &Document,
        type_def: TypeDefinition,
        preferred: u32,
    ) -> Result<u32, DomainError> {
        let free = |value: u32| {
            document.streams.lookup(&StreamFormatId::new(type_def, value)).is_none()
                && document
                    .track_formats
                    .lookup(&TrackFormatId::new(type_def, value, 1))
                    .is_none()
        };

        if !is_common_definition(preferred) && free(preferred) {
            self.stream = self.stream.max(preferred);
            return Ok(preferred);
        }
        loop {
            let value = bump(&mut self.stream, FORMAT_VALUE_MAX, "audioStreamFormat")?;
            if free(value) {
                return Ok(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::blocks::ChannelBlocks;
    use crate::document::{ChannelFormat, PackFormat, StreamFormat};

    fn document() -> Document {
        let mut doc = Document::new();
        for value in [0x0001, 0x1003, 0x1001] {
            doc.packs
                .insert(PackFormat::new(PackFormatId::new(TypeDefinition::Objects, value), "p"))
                .unwrap();
            doc.channels
                .insert(ChannelFormat::new(
                    ChannelFormatId::new(TypeDefinition::Objects, value),
                    "c",
                    ChannelBlocks::empty(TypeDefinition::Objects),
                ))
                .unwrap();
        }
        doc
    }

    #[test]
    fn test_ceiling_ignores_common_definitions() {
        let ceiling = IdCeiling::scan(&document());
        assert_eq!(ceiling.pack, 0x1003);
        assert_eq!(ceiling.channel, 0x1003);
        assert_eq!(ceiling.object, 0x1000);
        assert_eq!(ceiling.track_uid, 0);
    }

    #[test]
    fn test_only_common_definitions_allocates_custom_values() {
        let mut doc = Document::new();
        doc.packs
            .insert(PackFormat::new(PackFormatId::new(TypeDefinition::DirectSpeakers, 0x0002), "stereo"))
            .unwrap();
        let mut ceiling = IdCeiling::scan(&doc);
        let id = ceiling.next_pack(TypeDefinition::Objects).unwrap();
        assert_eq!(id.value, 0x1001);
        assert!(!id.is_common_definition());
    }

    #[test]
    fn test_allocation_increments() {
        let mut ceiling = IdCeiling::scan(&document());
        assert_eq!(ceiling.next_channel(TypeDefinition::Objects).unwrap().value, 0x1004);
        assert_eq!(ceiling.next_channel(TypeDefinition::Objects).unwrap().value, 0x1005);
        assert_eq!(ceiling.next_track_uid().unwrap(), TrackUidId(1));
    }

    #[test]
    fn test_exhaustion() {
        let mut ceiling = IdCeiling::scan(&document());
        ceiling.pack = FORMAT_VALUE_MAX;
        let err = ceiling.next_pack(TypeDefinition::Objects).unwrap_err();
        assert!(matches!(err, DomainError::IdSpaceExhausted(_)));
    }

    #[test]
    fn test_stream_value_prefers_channel_value() {
        let mut doc = document();
        let mut ceiling = IdCeiling::scan(&doc);
        assert_eq!(ceiling.stream_value_for(&doc, TypeDefinition::Objects, 0x1004).unwrap(), 0x1004);

        doc.streams
            .insert(StreamFormat {
                id: StreamFormatId::new(TypeDefinition::Objects, 0x1005),
                name: "PCM_c".to_string(),
                channel_ref: None,
            })
            .unwrap();
        let value = ceiling.stream_value_for(&doc, TypeDefinition::Objects, 0x1005).unwrap();
        assert_eq!(value, 0x1006);
    }
}
