//! Flat serialization form of the document, references expressed by ID

use serde::{Deserialize, Serialize};

use crate::document::arena::{Arena, Element, Handle};
use crate::document::blocks::ChannelBlocks;
use crate::document::elements::*;
use crate::document::ids::*;
use crate::document::{AdmBundle, Document};
use crate::domain::errors::DomainError;
use crate::domain::model::ChannelMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectData {
    pub id: ObjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_ns: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ns: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pack_refs: Vec<PackFormatId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object_refs: Vec<ObjectId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub track_uid_refs: Vec<TrackUidId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackFormatData {
    pub id: PackFormatId,
    pub name: String,
    #[serde(default)]
    pub channel_refs: Vec<ChannelFormatId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelFormatData {
    pub id: ChannelFormatId,
    pub name: String,
    pub blocks: ChannelBlocks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamFormatData {
    pub id: StreamFormatId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_ref: Option<ChannelFormatId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackFormatData {
    pub id: TrackFormatId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_ref: Option<StreamFormatId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackUidData {
    pub id: TrackUidId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_depth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_ref: Option<ChannelFormatId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack_ref: Option<PackFormatId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_format_ref: Option<TrackFormatId>,
}

/// Serializable document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentData {
    pub objects: Vec<ObjectData>,
    pub pack_formats: Vec<PackFormatData>,
    pub channel_formats: Vec<ChannelFormatData>,
    pub stream_formats: Vec<StreamFormatData>,
    pub track_formats: Vec<TrackFormatData>,
    pub track_uids: Vec<TrackUidData>,
}

/// Serializable document plus channel map
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BundleData {
    pub document: DocumentData,
    #[serde(default)]
    pub channel_map: ChannelMap,
}

fn resolve<T: Element>(arena: &Arena<T>, id: &T::Id, from: &str) -> Result<Handle<T>, DomainError> {
    arena.lookup(id).ok_or_else(|| {
        DomainError::MalformedReference(format!("{} references unknown {} {}", from, T::kind(), id))
    })
}

fn resolve_opt<T: Element>(
    arena: &Arena<T>,
    id: &Option<T::Id>,
    from: &str,
) -> Result<Option<Handle<T>>, DomainError> {
    id.as_ref().map(|id| resolve(arena, id, from)).transpose()
}

impl Document {
    /// Build the arena graph, resolving every ID reference
    pub fn from_data(data: &DocumentData) -> Result<Self, DomainError> {
        let mut doc = Document::new();

        for cf in &data.channel_formats {
            if cf.blocks.type_definition() != cf.id.type_def {
                return Err(DomainError::InvalidFormat(format!(
                    "{} is {} but holds {} blocks",
                    cf.id,
                    cf.id.type_def,
                    cf.blocks.type_definition()
                )));
            }
            doc.channels
                .insert(ChannelFormat::new(cf.id, cf.name.clone(), cf.blocks.clone()))?;
        }

        for pf in &data.pack_formats {
            let from = pf.id.to_string();
            let mut pack = PackFormat::new(pf.id, pf.name.clone());
            for channel_id in &pf.channel_refs {
                pack.channel_refs.push(resolve(&doc.channels, channel_id, &from)?);
            }
            doc.packs.insert(pack)?;
        }

        for sf in &data.stream_formats {
            let channel_ref = resolve_opt(&doc.channels, &sf.channel_ref, &sf.id.to_string())?;
            doc.streams.insert(StreamFormat {
                id: sf.id,
                name: sf.name.clone(),
                channel_ref,
            })?;
        }

        for tf in &data.track_formats {
            let stream_ref = resolve_opt(&doc.streams, &tf.stream_ref, &tf.id.to_string())?;
            doc.track_formats.insert(TrackFormat {
                id: tf.id,
                name: tf.name.clone(),
                stream_ref,
            })?;
        }

        for tu in &data.track_uids {
            let from = tu.id.to_string();
            doc.track_uids.insert(TrackUid {
                id: tu.id,
                sample_rate: tu.sample_rate,
                bit_depth: tu.bit_depth,
                channel_ref: resolve_opt(&doc.channels, &tu.channel_ref, &from)?,
                pack_ref: resolve_opt(&doc.packs, &tu.pack_ref, &from)?,
                track_format_ref: resolve_opt(&doc.track_formats, &tu.track_format_ref, &from)?,
            })?;
        }

        // Objects reference each other, so insert first and link afterwards
        for od in &data.objects {
            let from = od.id.to_string();
            let mut obj = AudioObject::new(od.id, od.name.clone());
            obj.start_ns = od.start_ns;
            obj.duration_ns = od.duration_ns;
            for pack_id in &od.pack_refs {
                obj.pack_refs.push(resolve(&doc.packs, pack_id, &from)?);
            }
            for uid_id in &od.track_uid_refs {
                obj.track_uid_refs.push(resolve(&doc.track_uids, uid_id, &from)?);
            }
            doc.objects.insert(obj)?;
        }
        for od in &data.objects {
            let from = od.id.to_string();
            let mut refs = Vec::with_capacity(od.object_refs.len());
            for child_id in &od.object_refs {
                refs.push(resolve(&doc.objects, child_id, &from)?);
            }
            let handle = resolve(&doc.objects, &od.id, &from)?;
            if let Some(obj) = doc.objects.get_mut(handle) {
                obj.object_refs = refs;
            }
        }

        Ok(doc)
    }

    /// Flatten the graph, elements sorted by ID
    pub fn to_data(&self) -> DocumentData {
        let objects = self
            .objects
            .sorted()
            .into_iter()
            .map(|obj| ObjectData {
                id: obj.id,
                name: obj.name.clone(),
                start_ns: obj.start_ns,
                duration_ns: obj.duration_ns,
                pack_refs: obj.pack_refs.iter().filter_map(|h| self.packs.id_of(*h)).collect(),
                object_refs: obj.object_refs.iter().filter_map(|h| self.objects.id_of(*h)).collect(),
                track_uid_refs: obj
                    .track_uid_refs
                    .iter()
                    .filter_map(|h| self.track_uids.id_of(*h))
                    .collect(),
            })
            .collect();

        let pack_formats = self
            .packs
            .sorted()
            .into_iter()
            .map(|pack| PackFormatData {
                id: pack.id,
                name: pack.name.clone(),
                channel_refs: pack
                    .channel_refs
                    .iter()
                    .filter_map(|h| self.channels.id_of(*h))
                    .collect(),
            })
            .collect();

        let channel_formats = self
            .channels
            .sorted()
            .into_iter()
            .map(|cf| ChannelFormatData {
                id: cf.id,
                name: cf.name.clone(),
                blocks: cf.blocks.clone(),
            })
            .collect();

        let stream_formats = self
            .streams
            .sorted()
            .into_iter()
            .map(|sf| StreamFormatData {
                id: sf.id,
                name: sf.name.clone(),
                channel_ref: sf.channel_ref.and_then(|h| self.channels.id_of(h)),
            })
            .collect();

        let track_formats = self
            .track_formats
            .sorted()
            .into_iter()
            .map(|tf| TrackFormatData {
                id: tf.id,
                name: tf.name.clone(),
                stream_ref: tf.stream_ref.and_then(|h| self.streams.id_of(h)),
            })
            .collect();

        let track_uids = self
            .track_uids
            .sorted()
            .into_iter()
            .map(|tu| TrackUidData {
                id: tu.id,
                sample_rate: tu.sample_rate,
                bit_depth: tu.bit_depth,
                channel_ref: tu.channel_ref.and_then(|h| self.channels.id_of(h)),
                pack_ref: tu.pack_ref.and_then(|h| self.packs.id_of(h)),
                track_format_ref: tu.track_format_ref.and_then(|h| self.track_formats.id_of(h)),
            })
            .collect();

        DocumentData {
            objects,
            pack_formats,
            channel_formats,
            stream_formats,
            track_formats,
            track_uids,
        }
    }
}

impl AdmBundle {
    pub fn from_data(data: &BundleData) -> Result<Self, DomainError> {
        Ok(Self {
            document: Document::from_data(&data.document)?,
            channel_map: data.channel_map.clone(),
        })
    }

    pub fn to_data(&self) -> BundleData {
        BundleData {
            document: self.document.to_data(),
            channel_map: self.channel_map.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "objects": [
            {"id": "AO_1001", "name": "Dialogue", "start_ns": 0, "duration_ns": 1000000000,
             "pack_refs": ["AP_00031001"], "track_uid_refs": ["ATU_00000001"]}
        ],
        "pack_formats": [
            {"id": "AP_00031001", "name": "Dialogue", "channel_refs": ["AC_00031001"]}
        ],
        "channel_formats": [
            {"id": "AC_00031001", "name": "Dialogue", "blocks": {"type": "objects", "items": [
                {"id": "AB_00031001_00000001", "rtime_ns": 0, "duration_ns": 1000000000,
                 "position": {"coordinate": "polar", "azimuth": 0.0, "elevation": 0.0}}
            ]}}
        ],
        "stream_formats": [
            {"id": "AS_00031001", "name": "PCM_Dialogue", "channel_ref": "AC_00031001"}
        ],
        "track_formats": [
            {"id": "AT_00031001_01", "name": "PCM_Dialogue", "stream_ref": "AS_00031001"}
        ],
        "track_uids": [
            {"id": "ATU_00000001", "channel_ref": "AC_00031001", "pack_ref": "AP_00031001",
             "track_format_ref": "AT_00031001_01"}
        ]
    }"#;

    #[test]
    fn test_from_data_resolves_references() {
        let data: DocumentData = serde_json::from_str(SAMPLE).unwrap();
        let doc = Document::from_data(&data).unwrap();
        assert_eq!(doc.element_count(), 6);
        let obj = doc.objects.lookup(&ObjectId(0x1001)).unwrap();
        assert_eq!(doc.objects.get(obj).unwrap().pack_refs.len(), 1);
        assert_eq!(doc.to_data(), data);
    }

    #[test]
    fn test_unknown_reference_is_malformed() {
        let mut data: DocumentData = serde_json::from_str(SAMPLE).unwrap();
        data.objects[0].pack_refs = vec!["AP_00039999".parse().unwrap()];
        let err = Document::from_data(&data).unwrap_err();
        assert!(matches!(err, DomainError::MalformedReference(_)));
    }

    #[test]
    fn test_block_type_must_match_channel() {
        let mut data: DocumentData = serde_json::from_str(SAMPLE).unwrap();
        data.channel_formats[0].blocks = ChannelBlocks::empty(TypeDefinition::Hoa);
        let err = Document::from_data(&data).unwrap_err();
        assert!(matches!(err, DomainError::InvalidFormat(_)));
    }
}
