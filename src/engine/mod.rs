//! Object graph rewriting
//!
//! Applies a complete [`ObjectPlan`] to its document in fixed phases:
//!
//! 1. ID ceilings are scanned once over the untouched document.
//! 2. Each record is applied to its object: trimmed in place, split into
//!    children, or flagged for removal.
//! 3. Every split child beyond the first receives its own copy of the pack
//!    and channel formats, with PCM stream and track formats for each copy.
//! 4. Parameter blocks of every changed, unshared channel format are trimmed
//!    to the new object window.
//! 5. Removed objects are deleted with everything they exclusively own.
//!
//! The rewriter consumes the bundle, so a failing phase leaves no partially
//! rewritten output behind.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::document::ids::ObjectId;
use crate::document::{AdmBundle, AudioObject, Document, Handle};
use crate::domain::errors::DomainError;
use crate::domain::model::{ChannelMap, Interval};
use crate::planner::{ObjectPlan, ObjectRecord, Resolution};

pub mod blocks;
pub mod cleanup;
pub mod duplicate;
pub mod ids;
pub mod objects;

pub use ids::IdCeiling;

/// Outcome of one object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectReport {
    pub object_id: ObjectId,
    pub name: String,
    pub original: Interval,
    pub resolution: Resolution,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_object_ids: Vec<ObjectId>,
}

/// Summary of a rewrite pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteReport {
    pub generated_at: DateTime<Utc>,
    pub objects: Vec<ObjectReport>,
    /// IDs of elements created by the pass
    pub created: Vec<String>,
    /// IDs of elements deleted by the pass
    pub deleted: Vec<String>,
    /// Channel formats whose blocks were rewritten
    pub trimmed_channels: Vec<String>,
    /// Conditions absorbed without aborting
    pub recovered: Vec<String>,
}

impl RewriteReport {
    fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            objects: Vec::new(),
            created: Vec::new(),
            deleted: Vec::new(),
            trimmed_channels: Vec::new(),
            recovered: Vec::new(),
        }
    }

    pub(crate) fn created(&mut self, id: impl ToString) {
        self.created.push(id.to_string());
    }

    pub(crate) fn deleted(&mut self, id: impl ToString) {
        self.deleted.push(id.to_string());
    }

    pub(crate) fn recovered(&mut self, condition: &DomainError) {
        self.recovered.push(condition.to_string());
    }
}

/// A rewritten bundle and what happened to it
#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    pub bundle: AdmBundle,
    pub report: RewriteReport,
}

/// Mutable state shared by the rewrite phases
pub(crate) struct RewriteSession<'a> {
    pub document: &'a mut Document,
    pub channel_map: &'a mut ChannelMap,
    pub ceiling: IdCeiling,
    pub report: RewriteReport,
    /// Objects flagged for removal
    pub removed: HashSet<Handle<AudioObject>>,
}

impl<'a> RewriteSession<'a> {
    fn new(document: &'a mut Document, channel_map: &'a mut ChannelMap) -> Self {
        let ceiling = IdCeiling::scan(document);
        Self {
            document,
            channel_map,
            ceiling,
            report: RewriteReport::new(),
            removed: HashSet::new(),
        }
    }

    /// Objects that now carry a record's intervals: the children of a split,
    /// otherwise the object itself
    pub fn targets(&self, record: &ObjectRecord) -> Vec<(Handle<AudioObject>, Interval)> {
        if record.is_split() {
            record
                .new_object_ids
                .iter()
                .zip(record.resolved())
                .filter_map(|(id, interval)| self.document.objects.lookup(id).map(|h| (h, *interval)))
                .collect()
        } else {
            record
                .resolved()
                .first()
                .map(|interval| vec![(record.object, *interval)])
                .unwrap_or_default()
        }
    }
}

/// Rewrites a document to match resolved object intervals
#[derive(Debug, Clone, Default)]
pub struct ObjectGraphRewriter;

impl ObjectGraphRewriter {
    pub fn new() -> Self {
        Self
    }

    /// Apply a plan built from this bundle's document
    pub fn rewrite(&self, mut bundle: AdmBundle, plan: ObjectPlan) -> Result<RewriteOutcome, DomainError> {
        let ObjectPlan {
            mut records,
            recovered,
        } = plan;

        for record in &records {
            match bundle.document.objects.get(record.object) {
                Some(obj) if obj.id == record.object_id => {}
                _ => {
                    return Err(DomainError::MalformedReference(format!(
                        "plan record {} does not match the document",
                        record.object_id
                    )))
                }
            }
        }

        let elements_before = bundle.document.element_count();
        let report = {
            let mut session = RewriteSession::new(&mut bundle.document, &mut bundle.channel_map);
            for condition in &recovered {
                session.report.recovered(condition);
            }

            info!(ceiling = ?session.ceiling, "Phase 1: ID ceilings");

            info!(records = records.len(), "Phase 2: object restructure");
            for record in records.iter_mut() {
                session.apply_record(record)?;
            }

            info!("Phase 3: pack duplication");
            for record in records.iter().filter(|r| r.is_split()) {
                session.duplicate_packs(record)?;
            }

            info!("Phase 4: block rewrite");
            for record in records.iter().filter(|r| !r.removed) {
                session.rewrite_blocks(record);
            }

            info!(objects = session.removed.len(), "Phase 5: removal");
            for record in records.iter().filter(|r| r.removed) {
                session.remove_object_tree(record);
            }

            session.report.objects = records
                .iter()
                .map(|r| ObjectReport {
                    object_id: r.object_id,
                    name: r.name.clone(),
                    original: r.original,
                    resolution: r.resolution(),
                    new_object_ids: r.new_object_ids.clone(),
                })
                .collect();
            session.report
        };

        info!(
            elements_before,
            elements_after = bundle.document.element_count(),
            created = report.created.len(),
            deleted = report.deleted.len(),
            recovered = report.recovered.len(),
            "Rewrite complete"
        );

        Ok(RewriteOutcome { bundle, report })
    }
}
