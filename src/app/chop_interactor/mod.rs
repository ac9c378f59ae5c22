// Chop interactor - Orchestrates analysis, planning and rewriting of a document

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::adapters::WavFileSource;
use crate::analyser::analyse_source;
use crate::document::AdmBundle;
use crate::domain::errors::DomainError;
use crate::domain::model::{ActivityMatrix, AnalyserSettings, ProductionProfileLimits};
use crate::engine::{ObjectGraphRewriter, RewriteReport};
use crate::planner::ObjectPlan;
use crate::ports::{DocumentStore, SampleSource};

/// Sample file to analyse; its layout comes from the WAV header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleInput {
    pub path: PathBuf,
}

impl SampleInput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open(&self, block_size: usize) -> Result<WavFileSource, DomainError> {
        WavFileSource::open(&self.path, block_size)
    }
}

/// One chop run
#[derive(Debug, Clone)]
pub struct ChopRequest {
    pub document: PathBuf,
    pub output: PathBuf,
    /// Write the rewrite report as JSON here
    pub report: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ChopResponse {
    pub output: PathBuf,
    pub report: RewriteReport,
}

/// A document and sample file sharing a stem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub name: String,
    pub document: PathBuf,
    pub samples: PathBuf,
}

/// Result of one batch item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub name: String,
    pub output: Option<PathBuf>,
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Find every `<name>.json` with a `<name>.wav` next to it, sorted by path
pub fn find_batch_items(dir: &Path) -> Result<Vec<BatchItem>, DomainError> {
    if !dir.is_dir() {
        return Err(DomainError::FileNotFound(dir.display().to_string()));
    }

    let mut items = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| DomainError::ProcessingError(format!("Failed to scan {}: {}", dir.display(), e)))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let samples = path.with_extension("wav");
        if !samples.is_file() {
            continue;
        }
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        items.push(BatchItem {
            name,
            document: path.to_path_buf(),
            samples,
        });
    }
    Ok(items)
}

/// Interactor for the analyse, plan and chop use cases
pub struct ChopInteractor {
    store: Arc<dyn DocumentStore>,
    settings: AnalyserSettings,
    limits: ProductionProfileLimits,
    rewriter: ObjectGraphRewriter,
}

impl ChopInteractor {
    /// Create new chop interactor with an injected document store
    pub fn new(store: Arc<dyn DocumentStore>, settings: AnalyserSettings, limits: ProductionProfileLimits) -> Self {
        Self {
            store,
            settings,
            limits,
            rewriter: ObjectGraphRewriter::new(),
        }
    }

    pub fn settings(&self) -> &AnalyserSettings {
        &self.settings
    }

    pub fn limits(&self) -> &ProductionProfileLimits {
        &self.limits
    }

    /// Reduce a sample stream to its activity matrix
    pub fn analyse(&self, source: &mut dyn SampleSource) -> Result<ActivityMatrix, DomainError> {
        analyse_source(source, &self.settings)
    }

    /// Load a document and resolve every object without changing anything
    pub fn plan(&self, document: &Path, source: &mut dyn SampleSource) -> Result<(AdmBundle, ObjectPlan), DomainError> {
        let bundle = self.store.load(document)?;
        let matrix = self.analyse(source)?;
        if let Some(max) = bundle.channel_map.max_channel() {
            if max >= source.channel_count() {
                warn!(
                    max_channel = max,
                    channels = source.channel_count(),
                    "Channel map points past the sample stream; those tracks read as silent"
                );
            }
        }
        let plan = ObjectPlan::build(&bundle.document, &bundle.channel_map, &matrix, &self.limits)?;
        for condition in &plan.recovered {
            warn!("{}", condition);
        }
        Ok((bundle, plan))
    }

    /// Full pipeline: plan, rewrite, then write the document and report
    pub fn chop(&self, request: &ChopRequest, source: &mut dyn SampleSource) -> Result<ChopResponse, DomainError> {
        info!(document = %request.document.display(), "Starting chop");
        let (bundle, plan) = self.plan(&request.document, source)?;
        if plan.is_noop() {
            info!("Every object is active for its whole duration");
        }

        let outcome = self.rewriter.rewrite(bundle, plan)?;
        self.store.save(&request.output, &outcome.bundle)?;

        if let Some(report_path) = &request.report {
            write_report(report_path, &outcome.report)?;
        }

        info!(
            output = %request.output.display(),
            objects = outcome.report.objects.len(),
            "Chop complete"
        );
        Ok(ChopResponse {
            output: request.output.clone(),
            report: outcome.report,
        })
    }

    /// Chop every pair under `dir` into `output_dir`, continuing past failures
    pub fn batch(
        &self,
        dir: &Path,
        output_dir: &Path,
    ) -> Result<Vec<BatchOutcome>, DomainError> {
        let items = find_batch_items(dir)?;
        info!(dir = %dir.display(), items = items.len(), "Starting batch");

        let outcomes = items
            .into_iter()
            .map(|item| {
                let request = ChopRequest {
                    document: item.document.clone(),
                    output: output_dir.join(format!("{}.json", item.name)),
                    report: Some(output_dir.join(format!("{}.report.json", item.name))),
                };
                let result = SampleInput::new(&item.samples)
                    .open(self.settings.block_size)
                    .and_then(|mut source| self.chop(&request, &mut source));
                match result {
                    Ok(response) => BatchOutcome {
                        name: item.name,
                        output: Some(response.output),
                        error: None,
                    },
                    Err(e) => {
                        error!(item = %item.name, "Batch item failed: {}", e);
                        BatchOutcome {
                            name: item.name,
                            output: None,
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
            .collect();
        Ok(outcomes)
    }
}

/// Write a rewrite report as pretty JSON
pub fn write_report(path: &Path, report: &RewriteReport) -> Result<(), DomainError> {
    let text = serde_json::to_string_pretty(report)
        .map_err(|e| DomainError::ProcessingError(format!("Failed to serialize report: {}", e)))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| DomainError::ProcessingError(format!("Failed to create {}: {}", parent.display(), e)))?;
    }
    fs::write(path, text)
        .map_err(|e| DomainError::ProcessingError(format!("Failed to write {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_batch_items_pairs_by_stem() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("reel2");
        fs::create_dir_all(&nested).unwrap();

        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("a.wav"), b"").unwrap();
        fs::write(dir.path().join("lonely.json"), "{}").unwrap();
        fs::write(nested.join("b.json"), "{}").unwrap();
        fs::write(nested.join("b.wav"), b"").unwrap();

        let items = find_batch_items(dir.path()).unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(items[1].samples, nested.join("b.wav"));
    }

    #[test]
    fn test_find_batch_items_missing_dir() {
        let err = find_batch_items(Path::new("/no/such/batch")).unwrap_err();
        assert!(matches!(err, DomainError::FileNotFound(_)));
    }
}
