// JSON document adapter - Audio definition documents stored as JSON

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info};

use crate::document::data::BundleData;
use crate::document::AdmBundle;
use crate::domain::errors::DomainError;
use crate::ports::DocumentStore;

/// Loads and saves [`AdmBundle`]s through their serde form
#[derive(Debug, Clone, Default)]
pub struct JsonDocumentStore {
    pretty: bool,
}

impl JsonDocumentStore {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Write single-line JSON
    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    pub fn parse(&self, text: &str) -> Result<AdmBundle, DomainError> {
        let data: BundleData = serde_json::from_str(text)
            .map_err(|e| DomainError::InvalidFormat(format!("Invalid document JSON: {}", e)))?;
        AdmBundle::from_data(&data)
    }

    pub fn render(&self, bundle: &AdmBundle) -> Result<String, DomainError> {
        let data = bundle.to_data();
        let text = if self.pretty {
            serde_json::to_string_pretty(&data)
        } else {
            serde_json::to_string(&data)
        };
        text.map_err(|e| DomainError::ProcessingError(format!("Failed to serialize document: {}", e)))
    }
}

impl DocumentStore for JsonDocumentStore {
    fn load(&self, path: &Path) -> Result<AdmBundle, DomainError> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DomainError::FileNotFound(path.display().to_string()),
            _ => DomainError::ProcessingError(format!("Failed to read {}: {}", path.display(), e)),
        })?;
        let bundle = self.parse(&text)?;
        debug!(
            path = %path.display(),
            elements = bundle.document.element_count(),
            mapped_tracks = bundle.channel_map.len(),
            "Loaded document"
        );
        Ok(bundle)
    }

    fn save(&self, path: &Path, bundle: &AdmBundle) -> Result<(), DomainError> {
        let text = self.render(bundle)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                DomainError::ProcessingError(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        fs::write(path, text)
            .map_err(|e| DomainError::ProcessingError(format!("Failed to write {}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Saved document");
        Ok(())
    }
}
