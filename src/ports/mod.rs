// Ports - Interface definitions (contracts)

use std::path::Path;

use crate::document::AdmBundle;
use crate::domain::errors::DomainError;
use crate::domain::model::SampleBlock;

/// Port for a decoded, interleaved sample stream
pub trait SampleSource {
    /// Next block of samples; `Ok(None)` signals end of stream
    fn next_block(&mut self) -> Result<Option<SampleBlock>, DomainError>;

    /// Channel count of every block this source produces
    fn channel_count(&self) -> usize;

    /// Sample rate of the stream in Hz
    fn sample_rate(&self) -> u32;
}

/// Port for loading and storing audio definition documents
pub trait DocumentStore: Send + Sync {
    /// Parse a document and its channel map
    fn load(&self, path: &Path) -> Result<AdmBundle, DomainError>;

    /// Serialize a document and its channel map
    fn save(&self, path: &Path, bundle: &AdmBundle) -> Result<(), DomainError>;
}
