// Adapters - External system implementations

pub mod interleaved;
pub mod json_document;
pub mod toml_config;
pub mod wav_file;

// Re-export adapters
pub use interleaved::InterleavedSource;
pub use json_document::JsonDocumentStore;
pub use toml_config::{AppConfig, ConfigFormat, ConfigLoader};
pub use wav_file::WavFileSource;
