use std::sync::Arc;

use crate::adapters::JsonDocumentStore;
use crate::app::chop_interactor::ChopInteractor;
use crate::config_initialization::ResolvedConfig;
use crate::ports::DocumentStore;

pub trait AppContainer: Send + Sync {
    fn chop_interactor(&self) -> Arc<ChopInteractor>;
}

/// Wires the production adapters for one resolved configuration
pub struct DefaultAppContainer {
    chop_interactor: Arc<ChopInteractor>,
}

impl DefaultAppContainer {
    pub fn new(config: &ResolvedConfig) -> Self {
        let store = Arc::new(JsonDocumentStore::new());
        Self::with_store(store, config)
    }

    /// Use another document store, e.g. a compact JSON writer
    pub fn with_store(store: Arc<dyn DocumentStore>, config: &ResolvedConfig) -> Self {
        let chop_interactor = Arc::new(ChopInteractor::new(store, config.analyser, config.limits));
        Self { chop_interactor }
    }
}

impl AppContainer for DefaultAppContainer {
    fn chop_interactor(&self) -> Arc<ChopInteractor> {
        Arc::clone(&self.chop_interactor)
    }
}
