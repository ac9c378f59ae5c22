// Application layer - Use case interactors

pub mod chop_interactor;
pub mod container;

// Re-export interactors
pub use chop_interactor::{BatchOutcome, ChopInteractor, ChopRequest, ChopResponse, SampleInput};
pub use container::{AppContainer, DefaultAppContainer};
