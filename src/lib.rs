//! ObjChop Library
//!
//! Fits the audio objects of an ADM-style document to the activity of their
//! tracks: each object is trimmed to where its channels carry signal, split
//! into children when the activity falls into separate intervals, or removed
//! when it is silent throughout.
//!
//! The pipeline runs in three stages over a complete input:
//!
//! - [`analyser`] reduces a sample stream into an [`ActivityMatrix`];
//! - [`planner`] resolves every object against the matrix into an [`ObjectPlan`];
//! - [`engine`] rewrites the document graph to match the plan.

pub mod adapters;
pub mod analyser;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod document;
pub mod domain;
pub mod engine;
pub mod error;
pub mod planner;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use analyser::{analyse_source, ActivityAnalyser};
pub use document::{AdmBundle, Document};
pub use domain::errors::DomainError;
pub use domain::model::{ActivityMatrix, ChannelMap, Interval, ProductionProfileLimits};
pub use engine::{ObjectGraphRewriter, RewriteOutcome, RewriteReport};
pub use error::{ChopError, ChopResult};
pub use planner::{ObjectPlan, Resolution};
