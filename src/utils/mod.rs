//! Common utilities and helpers

pub mod logging;
pub mod time;

pub use logging::{LogFormat, LoggingConfig};
pub use time::{format_ns, parse_duration_ns, TimeParser};
