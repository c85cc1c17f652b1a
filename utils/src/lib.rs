//! Shared utilities for the bitwallet client.

pub mod logging;
pub mod time;

pub use logging::{init_logging, init_tracing, LogFormat};
pub use time::{parse_date_millis, timestamp_to_iso};
