//! Log processing for batchtail
//!
//! This crate provides log filtering, formatting, and the console/file
//! output sinks.

mod filter;
mod format;
mod sink;

pub use filter::{FilterMode, LogFilter};
pub use format::format_event;
pub use sink::{filter_events, print_events, save_events, tail_slice, SaveReport};

// Re-export types used in our public API
pub use batchtail_types::{LogEvent, LogLevel};
