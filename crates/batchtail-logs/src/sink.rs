use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use batchtail_types::LogEvent;

use crate::filter::LogFilter;
use crate::format::format_event;

/// Apply a filter to a batch of events, preserving their order.
pub fn filter_events<'a>(events: &'a [LogEvent], filter: &LogFilter) -> Vec<&'a LogEvent> {
    events.iter().filter(|e| filter.matches(&e.message)).collect()
}

/// Keep only the last `n` items, reporting how many were dropped.
pub fn tail_slice<T>(items: &[T], n: usize) -> (usize, &[T]) {
    let start = items.len().saturating_sub(n);
    (start, &items[start..])
}

/// Counts reported after writing a log file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaveReport {
    pub total: usize,
    pub kept: usize,
    pub excluded: usize,
}

fn describe_suffix(filter: &LogFilter) -> String {
    let parts = filter.describe();
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

/// Print passing events to stdout, optionally truncated to the last `tail`,
/// followed by a one-line summary. Returns the number of lines printed.
pub fn print_events(events: &[LogEvent], filter: &LogFilter, tail: Option<usize>) -> usize {
    let passing = filter_events(events, filter);

    let (skipped, shown) = match tail {
        Some(n) if passing.len() > n => tail_slice(&passing, n),
        _ => (0, passing.as_slice()),
    };

    if skipped > 0 {
        println!("\n... ({skipped} events skipped) ...\n");
    }
    for event in shown {
        println!("{}", format_event(event));
    }

    println!(
        "\ntotal {}/{} events{}",
        shown.len(),
        events.len(),
        describe_suffix(filter)
    );
    shown.len()
}

/// Write passing events to `path`, one formatted line each.
///
/// Parent directories are created as needed. Reruns with the same path
/// replace prior content. The write goes to a sibling temp file which is
/// renamed over the destination once complete, so a failed run never leaves
/// a half-written file at the final path.
pub fn save_events(path: &Path, events: &[LogEvent], filter: &LogFilter) -> Result<SaveReport> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create log directory {}", parent.display())
            })?;
        }
    }

    let file_name = path
        .file_name()
        .with_context(|| format!("output path {} has no file name", path.display()))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let mut report = SaveReport {
        total: events.len(),
        kept: 0,
        excluded: 0,
    };

    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;
    for event in events {
        if filter.matches(&event.message) {
            writeln!(file, "{}", format_event(event))
                .with_context(|| format!("failed to write {}", tmp_path.display()))?;
            report.kept += 1;
        } else {
            report.excluded += 1;
        }
    }
    file.flush()
        .with_context(|| format!("failed to flush {}", tmp_path.display()))?;
    drop(file);

    fs::rename(&tmp_path, path).with_context(|| {
        format!("failed to move the log file into place at {}", path.display())
    })?;

    Ok(report)
}
