use chrono::{DateTime, Local};

use batchtail_types::LogEvent;

/// Render one event as `[YYYY-MM-DD HH:MM:SS.mmm] message` in local time.
///
/// Trailing whitespace and newlines are stripped from the message body;
/// internal structure, including embedded newlines from multi-line
/// tracebacks, is preserved verbatim. An out-of-range timestamp clamps to
/// the epoch rather than failing (a caller contract violation, not an
/// error path).
pub fn format_event(event: &LogEvent) -> String {
    let timestamp = DateTime::from_timestamp_millis(event.timestamp)
        .unwrap_or_default()
        .with_timezone(&Local);

    format!(
        "[{}] {}",
        timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        event.message.trim_end()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn timestamp_shape() -> Regex {
        Regex::new(r"^\[\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d{3}\] ").unwrap()
    }

    #[test]
    fn test_format_shape() {
        let event = LogEvent::new(1_704_103_200_123, "job started");
        let line = format_event(&event);
        assert!(timestamp_shape().is_match(&line));
        assert!(line.ends_with("] job started"));
    }

    #[test]
    fn test_trailing_whitespace_stripped() {
        let event = LogEvent::new(0, "message with newline\n");
        assert!(format_event(&event).ends_with("message with newline"));
    }

    #[test]
    fn test_internal_newlines_preserved() {
        let event = LogEvent::new(0, "Traceback:\n  File \"main.py\"\nValueError\n");
        let line = format_event(&event);
        assert!(line.contains("Traceback:\n  File \"main.py\"\nValueError"));
        assert!(!line.ends_with('\n'));
    }
}
