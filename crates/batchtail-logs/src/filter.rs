use regex::{Regex, RegexSet};

use batchtail_types::LogLevel;

/// Signal patterns for the errors-only filter, matched case-insensitively
/// anywhere in the message. The emoji glyphs and Korean markers are in-band
/// error/warning markers emitted by the job runtime.
const ERROR_SIGNALS: [&str; 12] = [
    r"\bERROR\b",
    r"\bWARNING\b",
    r"\bException\b",
    r"\bTraceback\b",
    r"\bfailed\b",
    r"\b실패\b",
    "⚠️",
    "❌",
    "validation error",
    "파싱 실패",
    "분석 실패",
    "처리 실패",
];

/// Compiled composite filter for log messages.
///
/// Built once per run and immutable afterwards. The four sub-filters are
/// ANDed and evaluated in a fixed order, short-circuiting on the first
/// failing check: error classification, minimum level, keyword, exclusion
/// patterns.
#[derive(Clone, Debug, Default)]
pub struct LogFilter {
    /// Error-signal patterns, compiled when errors-only is active.
    error_signals: Option<RegexSet>,

    /// Severity floor. Messages with no detectable level pass vacuously.
    min_level: Option<LogLevel>,

    /// Case-insensitive substring the message must contain.
    keyword: Option<String>,

    /// Case-insensitive patterns; any match rejects the message.
    exclude: Vec<Regex>,
}

impl LogFilter {
    /// Create an empty filter that passes every message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to messages carrying an error/warning signal.
    pub fn errors_only(mut self) -> Self {
        let patterns: Vec<String> = ERROR_SIGNALS.iter().map(|p| format!("(?i){p}")).collect();
        self.error_signals =
            Some(RegexSet::new(&patterns).expect("error signal patterns are valid"));
        self
    }

    /// Set the minimum severity level.
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = Some(level);
        self
    }

    /// Set the keyword the message must contain (case-insensitive).
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Add exclusion patterns, compiled case-insensitively.
    pub fn with_exclude_patterns<I, S>(mut self, patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.exclude
                .push(Regex::new(&format!("(?i){}", pattern.as_ref()))?);
        }
        Ok(self)
    }

    /// Check whether a message passes every active sub-filter.
    pub fn matches(&self, message: &str) -> bool {
        if let Some(signals) = &self.error_signals {
            if !signals.is_match(message) {
                return false;
            }
        }

        if let Some(floor) = self.min_level {
            // Absence of a detectable level is not a rejection.
            if let Some(level) = LogLevel::detect(message) {
                if level < floor {
                    return false;
                }
            }
        }

        if let Some(keyword) = &self.keyword {
            if !message.to_lowercase().contains(&keyword.to_lowercase()) {
                return false;
            }
        }

        // Exclusion patterns are the final veto.
        self.exclude.iter().all(|re| !re.is_match(message))
    }

    /// Check if the filter is empty (passes everything).
    pub fn is_empty(&self) -> bool {
        self.error_signals.is_none()
            && self.min_level.is_none()
            && self.keyword.is_none()
            && self.exclude.is_empty()
    }

    /// Human-readable description of the active sub-filters, used by the
    /// sink summaries.
    pub fn describe(&self) -> Vec<String> {
        let mut parts = Vec::new();
        if self.error_signals.is_some() {
            parts.push("errors/warnings only".to_string());
        }
        if let Some(level) = self.min_level {
            parts.push(format!("min level: {level}"));
        }
        if let Some(keyword) = &self.keyword {
            parts.push(format!("keyword: '{keyword}'"));
        }
        if !self.exclude.is_empty() {
            parts.push(format!("exclude patterns: {}", self.exclude.len()));
        }
        parts
    }
}

/// How the run's filtering was decided, resolved once at argument-parsing
/// time from the raw flag combination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterMode {
    /// `--all`: no error classification, regardless of other flags.
    All,
    /// `--errors-only` given explicitly.
    ErrorsOnly,
    /// A keyword and/or minimum level was given; no implicit errors-only.
    Custom,
    /// Nothing specified; the tool defaults to errors-only and says so.
    DefaultErrorsOnly,
}

impl FilterMode {
    /// Resolve the mode from the flag combination.
    pub fn resolve(all: bool, errors_only: bool, has_keyword: bool, has_min_level: bool) -> Self {
        if all {
            Self::All
        } else if errors_only {
            Self::ErrorsOnly
        } else if has_keyword || has_min_level {
            Self::Custom
        } else {
            Self::DefaultErrorsOnly
        }
    }

    /// Whether error classification applies under this mode.
    pub fn errors_only(self) -> bool {
        matches!(self, Self::ErrorsOnly | Self::DefaultErrorsOnly)
    }
}
