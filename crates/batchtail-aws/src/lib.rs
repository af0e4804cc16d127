//! AWS CLI client for batchtail
//!
//! Wraps the `aws batch` and `aws logs` subcommands. Responses are parsed
//! from the CLI's JSON output; any CLI failure is fatal for the run.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use batchtail_types::{JobLogLocation, LogEvent};

/// Log group for streams created by the deep-agents job queue.
const DEEP_AGENTS_LOG_GROUP: &str = "/aws/batch/deep-agents";

/// Fallback log group for every other stream.
const DEFAULT_LOG_GROUP: &str = "/aws/batch/job";

/// Stream-name prefix identifying deep-agents jobs.
const DEEP_AGENTS_PREFIX: &str = "deep-agents/";

/// Pick the log group for a stream from its naming convention, unless the
/// caller supplies an override.
pub fn resolve_log_group<'a>(log_stream: &str, override_group: Option<&'a str>) -> &'a str {
    if let Some(group) = override_group {
        return group;
    }
    if log_stream.starts_with(DEEP_AGENTS_PREFIX) {
        DEEP_AGENTS_LOG_GROUP
    } else {
        DEFAULT_LOG_GROUP
    }
}

/// Thin wrapper over the `aws` CLI for one region.
pub struct AwsCli {
    region: String,
}

impl AwsCli {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Run one `aws` subcommand with `--output json` and parse its stdout.
    async fn run(&self, args: &[&str]) -> Result<Value> {
        let output = Command::new("aws")
            .args(args)
            .args(["--region", &self.region, "--output", "json"])
            .output()
            .await
            .context("failed to invoke the aws CLI. Is it installed and on PATH?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("aws {} failed: {}", args.join(" "), stderr.trim());
        }

        if output.stdout.is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_slice(&output.stdout)
            .with_context(|| format!("failed to parse aws {} output as JSON", args.join(" ")))
    }

    /// Resolve a Batch job id to its log stream and current status.
    ///
    /// Fails when the job is unknown or has no log stream yet (it has not
    /// started); the error message carries the job status.
    pub async fn describe_job(&self, job_id: &str) -> Result<JobLogLocation> {
        debug!(job_id, "resolving log stream via describe-jobs");
        let response = self
            .run(&["batch", "describe-jobs", "--jobs", job_id])
            .await?;
        parse_job_location(&response, job_id)
    }

    /// Fetch the log events of one stream, bounded by `limit` when given.
    pub async fn get_log_events(
        &self,
        log_group: &str,
        log_stream: &str,
        limit: Option<u32>,
    ) -> Result<Vec<LogEvent>> {
        debug!(log_group, log_stream, ?limit, "fetching log events");

        let limit_value = limit.map(|n| n.to_string());
        let mut args = vec![
            "logs",
            "get-log-events",
            "--log-group-name",
            log_group,
            "--log-stream-name",
            log_stream,
        ];
        if let Some(value) = &limit_value {
            args.extend(["--limit", value.as_str()]);
        }

        let response = self.run(&args).await?;
        parse_log_events(response)
    }
}

fn parse_job_location(response: &Value, job_id: &str) -> Result<JobLogLocation> {
    let Some(job) = response.get("jobs").and_then(|jobs| jobs.get(0)) else {
        bail!("job not found: {job_id}");
    };

    let status = job
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("UNKNOWN")
        .to_string();

    let log_stream = job
        .pointer("/container/logStreamName")
        .and_then(Value::as_str)
        .map(str::to_string);
    let Some(log_stream) = log_stream else {
        bail!("job {job_id} has no log stream yet (status: {status})");
    };

    Ok(JobLogLocation { log_stream, status })
}

fn parse_log_events(response: Value) -> Result<Vec<LogEvent>> {
    #[derive(Deserialize)]
    struct Events {
        #[serde(default)]
        events: Vec<LogEvent>,
    }

    let parsed: Events = serde_json::from_value(response)
        .context("unexpected get-log-events response shape")?;
    Ok(parsed.events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_log_group() {
        assert_eq!(
            resolve_log_group("deep-agents/default/0a89ff", None),
            "/aws/batch/deep-agents"
        );
        assert_eq!(resolve_log_group("some-queue/default/abc", None), "/aws/batch/job");
        assert_eq!(
            resolve_log_group("deep-agents/default/0a89ff", Some("/custom/group")),
            "/custom/group"
        );
    }

    #[test]
    fn test_parse_job_location() {
        let response = json!({
            "jobs": [{
                "status": "RUNNING",
                "container": { "logStreamName": "deep-agents/default/0a89ff" }
            }]
        });
        let location = parse_job_location(&response, "job-1").unwrap();
        assert_eq!(location.log_stream, "deep-agents/default/0a89ff");
        assert_eq!(location.status, "RUNNING");
    }

    #[test]
    fn test_parse_job_location_missing_job() {
        let err = parse_job_location(&json!({ "jobs": [] }), "job-1").unwrap_err();
        assert!(err.to_string().contains("job not found"));

        let err = parse_job_location(&json!({}), "job-1").unwrap_err();
        assert!(err.to_string().contains("job not found"));
    }

    #[test]
    fn test_parse_job_location_no_stream_reports_status() {
        let response = json!({ "jobs": [{ "status": "SUBMITTED" }] });
        let err = parse_job_location(&response, "job-1").unwrap_err();
        assert!(err.to_string().contains("no log stream"));
        assert!(err.to_string().contains("SUBMITTED"));
    }

    #[test]
    fn test_parse_log_events() {
        let response = json!({
            "events": [
                { "timestamp": 1704103200000i64, "message": "started", "ingestionTime": 1704103200500i64 },
                { "timestamp": 1704103201000i64, "message": "done" }
            ],
            "nextForwardToken": "f/123"
        });
        let events = parse_log_events(response).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message, "started");
        assert_eq!(events[1].timestamp, 1_704_103_201_000);
    }

    #[test]
    fn test_parse_log_events_empty_response() {
        let events = parse_log_events(json!({})).unwrap();
        assert!(events.is_empty());
    }
}
