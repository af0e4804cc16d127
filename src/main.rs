use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::debug;

use batchtail_aws::{resolve_log_group, AwsCli};
use batchtail_logs::{print_events, save_events, FilterMode, LogFilter};
use batchtail_types::LogLevel;

mod config;

use config::{Config, DEFAULT_REGION};

/// Batchtail - fetch, filter, and save the logs of an AWS Batch job
#[derive(Parser, Debug)]
#[command(name = "batchtail")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// AWS Batch job id to resolve to a log stream
    #[arg(long, conflicts_with = "log_stream")]
    job_id: Option<String>,

    /// CloudWatch log stream name
    #[arg(long)]
    log_stream: Option<String>,

    /// CloudWatch log stream name (positional form)
    #[arg(value_name = "LOG_STREAM", conflicts_with_all = ["job_id", "log_stream"])]
    log_stream_positional: Option<String>,

    /// File to save logs to (default: logs/batch_<job|stream>_<timestamp>.log)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Maximum number of events to fetch
    #[arg(long)]
    limit: Option<u32>,

    /// Keyword the message must contain (case-insensitive)
    #[arg(long = "filter", short = 'f', value_name = "KEYWORD")]
    keyword: Option<String>,

    /// Print only the last N events (console output only)
    #[arg(long, short)]
    tail: Option<usize>,

    /// Keep only errors and warnings (ERROR, WARNING, Exception, Traceback, ...)
    #[arg(long, short)]
    errors_only: bool,

    /// Minimum log level to include: DEBUG, INFO, WARNING, ERROR, or CRITICAL
    #[arg(long, value_name = "LEVEL")]
    min_level: Option<LogLevel>,

    /// Regex pattern to exclude (repeatable)
    #[arg(long = "exclude", value_name = "PATTERN")]
    exclude: Vec<String>,

    /// AWS region (default: ap-northeast-2, or the config file's region)
    #[arg(long)]
    region: Option<String>,

    /// CloudWatch log group (default: inferred from the stream name)
    #[arg(long)]
    log_group: Option<String>,

    /// Print to the console only, skip saving to a file
    #[arg(long)]
    no_save: bool,

    /// Include all logs (disables the default errors-only filtering)
    #[arg(long)]
    all: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing for diagnostics
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load();
    debug!(?config, "loaded configuration");

    // Decided once here; every later branch consults the mode, not the raw
    // flag combination.
    let mode = FilterMode::resolve(
        args.all,
        args.errors_only,
        args.keyword.is_some(),
        args.min_level.is_some(),
    );
    if mode == FilterMode::DefaultErrorsOnly {
        println!("defaulting to errors/warnings only (pass --all to include everything)");
    }

    let region = args
        .region
        .clone()
        .or_else(|| config.region.clone())
        .unwrap_or_else(|| DEFAULT_REGION.to_string());
    let aws = AwsCli::new(region);

    // Exactly one input source. clap rejects conflicting flags; this match
    // covers the all-absent case and backstops the exclusivity policy.
    let (log_stream, job_id) = match (&args.job_id, &args.log_stream, &args.log_stream_positional)
    {
        (Some(job_id), None, None) => {
            println!("resolving log stream for job {job_id}");
            let location = aws
                .describe_job(job_id)
                .await
                .with_context(|| format!("failed to resolve job {job_id}"))?;
            println!(
                "log stream: {} (job status: {})",
                location.log_stream, location.status
            );
            (location.log_stream, Some(job_id.clone()))
        }
        (None, Some(stream), None) | (None, None, Some(stream)) => {
            println!("log stream: {stream}");
            (stream.clone(), None)
        }
        (None, None, None) => {
            bail!("provide --job-id, --log-stream, or a positional log stream name")
        }
        _ => bail!("use only one of --job-id, --log-stream, or the positional log stream name"),
    };

    let group_override = args.log_group.as_deref().or(config.log_group.as_deref());
    let log_group = resolve_log_group(&log_stream, group_override);
    println!("log group: {log_group}");

    let events = aws
        .get_log_events(log_group, &log_stream, args.limit)
        .await?;
    println!("fetched {} log events", events.len());

    if events.is_empty() {
        println!("no log events found");
        return Ok(());
    }

    let mut filter = LogFilter::new();
    if mode.errors_only() {
        filter = filter.errors_only();
    }
    if let Some(level) = args.min_level {
        filter = filter.with_min_level(level);
    }
    if let Some(keyword) = &args.keyword {
        filter = filter.with_keyword(keyword.clone());
    }
    filter = filter
        .with_exclude_patterns(&args.exclude)
        .context("invalid --exclude pattern")?;

    println!("\n{}", "=".repeat(80));
    println!("logs");
    println!("{}\n", "=".repeat(80));
    print_events(&events, &filter, args.tail);

    if !args.no_save {
        let path = args.output.clone().unwrap_or_else(|| {
            default_output_path(&config, job_id.as_deref(), mode.errors_only())
        });
        let report = save_events(&path, &events, &filter)
            .with_context(|| format!("failed to save logs to {}", path.display()))?;
        println!(
            "\nsaved {} of {} events to {} ({} excluded)",
            report.kept,
            report.total,
            path.display(),
            report.excluded
        );
    }

    Ok(())
}

/// Timestamped, job/stream-tagged path under the configured logs directory.
fn default_output_path(config: &Config, job_id: Option<&str>, errors_only: bool) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let tag = job_id
        .map(|id| id.chars().take(8).collect::<String>())
        .unwrap_or_else(|| "stream".to_string());
    let suffix = if errors_only { "_errors" } else { "" };
    config
        .output_dir()
        .join(format!("batch_{tag}_{timestamp}{suffix}.log"))
}
