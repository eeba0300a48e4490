//! CLI for the Ladok client.
//!
//! `feed`: fetch a feed page -> decode -> print or stream NDJSON.
//! `check-permission`: fetch held groups -> fetch definitions -> reconcile.

use clap::{Args, Parser, Subcommand};
use ladok_core::{ActivityId, LadokError, Permissions};
use ladok_engine::permissions::{evaluate, unify};
use ladok_engine::sink::{FeedSummaryRow, JsonStreamSink};
use ladok_engine::{PermissionReconciler, PermissionReport, ReconcilerConfig};
use ladok_provider::{Environment, FeedSelector, LadokProvider, RestProvider, TransportConfig};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "ladok", version, about = "Ladok feed and permission client")]
struct Cli {
    #[command(flatten)]
    connection: Connection,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct Connection {
    /// Base URL of the Ladok deployment.
    #[arg(long, global = true, env = "LADOK_URL")]
    url: Option<String>,

    /// PKCS#12 client certificate.
    #[arg(long, global = true, env = "LADOK_CERTIFICATE")]
    certificate: Option<PathBuf>,

    #[arg(long, global = true, env = "LADOK_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// production, test or int-test.
    #[arg(long = "env", global = true, env = "LADOK_ENV", default_value = "production")]
    environment: Environment,

    #[arg(long, global = true, default_value_t = 30)]
    timeout_secs: u64,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch and decode one page of the event feed.
    Feed {
        /// Oldest page instead of the most recent one.
        #[arg(long, conflicts_with = "id")]
        first: bool,

        /// Historical page by numeric id.
        #[arg(long)]
        id: Option<u64>,

        #[arg(long, default_value_t = false)]
        json: bool,

        /// Sink output: "ndjson" writes NDJSON to stdout,
        /// "ndjson:/path/to/file" writes to file.
        #[arg(long)]
        sink: Option<String>,
    },

    /// Check that held permission groups cover the required activities.
    CheckPermission {
        /// Required activity as ID=LEVEL, e.g. 61001=las. Repeatable.
        #[arg(long = "require", required = true, value_parser = parse_requirement)]
        requirements: Vec<(ActivityId, String)>,

        /// Max concurrent profile fetches.
        #[arg(long, default_value_t = 4)]
        concurrency: usize,

        /// Skip the per-activity report on stderr.
        #[arg(long, default_value_t = false)]
        quiet: bool,
    },
}

/// Parses `ID=LEVEL`; bare level names get the `rattighetsniva.` prefix.
fn parse_requirement(raw: &str) -> Result<(ActivityId, String), String> {
    let (id, level) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=LEVEL, got {raw:?}"))?;
    let id: ActivityId = id
        .trim()
        .parse()
        .map_err(|e| format!("invalid activity id {id:?}: {e}"))?;
    let level = level.trim();
    if level.is_empty() {
        return Err(format!("missing level for activity {id}"));
    }
    let level = if level.contains('.') {
        level.to_string()
    } else {
        format!("rattighetsniva.{level}")
    };
    Ok((id, level))
}

impl Connection {
    fn provider(&self) -> Result<RestProvider, Box<dyn std::error::Error>> {
        let url = self
            .url
            .clone()
            .ok_or_else(|| LadokError::InvalidInput("--url or LADOK_URL is required".into()))?;

        let mut config = TransportConfig::new(url)
            .with_environment(self.environment)
            .with_timeout(Duration::from_secs(self.timeout_secs));

        if let Some(path) = &self.certificate {
            let pkcs12 = std::fs::read(path)?;
            config = config.with_identity(pkcs12, self.password.clone().unwrap_or_default());
        }

        Ok(RestProvider::new(&config)?)
    }
}

/// Cancels the returned token on Ctrl-C.
fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling");
            trigger.cancel();
        }
    });
    cancel
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Feed {
            first,
            id,
            json,
            sink,
        } => {
            let selector = match (first, id) {
                (true, _) => FeedSelector::First,
                (false, Some(id)) => FeedSelector::Historical(id),
                (false, None) => FeedSelector::Recent,
            };
            let t0 = Instant::now();

            tracing::info!(%selector, environment = ?cli.connection.environment, "fetching feed");

            let provider = cli.connection.provider()?;
            let feed = ladok_engine::fetch_feed(&provider, selector).await?;

            tracing::info!(
                feed_id = feed.id,
                entries = feed.entries,
                elapsed_ms = t0.elapsed().as_millis(),
                "feed decoded"
            );

            let summary = FeedSummaryRow::new(&feed);

            if let Some(ref sink_spec) = sink {
                if sink_spec == "ndjson" {
                    let mut s = JsonStreamSink::stdout();
                    s.write_row(&summary)?;
                    s.write_rows(&feed.events)?;
                    let n = s.finish()?;
                    tracing::info!(rows = n, "ndjson sink: wrote to stdout");
                } else if let Some(path) = sink_spec.strip_prefix("ndjson:") {
                    let file = std::fs::File::create(path)?;
                    let mut s = JsonStreamSink::new(file);
                    s.write_row(&summary)?;
                    s.write_rows(&feed.events)?;
                    let n = s.finish()?;
                    tracing::info!(rows = n, path, "ndjson sink: wrote to file");
                } else {
                    return Err(LadokError::InvalidInput(format!(
                        "unknown sink {sink_spec:?}, use 'ndjson' or 'ndjson:/path'"
                    ))
                    .into());
                }
            } else if json {
                println!("{}", serde_json::to_string_pretty(&feed)?);
            } else {
                let mut out = std::io::stdout().lock();
                writeln!(
                    out,
                    "feed {}: {} events ({} skipped)",
                    summary.feed_id, summary.events, summary.skipped
                )?;
                for event in &feed.events {
                    writeln!(
                        out,
                        "  {:<40} {:<34} {}",
                        event.entry_id,
                        event.kind(),
                        event.student_uid().unwrap_or("-")
                    )?;
                }
            }
        }

        Commands::CheckPermission {
            requirements,
            concurrency,
            quiet,
        } => {
            let required: Permissions = requirements.into_iter().collect();
            let provider: Arc<dyn LadokProvider> = Arc::new(cli.connection.provider()?);
            let reconciler = PermissionReconciler::new(provider).with_config(ReconcilerConfig {
                max_concurrent: concurrency,
                timeout: Some(Duration::from_secs(cli.connection.timeout_secs)),
            });
            let cancel = cancel_on_interrupt();

            let verdict = if quiet {
                reconciler
                    .check_permission_with_cancel(&required, &cancel)
                    .await
            } else {
                let t0 = Instant::now();
                let held = reconciler.fetch_held_grants_with_cancel(&cancel).await?;
                eprint!(
                    "{}",
                    PermissionReport::build(&held, &required, t0.elapsed()).render()
                );
                evaluate(&unify(&held.granted, &required), &required)
            };

            verdict?;
            println!("ok: {} required permissions held", required.len());
        }
    }

    Ok(())
}
