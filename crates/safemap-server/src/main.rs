mod error;
mod http;
mod metrics;
mod planner;
mod profiles;
mod sos;
mod state;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use http::router;
use crate::metrics::init_metrics;
use safemap_alerts::{analyzer_from_config, AlertNotifier, LogNotifier, WebhookNotifier};
use safemap_core::assessment::{assess_area, AreaQuery};
use safemap_core::report::NewIncident;
use safemap_core::route::RouteOptions;
use safemap_core::store::{IncidentRepository, MemoryIncidentStore};
use safemap_core::types::{DateRange, IncidentRecord, Viewport};
use state::{AppConfig, AppState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "safemap")]
#[command(about = "Crime incident map backend with area safety scores and an SOS alert flow")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// HTTP server address
        #[arg(long, default_value = "127.0.0.1:8080")]
        http: String,
        /// JSON array of incident reports loaded at start
        #[arg(long)]
        seed: Option<PathBuf>,
        /// Gemini API key; the mock analyzer is used without one
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        gemini_api_key: Option<String>,
        #[arg(long, env = "GEMINI_BASE_URL")]
        gemini_base_url: Option<String>,
        /// Where SOS alerts are POSTed; alerts are only logged without it
        #[arg(long, env = "ALERT_WEBHOOK_URL")]
        alert_webhook_url: Option<String>,
        /// Degrees added around a route's endpoints
        #[arg(long, default_value = "0.005")]
        corridor_padding: f64,
        #[arg(long, default_value = "5.0")]
        walking_speed_kmh: f64,
    },
    /// Score an incident file offline and print the assessment
    Score {
        #[arg(long)]
        input: PathBuf,
        /// Viewport as north,south,east,west
        #[arg(long, value_parser = parse_bbox)]
        bbox: Option<Viewport>,
        #[arg(long, default_value = "All Time")]
        range: DateRange,
        /// Reference time, RFC3339 or YYYY-MM-DD (defaults to now, UTC)
        #[arg(long, value_parser = parse_now)]
        now: Option<NaiveDateTime>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Commands::Serve {
            http,
            seed,
            gemini_api_key,
            gemini_base_url,
            alert_webhook_url,
            corridor_padding,
            walking_speed_kmh,
        } => {
            let config = AppConfig {
                route_options: RouteOptions {
                    corridor_padding,
                    walking_speed_kmh,
                    ..RouteOptions::default()
                },
            };
            let analyzer = analyzer_from_config(gemini_api_key, gemini_base_url);
            let notifier: Arc<dyn AlertNotifier> = match alert_webhook_url {
                Some(url) => {
                    info!("Delivering SOS alerts to {}", url);
                    Arc::new(WebhookNotifier::new(url))
                }
                None => {
                    info!("No alert webhook configured, alerts will be logged");
                    Arc::new(LogNotifier)
                }
            };
            serve(http, seed, analyzer, notifier, config).await?;
        }
        Commands::Score {
            input,
            bbox,
            range,
            now,
        } => {
            score(&input, bbox, range, now)?;
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn serve(
    http_addr: String,
    seed: Option<PathBuf>,
    analyzer: Arc<dyn safemap_alerts::EvidenceAnalyzer>,
    notifier: Arc<dyn AlertNotifier>,
    config: AppConfig,
) -> anyhow::Result<()> {
    info!("Starting SafeMap");

    let metrics_handle = init_metrics().context("Failed to install Prometheus metrics recorder")?;

    let records = match &seed {
        Some(path) => load_incidents(path)?,
        None => Vec::new(),
    };
    info!("Loaded {} seed incidents", records.len());
    let store: Arc<dyn IncidentRepository> = Arc::new(MemoryIncidentStore::with_records(records));

    let state = AppState::new(store, analyzer, notifier, config).with_metrics(metrics_handle);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("Failed to bind {}", http_addr))?;
    info!("HTTP server listening on http://{}", http_addr);
    axum::serve(listener, app)
        .await
        .context("HTTP server error")?;

    Ok(())
}

/// Read a JSON array of incident reports, skipping invalid entries.
fn load_incidents(path: &Path) -> anyhow::Result<Vec<IncidentRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read incidents from {:?}", path))?;
    let reports: Vec<NewIncident> = serde_json::from_str(&text)
        .with_context(|| format!("Invalid incident file {:?}", path))?;

    let mut records = Vec::with_capacity(reports.len());
    for (index, report) in reports.into_iter().enumerate() {
        match report.into_record(Uuid::new_v4().to_string()) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping incident #{} in {:?}: {}", index, path, e),
        }
    }
    Ok(records)
}

fn score(
    input: &Path,
    bbox: Option<Viewport>,
    range: DateRange,
    now: Option<NaiveDateTime>,
) -> anyhow::Result<()> {
    let records = load_incidents(input)?;
    let now = now.unwrap_or_else(|| Utc::now().naive_utc());
    let query = AreaQuery {
        viewport: bbox,
        range,
        categories: None,
    };

    let assessment = assess_area(&records, &query, now);
    println!("{}", serde_json::to_string_pretty(&assessment)?);
    Ok(())
}

fn parse_bbox(text: &str) -> Result<Viewport, String> {
    let parts = text
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("'{}': {}", p.trim(), e)))
        .collect::<Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        [north, south, east, west] => Ok(Viewport::new(*north, *south, *east, *west)),
        _ => Err(format!("expected north,south,east,west, got {} values", parts.len())),
    }
}

fn parse_now(text: &str) -> Result<NaiveDateTime, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Ok(at.with_timezone(&Utc).naive_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(|d| d.and_time(chrono::NaiveTime::default()))
        .map_err(|_| format!("'{}' is neither RFC3339 nor YYYY-MM-DD", text))
}
