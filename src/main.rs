use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use ppdb_core::config::AppConfig;
use ppdb_core::error::AppError;
use ppdb_core::telemetry;
use ppdb_core::workflows::admissions::{
    admissions_router, parse_candidates, AdmissionsService, Application, DiskStorage,
    MemoryRepository, SelectionConfig, SelectionEngine, SelectionPlan,
};
use serde_json::json;
use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "PPDB Admissions Pipeline",
    about = "Run the admissions processing service or a selection dry run from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Selection engine utilities
    Selection {
        #[command(subcommand)]
        command: SelectionCommand,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum SelectionCommand {
    /// Plan a selection run over a CSV candidate roster without committing it
    Run(SelectionRunArgs),
}

#[derive(Args, Debug)]
struct SelectionRunArgs {
    /// Quota configuration JSON (period, batch, program quotas)
    #[arg(long)]
    quotas: PathBuf,
    /// Candidate roster CSV (name,major,path,score,created_at)
    #[arg(long)]
    candidates: PathBuf,
    /// Print every candidate decision instead of only the summary counts
    #[arg(long)]
    list_candidates: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Selection {
            command: SelectionCommand::Run(args),
        } => run_selection_dry_run(args),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let repository = Arc::new(MemoryRepository::default());
    let storage = Arc::new(DiskStorage::new(config.storage.root.clone()));
    let service = Arc::new(AdmissionsService::new(
        repository,
        storage,
        config.storage.documents_prefix.clone(),
    ));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(admissions_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "admissions pipeline ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_selection_dry_run(args: SelectionRunArgs) -> Result<(), AppError> {
    let SelectionRunArgs {
        quotas,
        candidates,
        list_candidates,
    } = args;

    let config: SelectionConfig =
        serde_json::from_reader(File::open(quotas)?).map_err(AppError::Quotas)?;
    let roster = parse_candidates(File::open(candidates)?, &config.period, &config.batch)?;

    let plan = SelectionEngine::plan(&config, &roster);
    render_selection_plan(&config, &roster, &plan, list_candidates);

    Ok(())
}

fn render_selection_plan(
    config: &SelectionConfig,
    roster: &[Application],
    plan: &SelectionPlan,
    list_candidates: bool,
) {
    println!("Selection dry run for {}/{}", config.period, config.batch);
    println!(
        "Candidates: {} | accepted: {} | rejected: {}",
        roster.len(),
        plan.accepted.len(),
        plan.rejected.len()
    );

    if !list_candidates {
        return;
    }

    println!("\nDecisions");
    for candidate in roster {
        let decision = if plan.accepted.contains(&candidate.id) {
            "accept"
        } else {
            "reject"
        };
        let score = candidate
            .total_score
            .map(|score| score.to_string())
            .unwrap_or_else(|| "-".to_string());
        let path = candidate
            .admission_path
            .map(|path| path.label())
            .unwrap_or("-");
        println!(
            "- {} | {} | {} | score {} | {}",
            candidate.applicant.full_name,
            candidate.major_choice.as_deref().unwrap_or("-"),
            path,
            score,
            decision
        );
    }
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
