use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use raincheck::api;
use raincheck::api::middleware::SecurityConfig;
use raincheck::db::Database;
use raincheck::engine::{CheckOptions, ComplianceEngine, EngineConfig};
use raincheck::models::Location;
use raincheck::notify::{LogNotifier, Notifier, WebhookNotifier};
use raincheck::weather::OpenMeteoClient;

#[derive(Parser)]
#[command(name = "raincheck")]
#[command(about = "Rain-trigger compliance engine for stormwater inspections")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the compliance API server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Seconds between escalation sweeps
        #[arg(long, default_value = "300")]
        sweep_interval: u64,
    },
    /// Evaluate the rain trigger for one project (cron/webhook mode)
    Check {
        #[arg(long)]
        project_id: Uuid,

        #[arg(long)]
        lat: f64,

        #[arg(long)]
        lng: f64,

        /// IANA zone for deadline arithmetic (defaults to the engine config)
        #[arg(long)]
        timezone: Option<String>,
    },
    /// Run one escalation sweep over pending triggers
    Sweep,
    /// Show cooldown status for a project
    Status {
        #[arg(long)]
        project_id: Uuid,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "raincheck=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wire the production engine: SQLite storage, Open-Meteo weather, and a
/// webhook notifier when `RAINCHECK_NOTIFY_WEBHOOK` is set (log otherwise).
fn build_engine() -> anyhow::Result<Arc<ComplianceEngine>> {
    let db = Database::open_default()?;
    db.migrate()?;

    let notifier: Arc<dyn Notifier> = match std::env::var("RAINCHECK_NOTIFY_WEBHOOK") {
        Ok(url) => Arc::new(WebhookNotifier::new(url)),
        Err(_) => Arc::new(LogNotifier),
    };

    Ok(Arc::new(ComplianceEngine::new(
        Arc::new(OpenMeteoClient::from_env()),
        Arc::new(db),
        notifier,
        EngineConfig::default(),
    )))
}

async fn serve(port: u16, sweep_interval: u64) -> anyhow::Result<()> {
    tracing::info!("Starting raincheck server on port {}", port);

    let engine = build_engine()?;

    // Escalation runs on its own periodic tick, independent of request traffic.
    let sweeper = Arc::clone(&engine);
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(std::time::Duration::from_secs(sweep_interval));
        loop {
            tick.tick().await;
            if let Err(err) = sweeper.check_pending_deadlines(Utc::now()).await {
                tracing::error!(error = %err, "escalation sweep failed");
            }
        }
    });

    let app = api::create_router_with_security(engine, SecurityConfig::from_env());

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("raincheck server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve {
            port,
            sweep_interval,
        }) => {
            serve(port, sweep_interval).await?;
        }
        Some(Commands::Check {
            project_id,
            lat,
            lng,
            timezone,
        }) => {
            let engine = build_engine()?;
            let options = CheckOptions {
                timezone,
                as_of: None,
            };
            let trigger = engine
                .check_rain_trigger(project_id, Location::new(lat, lng), options)
                .await?;

            match &trigger {
                Some(t) => println!("{}", serde_json::to_string_pretty(t)?),
                None => println!("{}", serde_json::json!({ "triggered": false })),
            }
        }
        Some(Commands::Sweep) => {
            let engine = build_engine()?;
            engine.check_pending_deadlines(Utc::now()).await?;
        }
        Some(Commands::Status { project_id }) => {
            let engine = build_engine()?;
            let status = engine.cooldown_status(project_id);
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        None => {
            serve(3000, 300).await?;
        }
    }

    Ok(())
}
