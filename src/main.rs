use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lead_capture_api::app::build_app;
use lead_capture_api::config::Config;
use lead_capture_api::db::Database;
use lead_capture_api::handlers::AppState;
use lead_capture_api::submission::SubmissionHandler;
use lead_capture_api::submission_store::PgSubmissionStore;

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, connects to Postgres, builds the
/// submission pipeline and starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_capture_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let db = Database::new(&config.database_url).await?;
    db.ensure_schema().await?;
    tracing::info!("Database connection pool established");

    let store = Arc::new(PgSubmissionStore::new(db.pool.clone()));
    let submissions = SubmissionHandler::from_config(&config, store)?;
    tracing::info!("Submission pipeline ready: {:?}", submissions.settings());

    let app = build_app(Arc::new(AppState { submissions }))?;

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
