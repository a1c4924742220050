mod auth;
mod buyers;
mod config;
mod dashboard;
mod db;
mod email;
mod errors;
mod models;
mod routes;
mod seed;
mod state;
mod validation;

use anyhow::Result;
use axum_extra::extract::cookie::Key;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::auth::store::PgAuthStore;
use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::email::ResendMailer;
use crate::routes::build_router;
use crate::state::AppState;

#[derive(Parser)]
#[command(version, about = "Buyer lead CRM API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Insert a test user and sample buyers
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Seed => seed::run(&db).await,
        Command::Serve => serve(config, db).await,
    }
}

async fn serve(config: Config, db: sqlx::PgPool) -> Result<()> {
    info!("Starting leads API v{}", env!("CARGO_PKG_VERSION"));

    let mailer = ResendMailer::new(config.resend_api_key.clone(), config.email_from.clone());
    info!("Email client initialized (from: {})", config.email_from);

    let state = AppState {
        auth_store: Arc::new(PgAuthStore::new(db.clone())),
        mailer: Arc::new(mailer),
        cookie_key: Key::derive_from(config.session_secret.as_bytes()),
        config: Arc::new(config.clone()),
        db,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to APP_URL once the frontend is deployed separately

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
