//! Nearest Centers Worker - ranks service centers around a free-text address
//!
//! This worker connects to NATS and answers nearest-center lookups.

mod cli;
mod config;
mod defaults;
mod db;
mod handlers;
mod services;
mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use crate::cli::{Cli, Command};
use crate::services::nearest::NearestCentersService;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs directory - use LOGS_DIR env var or default to ../logs (relative to worker)
    let logs_dir = std::env::var("LOGS_DIR")
        .unwrap_or_else(|_| "../logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(
        Rotation::DAILY,
        &logs_dir,
        "worker.log",
    );
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - stderr and file, stdout stays clean for `lookup`
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,nearest_centers_worker=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))  // file
        .init();

    info!("Starting Nearest Centers Worker...");

    // Load configuration
    let config = config::Config::from_env()?;
    info!("Configuration loaded");

    // Connect to database when one is configured
    let pool = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url).await?;
            info!("Connected to PostgreSQL");
            Some(pool)
        }
        None => None,
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Migrate => {
            let pool = pool.context("DATABASE_URL must be set to run migrations")?;
            db::run_migrations(&pool).await?;
            Ok(())
        }
        Command::Lookup { address } => {
            let service = NearestCentersService::from_config(&config, pool)?;
            let response = service.respond(&address).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Command::Serve => {
            if let Some(pool) = &pool {
                db::run_migrations(pool).await?;
            }

            let service = Arc::new(NearestCentersService::from_config(&config, pool)?);

            // Connect to NATS (supports optional NATS_USER/NATS_PASSWORD auth).
            let nats_client = match (std::env::var("NATS_USER"), std::env::var("NATS_PASSWORD")) {
                (Ok(user), Ok(password)) if !user.is_empty() => {
                    async_nats::ConnectOptions::new()
                        .user_and_password(user, password)
                        .connect(&config.nats_url)
                        .await?
                }
                _ => async_nats::connect(&config.nats_url).await?,
            };
            info!("Connected to NATS at {}", config.nats_url);

            // Start message handlers
            let handler_result = handlers::start_handlers(nats_client, service).await;

            if let Err(e) = handler_result {
                error!("Handler error: {}", e);
                return Err(e);
            }

            Ok(())
        }
    }
}
