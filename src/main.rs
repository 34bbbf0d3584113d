mod api;
mod engine;
mod scheduler;
#[cfg(test)]
mod testutil;

use clap::{Parser, Subcommand};
use engine::Engine;
use pulse_core::config;
use pulse_sms::TwilioMessenger;
use pulse_store::Store;
use scheduler::Scheduler;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "pulse",
    version,
    about = "Pulse — daily SMS well-being survey service"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the survey service: scheduler plus HTTP API.
    Start,
    /// Check configuration and database health.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Start => {
            let cfg = config::load(&cli.config)?;

            let store = Store::new(&cfg.store).await?;
            info!("database ready at {}", cfg.store.db_path);

            if !cfg.twilio.is_configured() {
                warn!(
                    "twilio credentials not configured; outbound SMS will fail \
                     and be logged as failures. Set [twilio] in config.toml or \
                     PULSE_TWILIO_* env vars."
                );
            }
            let messenger = Arc::new(TwilioMessenger::new(cfg.twilio.clone()));

            let engine = Arc::new(Engine::new(
                store.clone(),
                messenger,
                cfg.service.base_url.clone(),
                cfg.scheduler.send_delay_ms,
            ));

            let scheduler = Arc::new(Scheduler::new(engine.clone(), &cfg.scheduler)?);
            scheduler.start();

            if cfg.api.admin_token.is_empty() {
                warn!("api.admin_token is empty; /api/admin/* will reject all requests");
            }
            let state = api::ApiState {
                store,
                engine,
                scheduler: scheduler.clone(),
                admin_token: if cfg.api.admin_token.is_empty() {
                    None
                } else {
                    Some(cfg.api.admin_token.clone())
                },
                service_name: cfg.service.name.clone(),
            };

            tokio::select! {
                result = api::serve(state, &cfg.api.host, cfg.api.port) => {
                    result?;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown signal received");
                }
            }
            scheduler.stop();
        }
        Commands::Status => {
            let cfg = config::load(&cli.config)?;
            println!("Pulse — Status Check\n");
            println!("Config: {}", cli.config);
            println!("Service: {}", cfg.service.name);
            println!(
                "Schedule: daily at {:02}:{:02} {}",
                cfg.scheduler.hour, cfg.scheduler.minute, cfg.scheduler.timezone
            );
            println!(
                "Twilio: {}",
                if cfg.twilio.is_configured() {
                    "configured"
                } else {
                    "not configured"
                }
            );
            println!(
                "Admin API: {}",
                if cfg.api.admin_token.is_empty() {
                    "locked (no token set)"
                } else {
                    "token set"
                }
            );

            match Store::new(&cfg.store).await {
                Ok(store) => {
                    if store.ping().await {
                        println!("Database: ok ({})", cfg.store.db_path);
                    } else {
                        println!("Database: unreachable ({})", cfg.store.db_path);
                    }
                }
                Err(e) => println!("Database: failed to open ({e})"),
            }
        }
    }

    Ok(())
}
