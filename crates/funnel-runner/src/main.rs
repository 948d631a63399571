//! Registration funnel runner - Main entry point.
//!
//! Reads commands from stdin, one per line, and ticks the resend cooldown on
//! a fixed interval until the funnel completes or input ends.

mod commands;
mod config;
mod error;

use crate::commands::{execute, Command, HELP};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use anyhow::Context;
use funnel_core::{
    AnalyticsSink, Collaborators, ExternalIds, FunnelDefinition, NoopAnalytics, StepSequencer,
};
use registration_client::RegistrationClient;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.log.level);

    info!("Starting registration funnel runner...");

    let client = Arc::new(
        RegistrationClient::new(&config.backend.base_url, config.backend.timeout)
            .context("Failed to create registration client")?,
    );

    // The funnel degrades gracefully without a backend, so this is not fatal.
    if client.health_check().await {
        info!("Registration backend healthy at {}", config.backend.base_url);
    } else {
        warn!(
            "Registration backend not reachable at {} - continuing with fallbacks",
            config.backend.base_url
        );
    }

    let external = ExternalIds::from_query(&config.runner.query)
        .with_session_marker(config.runner.session_marker.as_deref());
    if !external.is_empty() {
        info!(job_id = ?external.job_id, campaign_id = ?external.campaign_id, "Carried identifiers");
    }

    let analytics: Arc<dyn AnalyticsSink> = if config.backend.analytics {
        client.clone()
    } else {
        Arc::new(NoopAnalytics)
    };

    let sequencer = StepSequencer::new(
        FunnelDefinition::standard(),
        &config.funnel,
        Collaborators {
            verification: client.clone(),
            accounts: client.clone(),
            reference: client.clone(),
            analytics,
        },
        external,
    );
    sequencer.start().await;

    println!("{}", HELP);
    println!("Step: {}", sequencer.current_step().await);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = LinesStream::new(stdin.lines());
    let mut ticker = tokio::time::interval(config.runner.tick_interval);

    // Main input loop
    loop {
        tokio::select! {
            line = lines.next() => {
                let line = match line {
                    Some(line) => line?,
                    None => {
                        info!("Input closed");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                let command = match line.parse::<Command>() {
                    Ok(command) => command,
                    Err(e) => {
                        println!("! {}", e);
                        continue;
                    }
                };
                if command == Command::Quit {
                    break;
                }

                match execute(&sequencer, command).await {
                    Ok(output) => println!("{}", output),
                    Err(AppError::Funnel(e)) => println!("! {}", e),
                    Err(e) => error!("Command failed: {}", e),
                }

                let snapshot = sequencer.snapshot().await;
                if snapshot.completed {
                    if let Some(redirect) = &snapshot.redirect {
                        println!("Redirect: {}", redirect.url());
                    }
                    break;
                }
            }
            _ = ticker.tick() => {
                sequencer.tick().await;
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Shutting down...");
    sequencer.settle().await;
    sequencer.teardown().await;
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
