// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backfill CLI: rename historical dog walks.

use clap::Parser;
use dog_patrol::{
    config::Config,
    db::{ConfigStore, FirestoreDb, InMemoryConfigStore},
    error::AppError,
    models::RunStats,
    services::{
        backfill::{cutoff, lookback_days},
        Backfiller, ClientCredentials, RunMode, StravaClient, TokenManager,
    },
};
use std::process::ExitCode;
use std::sync::Arc;

/// Exit status for an interrupted run (128 + SIGINT).
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(
    name = "backfill",
    version,
    about = "Rename past Strava dog walks with themed names by time of day"
)]
struct Cli {
    /// Look back this many days
    #[arg(long, conflicts_with = "months")]
    days: Option<u32>,

    /// Look back this many months (30 days each)
    #[arg(long)]
    months: Option<u32>,

    /// Show what would be renamed without changing anything
    #[arg(long)]
    dry_run: bool,

    /// Strava OAuth client ID
    #[arg(long, env = "STRAVA_CLIENT_ID")]
    client_id: Option<String>,

    /// Strava OAuth client secret
    #[arg(long, env = "STRAVA_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Refresh token to use instead of the one in Firestore
    #[arg(long)]
    refresh_token: Option<String>,

    /// Print the run statistics as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    tokio::select! {
        result = run(cli) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "Backfill failed");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, aborting backfill");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(id) = cli.client_id {
        config.strava_client_id = id.trim().to_string();
    }
    if let Some(secret) = cli.client_secret {
        config.strava_client_secret = secret.trim().to_string();
    }

    let mode = if cli.dry_run {
        RunMode::DryRun
    } else {
        RunMode::Live
    };
    let days = lookback_days(cli.days, cli.months);
    let after = cutoff(chrono::Utc::now(), days)?;

    tracing::info!(
        days,
        after = %after.format("%Y-%m-%d"),
        dry_run = cli.dry_run,
        "Dog Patrol backfill"
    );

    // A refresh token on the command line means a throwaway store; the
    // operator has to keep any rotated token themselves.
    let standalone = cli
        .refresh_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| (t.to_string(), InMemoryConfigStore::with_refresh_token(t)));

    let store: Arc<dyn ConfigStore> = match &standalone {
        Some((_, memory)) => {
            tracing::info!("Using refresh token from the command line");
            Arc::new(memory.clone())
        }
        None => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
    };

    let strava = StravaClient::new(&config);
    let tokens = TokenManager::new(strava.clone(), store, ClientCredentials::from(&config));
    let backfiller = Backfiller::new(tokens, strava, mode);

    let result = backfiller.run(after).await;

    // Report rotation even if the run itself failed after the refresh.
    if let Some((original, memory)) = &standalone {
        report_rotated_token(original, memory).await;
    }

    let stats = result.inspect_err(log_hint)?;
    if cli.json {
        print_json(&stats)?;
    }
    Ok(())
}

async fn report_rotated_token(original: &str, store: &InMemoryConfigStore) {
    let rotated = store
        .snapshot()
        .await
        .and_then(|doc| doc.refresh_token().map(str::to_string));

    if let Some(token) = rotated.filter(|t| t != original) {
        tracing::warn!(
            refresh_token = %token,
            "Strava rotated the refresh token; use this one next time"
        );
    }
}

fn log_hint(e: &AppError) {
    match e {
        AppError::Auth(_) => tracing::info!(
            "Check --client-id/--client-secret and that the refresh token is still valid"
        ),
        AppError::Config(_) => tracing::info!(
            "No Strava link found; pass --refresh-token or store one in auth/strava_config"
        ),
        _ if e.is_rate_limited() => {
            tracing::info!("Strava rate limit persisted; try again after the daily reset")
        }
        _ => {}
    }
}

fn print_json(stats: &RunStats) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(stats)?);
    Ok(())
}

/// Human-readable logging on stderr.
fn init_logging() {
    tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dog_patrol=debug".parse().unwrap())
                .add_directive("backfill=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .init();
}
