//! Frage CLI entry point.

use anyhow::Result;
use clap::Parser;
use frage::cli::{commands, Cli, Commands};
use frage::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("frage={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure the data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Init => {
            commands::run_init(&settings)?;
        }

        Commands::Import {
            video_id,
            transcript,
            title,
            language,
        } => {
            commands::run_import(
                video_id,
                transcript,
                title.clone(),
                language.clone(),
                settings,
            )
            .await?;
        }

        Commands::List => {
            commands::run_list(settings).await?;
        }

        Commands::Questions { video_id, json } => {
            commands::run_questions(video_id, *json, settings).await?;
        }

        Commands::Generate {
            video_id,
            count,
            chunks,
        } => {
            commands::run_generate(video_id, *count, chunks.clone(), settings).await?;
        }

        Commands::Analytics { video_id, json } => {
            commands::run_analytics(video_id, *json, settings).await?;
        }

        Commands::Reset { video_id, yes } => {
            commands::run_reset(video_id, *yes, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
