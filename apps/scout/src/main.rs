use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use openscout::extract::load_resume;
use openscout::models::ListingFilter;
use openscout::render::{render_failure, render_json, render_report};
use openscout::{Config, Pipeline, PipelineVariant};

#[derive(Parser)]
#[command(name = "openscout")]
#[command(about = "Analyze a resume, find matching tech jobs and draft application emails")]
struct Cli {
    /// Resume file (.pdf, .docx or plain text)
    resume: PathBuf,

    /// `search` (analysis + job search) or `apply` (adds application emails)
    #[arg(long, default_value = "apply")]
    variant: PipelineVariant,

    /// Print the stage outputs as JSON instead of the console report
    #[arg(long)]
    json: bool,

    /// Only show listings from this platform
    #[arg(long)]
    platform: Option<String>,

    /// Only show listings requiring this experience level
    #[arg(long)]
    level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    info!("Starting OpenScout v{}", env!("CARGO_PKG_VERSION"));

    let mut stdout = io::stdout().lock();

    let resume_text = match load_resume(cli.resume).await {
        Ok(text) => text,
        Err(e) => {
            render_failure(&mut stdout, &e)?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let pipeline = Pipeline::from_config(&config, cli.variant)?;

    let outcome = tokio::select! {
        outcome = pipeline.run(&resume_text) => outcome,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; run aborted");
            writeln!(stdout, "Run aborted.")?;
            return Ok(ExitCode::from(130));
        }
    };

    match outcome {
        Ok(result) if cli.json => render_json(&mut stdout, &result)?,
        Ok(result) => {
            let filter = ListingFilter {
                platform: cli.platform,
                level: cli.level,
            };
            render_report(&mut stdout, &result, &filter)?;
        }
        Err(e) => {
            render_failure(&mut stdout, &e)?;
            return Ok(ExitCode::FAILURE);
        }
    }

    stdout.flush()?;
    Ok(ExitCode::SUCCESS)
}
