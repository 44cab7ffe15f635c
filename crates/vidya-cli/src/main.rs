mod config;
mod generate_cmd;
mod search_cmd;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use vidya_core::Pipeline;

use config::{CliOverrides, VidyaConfig};

#[derive(Parser)]
#[command(name = "vidya", about = "CBSE lesson plan generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a vidya config file
    Init {
        /// Gemini API key to store in the config file
        #[arg(long)]
        api_key: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Run the HTTP API server
    Serve {
        /// Address to bind (overrides VIDYA_BIND)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides VIDYA_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Generate one lesson plan and print it as JSON
    Generate {
        /// The teacher's request
        prompt: String,
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<String>,
    },
    /// Run only the curriculum search stage and print its result
    Search {
        /// The teacher's request
        prompt: String,
    },
}

/// Execute the `vidya init` command: write config file.
fn cmd_init(api_key: Option<String>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let has_key = api_key.is_some();
    let cfg = config::ConfigFile {
        gemini: config::GeminiSection {
            api_key,
            ..Default::default()
        },
        server: config::ServerSection {
            bind: Some(config::DEFAULT_BIND.to_string()),
            port: Some(config::DEFAULT_PORT),
            request_timeout_secs: Some(config::DEFAULT_REQUEST_TIMEOUT_SECS),
        },
        ..Default::default()
    };

    let path = config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    if has_key {
        println!("  gemini.api_key = <set>");
    } else {
        println!("  gemini.api_key not set; export VIDYA_GEMINI_API_KEY or rerun with --api-key.");
    }
    println!("  server = {}:{}", config::DEFAULT_BIND, config::DEFAULT_PORT);
    println!();
    println!("Next: run `vidya serve` to start the API.");

    Ok(())
}

/// A token cancelled on Ctrl+C, for one-shot commands.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; cancelling");
            trigger.cancel();
        }
    });
    cancel
}

fn build_pipeline(resolved: &VidyaConfig) -> anyhow::Result<Pipeline> {
    Pipeline::from_config(&resolved.pipeline).context("failed to build pipeline")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // A missing .env is normal.
    match dotenvy::dotenv() {
        Err(e) if !e.not_found() => tracing::warn!(error = %e, "failed to load .env file"),
        _ => {}
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { api_key, force } => {
            cmd_init(api_key, force)?;
        }
        Commands::Serve { bind, port } => {
            let resolved = VidyaConfig::resolve(&CliOverrides {
                bind: bind.as_deref(),
                port,
            })?;
            let pipeline = build_pipeline(&resolved)?;
            serve_cmd::run_serve(pipeline, &resolved.server).await?;
        }
        Commands::Generate { prompt, output } => {
            let resolved = VidyaConfig::resolve(&CliOverrides::default())?;
            let pipeline = build_pipeline(&resolved)?;
            let cancel = cancel_on_ctrl_c();
            generate_cmd::run_generate(&pipeline, &prompt, output.as_deref(), &cancel).await?;
        }
        Commands::Search { prompt } => {
            let resolved = VidyaConfig::resolve(&CliOverrides::default())?;
            let pipeline = build_pipeline(&resolved)?;
            let cancel = cancel_on_ctrl_c();
            search_cmd::run_search(&pipeline, &prompt, &cancel).await?;
        }
    }

    Ok(())
}
