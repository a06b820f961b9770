use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use podium::config::Config;
use podium::parser::parse_workbook;
use podium::server::PodiumServer;

#[derive(Parser)]
#[command(
    name = "podium",
    version,
    about = "Live results distribution server for skating competitions",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the results server
    Serve {
        /// Bind address, overriding PODIUM_BIND_ADDRESS
        #[arg(short, long)]
        bind: Option<std::net::SocketAddr>,

        /// Default result source (URL or file path)
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Parse a local results workbook and print what the operator
    /// console would receive
    Parse {
        /// Path to the workbook
        file: std::path::PathBuf,

        /// Print the full competitor list as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    match cli.command {
        Commands::Serve { bind, source } => {
            let mut config = Config::from_env()?;
            if let Some(bind) = bind {
                config.server.bind_address = bind;
            }
            if let Some(source) = source {
                config.source.default_source = Some(source);
            }

            tracing::info!(
                bind = %config.server.bind_address,
                source = ?config.source.default_source,
                "Podium results server starting"
            );

            let server = PodiumServer::new(config)?;
            server
                .start_with_shutdown(shutdown_signal())
                .await
                .context("server terminated with an error")?;
        }

        Commands::Parse { file, json } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("could not read {}", file.display()))?;
            let results = parse_workbook(&bytes)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                println!(
                    "{} / {}: {} competitors",
                    results.discipline.as_deref().unwrap_or("-"),
                    results.category.as_deref().unwrap_or("-"),
                    results.competitors.len()
                );
                for competitor in &results.competitors {
                    let marker = if competitor.last_performed { " *" } else { "" };
                    println!(
                        "  {:>3}  {}  [{} {} {}]{}",
                        competitor.rank,
                        competitor.name,
                        competitor.judge1,
                        competitor.judge2,
                        competitor.judge3,
                        marker
                    );
                }
            }
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("podium=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("podium=info,warn"))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
