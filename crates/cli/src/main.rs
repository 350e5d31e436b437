use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use delivery_guard_core::{Settings, API_KEY_VARS};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "delivery-guard")]
#[command(about = "Delivery risk and effort analysis for business requirements", long_about = None)]
struct Cli {
    /// History document location (overrides DELIVERY_GUARD_HISTORY_PATH)
    #[arg(long, global = true)]
    history: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an analysis and print the stored result
    Analyze {
        #[arg(short, long, required_unless_present = "requirements_file")]
        requirements: Option<String>,
        #[arg(long, conflicts_with = "requirements")]
        requirements_file: Option<PathBuf>,
        #[arg(short, long, default_value = "")]
        timelines: String,
        #[arg(short, long, default_value = "")]
        constraints: String,
    },
    /// List stored analyses, most recent first
    History {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Print a stored analysis
    Show { id: String },
    /// Print configuration and history size
    Status,
}

fn settings(history: Option<PathBuf>) -> Settings {
    let settings = Settings::from_env();
    match history {
        Some(path) => settings.with_history_path(path),
        None => settings,
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    let settings = settings(cli.history);

    if !settings.has_credential() {
        eprintln!(
            "WARNING: API key is missing. Set {} to enable analyses.",
            API_KEY_VARS.join(" or ")
        );
    }

    match cli.command {
        Commands::Analyze { requirements, requirements_file, timelines, constraints } => {
            let requirements = match (requirements, requirements_file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)?,
                (None, None) => String::new(),
            };
            commands::analyze::run(&settings, requirements, timelines, constraints).await
        },
        Commands::History { limit } => commands::history::run_history(&settings, limit),
        Commands::Show { id } => commands::history::run_show(&settings, &id),
        Commands::Status => commands::status::run(&settings),
    }
}
