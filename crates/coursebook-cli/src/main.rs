//! coursebook CLI: interactive front end for the course registry.

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use coursebook_core::config::load_config_from;

mod commands;

#[derive(Parser)]
#[command(
    name = "coursebook",
    version,
    about = "In-memory course, enrollment, and grade registry"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive menu (default)
    Menu {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter coursebook.toml
    Init,

    /// Print the effective configuration
    Config {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },
}

/// `RUST_LOG` wins when set; otherwise the config's level applies to the
/// coursebook crates, and an unparsable level falls back to warnings only.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(format!("coursebook={level}"))
            .unwrap_or_else(|_| EnvFilter::new("coursebook=warn"))
    });

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Commands::Menu { config: None }) {
        Commands::Menu { config } => {
            let config = load_config_from(config.as_deref())?;
            init_logging(&config.log_level);
            commands::menu::execute(&config)
        }
        Commands::Init => {
            init_logging("warn");
            commands::init::execute()
        }
        Commands::Config { config, format } => {
            let config = load_config_from(config.as_deref())?;
            init_logging(&config.log_level);
            commands::config::execute(&config, &format)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
