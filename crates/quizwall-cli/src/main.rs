//! quizwall CLI — the learner-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "quizwall",
    version,
    about = "Self-paced multiple-choice quiz engine"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and sample pool
    Init,

    /// Validate pool JSON files
    Validate {
        /// Path to a pool file or a directory of pools
        #[arg(long)]
        pool: PathBuf,
    },

    /// Take an attempt at a module
    Take {
        /// Module id (e.g. "01")
        #[arg(long)]
        module: String,

        /// Reuse a specific seed instead of a fresh one
        #[arg(long)]
        seed: Option<u32>,
    },

    /// Show per-module progress and course totals
    Status,

    /// List the questions answered correctly least often
    Difficulty {
        /// Ignore questions seen fewer times than this
        #[arg(long, default_value = "2")]
        min_exposures: u32,

        /// Maximum rows to show
        #[arg(long, default_value = "8")]
        limit: usize,
    },

    /// Re-derive a recorded attempt from its seed and show the answers
    Replay {
        /// Module id
        #[arg(long)]
        module: String,

        /// Attempt number, starting at 1
        #[arg(long)]
        attempt: usize,
    },

    /// Export progress as JSON
    Export {
        /// Export a single module
        #[arg(long, conflicts_with = "final_review")]
        module: Option<String>,

        /// Export the final review (requires every module completed)
        #[arg(long = "final")]
        final_review: bool,

        /// Output directory
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },

    /// Replace stored progress with an exported snapshot
    Import {
        /// Snapshot file produced by `quizwall export`
        file: PathBuf,

        /// Import snapshots from another course without asking
        #[arg(long)]
        yes: bool,
    },

    /// Erase stored progress
    Reset {
        /// Reset only this module
        #[arg(long)]
        module: Option<String>,

        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { pool } => commands::validate::execute(pool),
        Commands::Take { module, seed } => commands::take::execute(config, module, seed).await,
        Commands::Status => commands::status::execute(config),
        Commands::Difficulty {
            min_exposures,
            limit,
        } => commands::difficulty::execute(config, min_exposures, limit),
        Commands::Replay { module, attempt } => {
            commands::replay::execute(config, module, attempt).await
        }
        Commands::Export {
            module,
            final_review,
            output,
        } => commands::export::execute(config, module, final_review, output),
        Commands::Import { file, yes } => commands::import::execute(config, file, yes),
        Commands::Reset { module, yes } => commands::reset::execute(config, module, yes),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
