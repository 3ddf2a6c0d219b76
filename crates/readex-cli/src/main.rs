//! readex CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "readex", version, about = "Exam bank normalization and deterministic grading")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a passage bank file against the strict schema
    Validate {
        /// Path to a bank JSON file
        #[arg(long)]
        bank: PathBuf,
    },

    /// Show the exam set assembled for a seed
    Inspect {
        /// Seed controlling passage pick and choice order
        #[arg(long, default_value = "1")]
        seed: u64,

        /// Show the shuffled candidate view instead of bank order
        #[arg(long)]
        shuffled: bool,

        /// Include correct answers in the listing
        #[arg(long)]
        answers: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Grade a submitted answer file against a seeded exam set
    Grade {
        /// Answers JSON: {"question-id": "B"} or {"question-id": ["A","C"]}
        #[arg(long)]
        answers: PathBuf,

        /// Seed the attempt was created with
        #[arg(long, default_value = "1")]
        seed: u64,

        /// Time allotted, minutes
        #[arg(long, default_value = "20")]
        minutes: u32,

        /// Attempt mode: full, single
        #[arg(long, default_value = "full")]
        mode: String,

        /// Practiced question for single mode (1-9)
        #[arg(long, default_value = "1")]
        single_index: u32,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and sample bank files
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("readex=info".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Inspect {
            seed,
            shuffled,
            answers,
            config,
        } => commands::inspect::execute(seed, shuffled, answers, config),
        Commands::Grade {
            answers,
            seed,
            minutes,
            mode,
            single_index,
            format,
            config,
        } => commands::grade::execute(answers, seed, minutes, mode, single_index, format, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
