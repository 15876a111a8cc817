//! CLI argument parsing using clap.
//!
//! Contains the Cli struct and the Commands enum.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Java API recommendation from natural-language queries
#[derive(Parser, Debug)]
#[command(
    name = "apirec",
    version = env!("CARGO_PKG_VERSION"),
    about = "Recommend Java APIs for a natural-language task description",
    long_about = "Rank a precomputed question corpus against a query and derive a \
                  deduplicated list of the APIs its best matches use.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Examples:\n  apirec init\n  apirec recommend \"read a file line by line\" -k 5\n  apirec top-question \"convert a String to an int\"\n  apirec batch queries.txt --workers 4 > results.jsonl\n  apirec evaluate biker.jsonl --ks 1,3,5"
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Show detailed loading information
    #[arg(long, global = true)]
    pub info: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .apirec directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from .apirec/settings.toml")]
    Config,

    /// Recommend APIs for one query
    #[command(about = "Recommend APIs for a natural-language query")]
    Recommend {
        /// The task description
        query: String,

        /// Number of APIs to return (defaults to retrieval.default_k)
        #[arg(short, long)]
        k: Option<usize>,

        /// Keep only APIs documented in this registry (JSON Lines of {name, description})
        #[arg(long, value_name = "FILE")]
        registry: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the single best-matching corpus question
    #[command(name = "top-question", about = "Show the best-matching corpus question")]
    TopQuestion {
        /// The task description
        query: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Recommend APIs for every line of a file
    #[command(about = "Recommend APIs for many queries, one per line; writes JSON Lines")]
    Batch {
        /// File with one query per line
        file: PathBuf,

        /// Number of APIs per query (defaults to retrieval.default_k)
        #[arg(short, long)]
        k: Option<usize>,

        /// Worker threads (overrides workers.pool_size)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Hide the progress bar
        #[arg(long)]
        quiet: bool,
    },

    /// Measure recommendation quality on a labeled benchmark
    #[command(about = "Compute MRR, MAP and success rate against a benchmark")]
    Evaluate {
        /// JSON Lines benchmark of {query, answers}
        benchmark: PathBuf,

        /// Cutoffs for SuccessRate@k
        #[arg(long, value_delimiter = ',', default_value = "1,3,5")]
        ks: Vec<usize>,

        /// Number of APIs predicted per query (defaults to retrieval.default_k)
        #[arg(short, long)]
        k: Option<usize>,

        /// Worker threads (overrides workers.pool_size)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
