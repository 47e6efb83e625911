//! CLI argument definitions: top-level `Cli` struct and `Commands` enum.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "schimp")]
#[command(about = "Attacker-knowledge models for SCHIMP programs")]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Build the reachable attacker model and print it
    Explore {
        /// Program model (JSON)
        file: PathBuf,

        /// Step bound for the terminal distribution
        #[arg(long, default_value_t = 30)]
        horizon: u32,

        /// Abort after discovering this many states
        #[arg(long, default_value_t = 1_000_000)]
        max_states: usize,

        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// List the attacker's guesses in choice order
    Guesses {
        /// Program model (JSON)
        file: PathBuf,

        /// Print at most this many guesses
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Label the terminating configurations of the program model
    Terminals {
        /// Program model (JSON)
        file: PathBuf,

        /// Step bound for the terminal distribution
        #[arg(long, default_value_t = 30)]
        horizon: u32,

        /// Show literal observations instead of observation-set ids
        #[arg(long)]
        show_observations: bool,

        /// Output format: text | dot
        #[arg(long, default_value = "text")]
        format: String,
    },
}
