#![doc = include_str!("../README.md")]

mod cli;
mod commands;
mod program_model;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Explore {
            file,
            horizon,
            max_states,
            format,
        } => commands::explore::run_explore_command(&file, horizon, max_states, &format),
        Commands::Guesses { file, limit } => commands::guesses::run_guesses_command(&file, limit),
        Commands::Terminals {
            file,
            horizon,
            show_observations,
            format,
        } => commands::terminals::run_terminals_command(
            &file,
            horizon,
            show_observations,
            &format,
        ),
    }
}
