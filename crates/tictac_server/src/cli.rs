//! Command-line interface for tictac_server.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tictac_game::Tier;

/// Tic-tac-toe session relay and local play
#[derive(Parser, Debug)]
#[command(name = "tictac_server")]
#[command(about = "Two-player tic-tac-toe sessions over WebSocket", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the WebSocket relay
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Play against the decision engine in the terminal
    Solo {
        /// Your display name
        #[arg(short, long, default_value = "")]
        name: String,

        /// Engine strength: weak, medium, strong or perfect
        #[arg(short, long, default_value_t = Tier::Perfect)]
        tier: Tier,

        /// Let the engine play X and move first
        #[arg(long)]
        engine_first: bool,

        /// Seed for a reproducible engine
        #[arg(long)]
        seed: Option<u64>,
    },
}
