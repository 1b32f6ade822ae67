//! tictac_server - relay server and terminal play.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use std::path::PathBuf;
use tictac_game::{DecisionEngine, Tier};
use tictac_server::{FirstPlayer, Notification, ServerConfig, SoloMatch};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, host, port } => run_server(config, host, port).await,
        Command::Solo {
            name,
            tier,
            engine_first,
            seed,
        } => run_solo(name, tier, engine_first, seed).await,
    }
}

/// Run the WebSocket relay
async fn run_server(
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let config = match config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    }
    .with_overrides(host, port);

    let fallback = config
        .log_filter()
        .clone()
        .unwrap_or_else(|| "info,tictac_server=debug".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();

    info!(address = %config.bind_address(), "Starting tictac relay");
    tictac_server::serve(&config).await?;
    Ok(())
}

/// Run a terminal game against the engine
#[instrument(skip(name))]
async fn run_solo(
    name: String,
    tier: Tier,
    engine_first: bool,
    seed: Option<u64>,
) -> Result<()> {
    // Logs go to stderr so they don't interleave with the board
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let engine = seed.map_or_else(DecisionEngine::new, DecisionEngine::with_seed);
    let first = if engine_first {
        FirstPlayer::Engine
    } else {
        FirstPlayer::Human
    };
    let mut solo = SoloMatch::new(&name, tier, first, engine, Box::new(tx))?;

    println!(
        "You play {} against the {} engine. {} moves first.",
        solo.human_mark(),
        tier,
        first.label()
    );
    render(&mut rx);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        let result = match input {
            "q" | "quit" => {
                solo.leave();
                break;
            }
            "r" | "rematch" => solo.rematch(),
            _ => match input.parse::<usize>() {
                Ok(cell) => solo.play(cell),
                Err(_) => {
                    println!("Enter a cell 0-8, r for a rematch or q to quit.");
                    continue;
                }
            },
        };
        if let Err(e) = result {
            println!("{}", e);
        }
        render(&mut rx);
    }

    Ok(())
}

fn render(rx: &mut mpsc::UnboundedReceiver<Notification>) {
    while let Ok(notification) = rx.try_recv() {
        match notification {
            Notification::GameStart {
                board,
                turn,
                generation,
                ..
            } => {
                println!("\nGame {}\n{}", generation, board.display());
                println!("{} to move.", turn);
            }
            Notification::StateUpdate {
                cell,
                mark,
                board,
                turn,
                result,
                ..
            } => {
                println!("\n{} takes {}\n{}", mark, cell, board.display());
                match result {
                    Some(outcome) => {
                        println!("{}. Type r for a rematch or q to quit.", outcome)
                    }
                    None => println!("{} to move.", turn),
                }
            }
            Notification::Error { message, .. } => println!("{}", message),
            Notification::OpponentLeft => println!("The match is over."),
            Notification::SessionCreated { .. } | Notification::SessionJoined { .. } => {}
        }
    }
}
