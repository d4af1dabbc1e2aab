//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

mod bot;
mod hand_rank;
mod oracle;
mod session;


use std::path::PathBuf;

use alloy_primitives::U256;
use anyhow::Context;
use clap::Parser;
use headsup_game::TableConfig;
use tracing_subscriber::EnvFilter;

use crate::session::{HandOutcome, Session};

#[derive(Debug, Parser)]
#[command(author, version, about = "Two bots playing heads-up mental poker", long_about = None)]
struct Args {
    /// Hands to play
    #[arg(long, default_value_t = 3)]
    hands: u64,

    /// Buy-in in wei, overrides the config file
    #[arg(long, env = "HEADSUP_BUY_IN_WEI")]
    buy_in_wei: Option<u128>,

    /// Seed for keys, shuffles and bets
    #[arg(long)]
    seed: Option<u64>,

    /// Table config as JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Raises per bot per street
    #[arg(long, default_value_t = 2)]
    max_raises: usize,
}

fn load_config(args: &Args) -> anyhow::Result<TableConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&text).context("Invalid table config")?
        }
        None => TableConfig::default(),
    };
    if let Some(wei) = args.buy_in_wei {
        config.buy_in = U256::from(wei);
    }
    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!("Buy-in {} wei, seed {}", config.buy_in, seed);

    let mut session = Session::new(config, seed, args.max_raises)?;
    for _ in 0..args.hands {
        let summary = session.play_hand()?;
        match summary.outcome {
            HandOutcome::Folded { winner } => {
                tracing::info!("{} player wins {} on a fold", winner, summary.pot)
            }
            HandOutcome::Showdown(outcome) => {
                tracing::info!("Showdown {:?}, pot {}", outcome, summary.pot)
            }
            HandOutcome::Forfeited { cheater } => {
                tracing::warn!("{} player caught cheating, forfeits {}", cheater, summary.pot)
            }
        }
    }

    let paid = session.cash_out()?;
    let totals = session
        .bots()
        .iter()
        .zip(paid)
        .map(|(bot, amount)| serde_json::json!({ "name": bot.name(), "identity": bot.identity(), "withdrawn": amount }))
        .collect::<Vec<_>>();
    println!("{}", serde_json::to_string_pretty(&totals)?);
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cfg!(feature = "pure_output") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(false)
            .without_time()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();

    if let Err(err) = run(&args) {
        tracing::error!("Error: {:#}", err);
        return Err(err);
    }
    Ok(())
}
