//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

pub mod config;
pub mod error;
pub mod poker_audit;
pub mod poker_bets;
pub mod poker_dealer;
pub mod poker_escrow;
pub mod poker_events;
pub mod poker_exchange;
pub mod poker_game;
pub mod poker_registry;
pub mod poker_showdown;
pub mod poker_state;

pub use alloy_primitives::{Address, U256};
pub use config::TableConfig;
pub use error::{GameError, GameResult};
pub use poker_audit::{AuditFailure, BlsAuditor, HandAuditor, HandTranscript};
pub use poker_events::GameEvent;
pub use poker_game::{Game, GameSnapshot};
pub use poker_registry::{PlayerId, PlayerSnapshot, Role};
pub use poker_showdown::{Settlement, ShowdownOracle, ShowdownOutcome, ShowdownView};
pub use poker_state::GamePhase;

#[cfg(test)]
pub mod tests;
