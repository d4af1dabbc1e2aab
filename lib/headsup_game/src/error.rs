//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use alloy_primitives::U256;
use thiserror::Error;

use crate::{poker_registry::Role, poker_state::GamePhase};

/// Every rejected action. A failed action never leaves partial state behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Must send exact buy-in amount: expected {expected}, got {got}")]
    InvalidStake { expected: U256, got: U256 },

    #[error("Already in game")]
    AlreadySeated,

    #[error("Table is full")]
    TableFull,

    #[error("Action not allowed in phase {0}")]
    WrongPhase(GamePhase),

    #[error("Not {expected} player")]
    WrongPlayer { expected: Role },

    #[error("Bet too small: {required} required, got {got}")]
    InvalidBet { required: U256, got: U256 },

    #[error("Invalid card selection: {0}")]
    InvalidSelection(&'static str),

    #[error("Invalid deck: {0}")]
    InvalidDeck(&'static str),

    #[error("Cards must be decrypted for {expected} player")]
    WrongTarget { expected: Role },

    #[error("Not in game")]
    NotSeated,

    #[error("Nothing to withdraw")]
    NothingToWithdraw,

    #[error("Amount overflow")]
    AmountOverflow,

    #[error("Invalid table config: {0}")]
    InvalidConfig(&'static str),

    #[error("Hand key already revealed")]
    KeyAlreadyRevealed,

    #[error("Showdown oracle failed: {0}")]
    Oracle(String),
}

impl GameError {
    /// Stable machine readable reason.
    pub const fn code(&self) -> &'static str {
        match self {
            GameError::InvalidStake { .. } => "INVALID_STAKE",
            GameError::AlreadySeated => "ALREADY_SEATED",
            GameError::TableFull => "TABLE_FULL",
            GameError::WrongPhase(_) => "WRONG_PHASE",
            GameError::WrongPlayer { .. } => "WRONG_PLAYER",
            GameError::InvalidBet { .. } => "INVALID_BET",
            GameError::InvalidSelection(_) => "INVALID_SELECTION",
            GameError::InvalidDeck(_) => "INVALID_DECK",
            GameError::WrongTarget { .. } => "WRONG_TARGET",
            GameError::NotSeated => "NOT_SEATED",
            GameError::NothingToWithdraw => "NOTHING_TO_WITHDRAW",
            GameError::AmountOverflow => "AMOUNT_OVERFLOW",
            GameError::InvalidConfig(_) => "INVALID_CONFIG",
            GameError::KeyAlreadyRevealed => "KEY_ALREADY_REVEALED",
            GameError::Oracle(_) => "ORACLE_FAILED",
        }
    }
}

pub type GameResult<T> = Result<T, GameError>;
