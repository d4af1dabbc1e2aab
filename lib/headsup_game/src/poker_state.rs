//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::poker_registry::Role;

pub const POKER_HOLDEM_FLOP_CARDS: usize = 3;
pub const POKER_HOLDEM_TURN_CARDS: usize = 1;
pub const POKER_HOLDEM_RIVER_CARDS: usize = 1;
pub const POKER_HOLDEM_COMMUNITY_CARDS: usize = 5;

/// Phase of one hand. Discriminants are the stable external codes.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    Joining = 0,
    CommitPhase = 1,
    SecondPlayerCardSelection = 2,
    FirstPlayerDecryption = 3,
    SecondPlayerCardEncryption = 4,
    FirstPlayerCardDecryption = 5,
    SecondPlayerOwnCardSelection = 6,
    SecondPlayerDeckSort = 7,
    DeckEncryption = 8,
    PreFlopBetting = 9,
    FlopDealing = 10,
    FlopBetting = 11,
    TurnDealing = 12,
    TurnBetting = 13,
    RiverDealing = 14,
    RiverBetting = 15,
    Showdown = 16,
}

impl GamePhase {
    pub const ALL: [GamePhase; 17] = [
        GamePhase::Joining,
        GamePhase::CommitPhase,
        GamePhase::SecondPlayerCardSelection,
        GamePhase::FirstPlayerDecryption,
        GamePhase::SecondPlayerCardEncryption,
        GamePhase::FirstPlayerCardDecryption,
        GamePhase::SecondPlayerOwnCardSelection,
        GamePhase::SecondPlayerDeckSort,
        GamePhase::DeckEncryption,
        GamePhase::PreFlopBetting,
        GamePhase::FlopDealing,
        GamePhase::FlopBetting,
        GamePhase::TurnDealing,
        GamePhase::TurnBetting,
        GamePhase::RiverDealing,
        GamePhase::RiverBetting,
        GamePhase::Showdown,
    ];

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        if (code as usize) < Self::ALL.len() {
            Some(Self::ALL[code as usize])
        } else {
            None
        }
    }

    /// Linear successor. Showdown loops back to Joining.
    pub const fn next(self) -> Self {
        match self {
            GamePhase::Joining => GamePhase::CommitPhase,
            GamePhase::CommitPhase => GamePhase::SecondPlayerCardSelection,
            GamePhase::SecondPlayerCardSelection => GamePhase::FirstPlayerDecryption,
            GamePhase::FirstPlayerDecryption => GamePhase::SecondPlayerCardEncryption,
            GamePhase::SecondPlayerCardEncryption => GamePhase::FirstPlayerCardDecryption,
            GamePhase::FirstPlayerCardDecryption => GamePhase::SecondPlayerOwnCardSelection,
            GamePhase::SecondPlayerOwnCardSelection => GamePhase::SecondPlayerDeckSort,
            GamePhase::SecondPlayerDeckSort => GamePhase::DeckEncryption,
            GamePhase::DeckEncryption => GamePhase::PreFlopBetting,
            GamePhase::PreFlopBetting => GamePhase::FlopDealing,
            GamePhase::FlopDealing => GamePhase::FlopBetting,
            GamePhase::FlopBetting => GamePhase::TurnDealing,
            GamePhase::TurnDealing => GamePhase::TurnBetting,
            GamePhase::TurnBetting => GamePhase::RiverDealing,
            GamePhase::RiverDealing => GamePhase::RiverBetting,
            GamePhase::RiverBetting => GamePhase::Showdown,
            GamePhase::Showdown => GamePhase::Joining,
        }
    }

    pub const fn is_betting(self) -> bool {
        matches!(
            self,
            GamePhase::PreFlopBetting
                | GamePhase::FlopBetting
                | GamePhase::TurnBetting
                | GamePhase::RiverBetting
        )
    }

    pub const fn is_dealing(self) -> bool {
        matches!(
            self,
            GamePhase::FlopDealing | GamePhase::TurnDealing | GamePhase::RiverDealing
        )
    }

    /// Community cards revealed when dealing in this phase.
    pub const fn batch_size(self) -> Option<usize> {
        match self {
            GamePhase::FlopDealing => Some(POKER_HOLDEM_FLOP_CARDS),
            GamePhase::TurnDealing => Some(POKER_HOLDEM_TURN_CARDS),
            GamePhase::RiverDealing => Some(POKER_HOLDEM_RIVER_CARDS),
            _ => None,
        }
    }

    /// Role that alone may drive the protocol or dealing step of this phase.
    /// Betting phases alternate turns and Showdown accepts either player,
    /// so they report `None`.
    pub const fn protocol_actor(self) -> Option<Role> {
        match self {
            GamePhase::CommitPhase
            | GamePhase::FirstPlayerDecryption
            | GamePhase::FirstPlayerCardDecryption
            | GamePhase::FlopDealing
            | GamePhase::TurnDealing
            | GamePhase::RiverDealing => Some(Role::First),
            GamePhase::SecondPlayerCardSelection
            | GamePhase::SecondPlayerCardEncryption
            | GamePhase::SecondPlayerOwnCardSelection
            | GamePhase::SecondPlayerDeckSort
            | GamePhase::DeckEncryption => Some(Role::Second),
            GamePhase::Joining
            | GamePhase::PreFlopBetting
            | GamePhase::FlopBetting
            | GamePhase::TurnBetting
            | GamePhase::RiverBetting
            | GamePhase::Showdown => None,
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}
