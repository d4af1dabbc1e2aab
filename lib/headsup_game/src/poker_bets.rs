//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use alloy_primitives::U256;

use crate::{
    error::{GameError, GameResult},
    poker_registry::Role,
};

/// Bets of the street currently being played.
#[derive(Clone, Debug)]
pub struct BettingRound {
    current_round_bets: [Option<U256>; 2],
    current_bet: U256,
    to_act: Role,
}

impl Default for BettingRound {
    fn default() -> Self {
        Self {
            current_round_bets: [None, None],
            current_bet: U256::ZERO,
            to_act: Role::Second,
        }
    }
}

impl BettingRound {
    pub const fn current_bet(&self) -> U256 {
        self.current_bet
    }

    pub const fn to_act(&self) -> Role {
        self.to_act
    }

    pub fn round_bet(&self, role: Role) -> U256 {
        self.current_round_bets[role.seat()].unwrap_or_default()
    }

    pub fn call_amount_required(&self, role: Role) -> U256 {
        self.current_bet.saturating_sub(self.round_bet(role))
    }

    /// Checks the bet without recording it.
    /// amount = 0 is a Check, and only legal when nothing is owed.
    /// amount > 0 is a Call or Raise and must at least cover the call.
    pub fn validate(&self, role: Role, amount: U256) -> GameResult<()> {
        if self.to_act != role {
            return Err(GameError::WrongPlayer { expected: self.to_act });
        }
        let required = self.call_amount_required(role);
        if amount < required {
            return Err(GameError::InvalidBet {
                required: self.current_bet,
                got: self.round_bet(role).saturating_add(amount),
            });
        }
        Ok(())
    }

    /// Records a validated bet, hands the turn over and tells whether the
    /// street is settled.
    pub fn record(&mut self, role: Role, amount: U256) -> bool {
        let total = self.round_bet(role) + amount;
        self.current_round_bets[role.seat()] = Some(total);
        if total > self.current_bet {
            self.current_bet = total;
        }
        self.to_act = role.opponent();
        self.is_betting_round_complete()
    }

    /// Complete once both players acted and their street totals match.
    pub fn is_betting_round_complete(&self) -> bool {
        match self.current_round_bets {
            [Some(first), Some(second)] => first == second,
            _ => false,
        }
    }

    /// Resets the street-level tracking for the next round (Flop, Turn, River)
    pub fn next_street(&mut self) {
        *self = Self::default();
    }
}
