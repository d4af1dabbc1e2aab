//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use std::collections::HashMap;

use alloy_primitives::U256;

use crate::{
    error::{GameError, GameResult},
    poker_registry::PlayerId,
};

/// Escrowed stakes of the current hand plus winnings that outlive it.
///
/// Invariant: `pot` equals the sum of `committed` until the pot is paid out.
#[derive(Clone, Debug, Default)]
pub struct EscrowLedger {
    pot: U256,
    committed: HashMap<PlayerId, U256>,
    balances: HashMap<PlayerId, U256>,
}

impl EscrowLedger {
    pub const fn pot(&self) -> U256 {
        self.pot
    }

    pub fn committed(&self, id: &PlayerId) -> U256 {
        self.committed.get(id).copied().unwrap_or_default()
    }

    pub fn balance_of(&self, id: &PlayerId) -> U256 {
        self.balances.get(id).copied().unwrap_or_default()
    }

    /// Fails before mutating anything if either total would overflow.
    pub fn check_deposit(&self, id: &PlayerId, amount: U256) -> GameResult<()> {
        self.pot
            .checked_add(amount)
            .and(self.committed(id).checked_add(amount))
            .map(|_| ())
            .ok_or(GameError::AmountOverflow)
    }

    pub fn deposit(&mut self, id: PlayerId, amount: U256) -> GameResult<()> {
        self.check_deposit(&id, amount)?;
        self.pot += amount;
        *self.committed.entry(id).or_default() += amount;
        Ok(())
    }

    /// Whole pot to one player. Returns the amount paid.
    pub fn award(&mut self, winner: PlayerId) -> GameResult<U256> {
        let pot = self.pot;
        self.credit(winner, pot)?;
        self.pot = U256::ZERO;
        Ok(pot)
    }

    /// Halves the pot, the odd wei going to `first`.
    pub fn split(&mut self, first: PlayerId, second: PlayerId) -> GameResult<(U256, U256)> {
        let half = self.pot / U256::from(2);
        let first_share = self.pot - half;
        self.balance_of(&first)
            .checked_add(first_share)
            .and(self.balance_of(&second).checked_add(half))
            .ok_or(GameError::AmountOverflow)?;
        self.credit(first, first_share)?;
        self.credit(second, half)?;
        self.pot = U256::ZERO;
        Ok((first_share, half))
    }

    /// Returns a player's whole stake from the pot to its balance.
    pub fn refund(&mut self, id: PlayerId) -> GameResult<U256> {
        let stake = self.committed(&id);
        self.credit(id, stake)?;
        self.pot -= stake;
        self.committed.remove(&id);
        Ok(stake)
    }

    pub fn withdraw(&mut self, id: &PlayerId) -> GameResult<U256> {
        match self.balances.remove(id) {
            Some(amount) if !amount.is_zero() => Ok(amount),
            _ => Err(GameError::NothingToWithdraw),
        }
    }

    /// Forgets the stakes of a hand whose pot has been paid out.
    pub fn clear_hand(&mut self) {
        self.committed.clear();
        self.pot = U256::ZERO;
    }

    /// Funds held in total, pot plus withdrawable balances.
    pub fn total_escrowed(&self) -> U256 {
        self.balances
            .values()
            .fold(self.pot, |acc, b| acc.saturating_add(*b))
    }

    fn credit(&mut self, id: PlayerId, amount: U256) -> GameResult<()> {
        let balance = self
            .balance_of(&id)
            .checked_add(amount)
            .ok_or(GameError::AmountOverflow)?;
        if !balance.is_zero() {
            self.balances.insert(id, balance);
        }
        Ok(())
    }
}
