//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use headsup_crypto::CardIndex;

use crate::{
    error::{GameError, GameResult},
    poker_state::{GamePhase, POKER_HOLDEM_COMMUNITY_CARDS},
};

/// Community positions revealed so far this hand.
#[derive(Clone, Debug, Default)]
pub struct CommunityDealer {
    dealt: Vec<CardIndex>,
}

impl CommunityDealer {
    pub fn dealt(&self) -> &[CardIndex] {
        &self.dealt
    }

    pub fn dealt_count(&self) -> usize {
        self.dealt.len()
    }

    /// Reveals the batch for `phase` from the front of `undealt`.
    pub fn deal(&mut self, phase: GamePhase, undealt: &[CardIndex]) -> GameResult<&[CardIndex]> {
        let Some(count) = phase.batch_size() else {
            return Err(GameError::WrongPhase(phase));
        };

        let start = self.dealt.len();
        if start + count > POKER_HOLDEM_COMMUNITY_CARDS {
            return Err(GameError::WrongPhase(phase));
        }

        let batch: Vec<CardIndex> = undealt
            .iter()
            .filter(|p| !self.dealt.contains(*p))
            .take(count)
            .copied()
            .collect();
        if batch.len() != count {
            return Err(GameError::InvalidDeck("not enough undealt cards"));
        }

        self.dealt.extend(batch);
        Ok(&self.dealt[start..])
    }
}
