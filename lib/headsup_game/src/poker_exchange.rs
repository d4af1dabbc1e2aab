//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use alloy_primitives::B256;
use headsup_crypto::{CardIndex, DECK_SIZE, EncryptedCard, hash_cards};
use itertools::Itertools;

use crate::{
    error::{GameError, GameResult},
    poker_audit::HandTranscript,
    poker_registry::Role,
};

pub const HOLE_CARDS: usize = 2;

/// Two deck positions owned by one player and the current value of each.
/// Earlier values are kept for the showdown audit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoleCards {
    positions: [CardIndex; HOLE_CARDS],
    cards: [EncryptedCard; HOLE_CARDS],
    earlier: Vec<[EncryptedCard; HOLE_CARDS]>,
}

impl HoleCards {
    pub const fn positions(&self) -> &[CardIndex; HOLE_CARDS] {
        &self.positions
    }

    pub const fn cards(&self) -> &[EncryptedCard; HOLE_CARDS] {
        &self.cards
    }

    /// Values as claimed (0) and after each later transform.
    pub fn stage(&self, index: usize) -> Option<&[EncryptedCard; HOLE_CARDS]> {
        match index.cmp(&self.earlier.len()) {
            std::cmp::Ordering::Less => self.earlier.get(index),
            std::cmp::Ordering::Equal => Some(&self.cards),
            std::cmp::Ordering::Greater => None,
        }
    }

    fn contains(&self, position: CardIndex) -> bool {
        self.positions.contains(&position)
    }
}

/// Deck state of the encrypt/select/decrypt exchange for one hand.
///
/// Hole values never flow back into the public deck: the deck keeps the
/// value a hole position had when it was claimed, and the hole selection
/// carries every later layer change.
#[derive(Clone, Debug, Default)]
pub struct DeckExchange {
    deck: Vec<EncryptedCard>,
    committed: Vec<EncryptedCard>,
    sorted: Vec<EncryptedCard>,
    first_hole: Option<HoleCards>,
    second_hole: Option<HoleCards>,
}

impl DeckExchange {
    pub fn deck(&self) -> &[EncryptedCard] {
        &self.deck
    }

    /// First player's deck as submitted in stage 1.
    pub fn committed(&self) -> &[EncryptedCard] {
        &self.committed
    }

    /// The deck right after Second player's re-ordering.
    pub fn sorted(&self) -> &[EncryptedCard] {
        &self.sorted
    }

    pub fn hole(&self, role: Role) -> Option<&HoleCards> {
        match role {
            Role::First => self.first_hole.as_ref(),
            Role::Second => self.second_hole.as_ref(),
        }
    }

    pub fn is_hole(&self, position: CardIndex) -> bool {
        self.first_hole.iter().chain(&self.second_hole).any(|h| h.contains(position))
    }

    /// Positions not held as hole cards, in deck order.
    pub fn undealt_positions(&self) -> Vec<CardIndex> {
        (0..self.deck.len()).filter(|p| !self.is_hole(*p)).collect()
    }

    pub fn card(&self, position: CardIndex) -> Option<&EncryptedCard> {
        self.deck.get(position)
    }

    /// First player's fully encrypted deck, opening the exchange.
    pub fn commit_deck(&mut self, deck: Vec<EncryptedCard>) -> GameResult<B256> {
        check_deck_len(&deck)?;
        check_distinct(deck.iter())?;
        let commitment = hash_cards(&deck);
        self.committed = deck.clone();
        self.deck = deck;
        self.sorted.clear();
        self.first_hole = None;
        self.second_hole = None;
        Ok(commitment)
    }

    /// Claims two still-encrypted positions for `role`. The claimed cards
    /// start out with the values currently in the deck unless the claimant
    /// supplies re-encrypted ones.
    pub fn claim(
        &mut self,
        role: Role,
        positions: [CardIndex; HOLE_CARDS],
        cards: Option<Vec<EncryptedCard>>,
    ) -> GameResult<()> {
        if self.hole(role).is_some() {
            return Err(GameError::InvalidSelection("cards already selected"));
        }

        let [a, b] = positions;
        if a >= self.deck.len() || b >= self.deck.len() {
            return Err(GameError::InvalidSelection("position out of range"));
        }
        if a == b {
            return Err(GameError::InvalidSelection("duplicate position"));
        }
        if self.is_hole(a) || self.is_hole(b) {
            return Err(GameError::InvalidSelection("position already owned"));
        }

        let cards = match cards {
            Some(cards) => check_hole_len(cards)?,
            None => [self.deck[a].clone(), self.deck[b].clone()],
        };

        let hole = Some(HoleCards {
            positions,
            cards,
            earlier: vec![],
        });
        match role {
            Role::First => self.first_hole = hole,
            Role::Second => self.second_hole = hole,
        }
        Ok(())
    }

    /// Replaces the values of `role`'s hole cards after a layer was peeled.
    pub fn update_hole(&mut self, role: Role, cards: Vec<EncryptedCard>) -> GameResult<()> {
        let cards = check_hole_len(cards)?;
        let hole = match role {
            Role::First => self.first_hole.as_mut(),
            Role::Second => self.second_hole.as_mut(),
        };
        let Some(hole) = hole else {
            return Err(GameError::InvalidSelection("no cards selected"));
        };
        let old = std::mem::replace(&mut hole.cards, cards);
        hole.earlier.push(old);
        Ok(())
    }

    /// Second player's re-ordering of the undealt cards. Only a permutation
    /// of the current undealt values is accepted; hole positions are ignored.
    pub fn sort_remaining(&mut self, deck: Vec<EncryptedCard>) -> GameResult<B256> {
        check_deck_len(&deck)?;
        let undealt = self.undealt_positions();

        let mut before: Vec<&EncryptedCard> = undealt.iter().map(|p| &self.deck[*p]).collect();
        let mut after: Vec<&EncryptedCard> = undealt.iter().map(|p| &deck[*p]).collect();
        before.sort();
        after.sort();
        if before != after {
            return Err(GameError::InvalidDeck(
                "sorted deck is not a permutation of the undealt cards",
            ));
        }

        let commitment = self.overwrite_undealt(&undealt, deck);
        self.sorted = self.deck.clone();
        Ok(commitment)
    }

    /// Second player's final encryption pass over the undealt cards. Whether
    /// the pass really is a masked shuffle is only known once keys are
    /// revealed; here the cards just have to stay distinct.
    pub fn encrypt_remaining(&mut self, deck: Vec<EncryptedCard>) -> GameResult<B256> {
        check_deck_len(&deck)?;
        let undealt = self.undealt_positions();
        check_distinct(undealt.iter().map(|p| &deck[*p]))?;
        Ok(self.overwrite_undealt(&undealt, deck))
    }

    /// Record of the hand for the showdown audit.
    pub fn transcript<'a>(&'a self, community: &'a [CardIndex]) -> GameResult<HandTranscript<'a>> {
        let (Some(first_hole), Some(second_hole)) = (&self.first_hole, &self.second_hole) else {
            return Err(GameError::InvalidSelection("no cards selected"));
        };
        Ok(HandTranscript {
            committed: &self.committed,
            sorted: &self.sorted,
            encrypted: &self.deck,
            first_hole,
            second_hole,
            undealt: self.undealt_positions(),
            community,
        })
    }

    fn overwrite_undealt(&mut self, undealt: &[CardIndex], mut deck: Vec<EncryptedCard>) -> B256 {
        for p in undealt {
            self.deck[*p] = std::mem::take(&mut deck[*p]);
        }
        hash_cards(&self.deck)
    }
}

fn check_deck_len(deck: &[EncryptedCard]) -> GameResult<()> {
    if deck.len() != DECK_SIZE {
        return Err(GameError::InvalidDeck("deck must hold exactly 52 cards"));
    }
    Ok(())
}

fn check_distinct<'a>(mut cards: impl Iterator<Item = &'a EncryptedCard>) -> GameResult<()> {
    if !cards.all_unique() {
        return Err(GameError::InvalidDeck("deck holds the same card twice"));
    }
    Ok(())
}

fn check_hole_len(cards: Vec<EncryptedCard>) -> GameResult<[EncryptedCard; HOLE_CARDS]> {
    cards
        .try_into()
        .map_err(|_| GameError::InvalidSelection("exactly 2 cards required"))
}
