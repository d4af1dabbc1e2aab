//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use pairing::group::Curve;

use crate::{
    card::{CardIndex, EncryptedCard},
    error::CipherError,
    hash_to_curve::hash_to_curve,
    types::CardPoint,
};

const RANKS: &[u8; 13] = b"23456789TJQKA";
const SUITS: &[u8; 4] = b"shdc";

/// The plaintext 52 card deck, every card hashed onto G1.
///
/// Card index `i` has rank `RANKS[i / 4]` and suit `SUITS[i % 4]`.
#[derive(Clone, Debug)]
pub struct CardDeck {
    labels: Vec<String>,
    points: Vec<CardPoint>,
}

impl CardDeck {
    pub fn new() -> Self {
        let labels: Vec<String> = RANKS
            .iter()
            .flat_map(|rank| SUITS.iter().map(move |suit| [*rank, *suit]))
            .map(|pair| String::from_utf8_lossy(&pair).into_owned())
            .collect();

        let points = labels
            .iter()
            .map(|label| hash_to_curve(label.as_bytes()).to_affine())
            .collect();

        Self { labels, points }
    }

    pub fn label(&self, index: CardIndex) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn point(&self, index: CardIndex) -> Option<CardPoint> {
        self.points.get(index).copied()
    }

    /// Plain cards in index order, ready for the first masking pass.
    pub fn cards(&self) -> Vec<EncryptedCard> {
        self.points.iter().map(EncryptedCard::from_point).collect()
    }

    pub fn find_point(&self, point: &CardPoint) -> Option<CardIndex> {
        self.points.iter().position(|p| p == point)
    }

    /// Looks up a card whose every layer has been removed. Returns `Ok(None)`
    /// for a valid point that is still masked.
    pub fn find_card(&self, card: &EncryptedCard) -> Result<Option<CardIndex>, CipherError> {
        let point = card.to_point()?;
        Ok(self.find_point(&point))
    }
}

impl Default for CardDeck {
    fn default() -> Self {
        Self::new()
    }
}

/// Rank value 2..=14 of a card index, aces high.
pub const fn card_rank(index: CardIndex) -> u8 {
    (index / 4) as u8 + 2
}

pub const fn card_suit(index: CardIndex) -> u8 {
    (index % 4) as u8
}
