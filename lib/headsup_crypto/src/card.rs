//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use std::fmt;

use alloy_primitives::{B256, Keccak256, hex};

use crate::{
    error::CipherError,
    types::{CARD_POINT_COMPRESSED_LEN, CardPoint},
};

pub const DECK_SIZE: usize = 52;

/// Position within the 52 card deck.
pub type CardIndex = usize;

/// Opaque value of a card at some encryption layer.
///
/// The table never interprets these bytes. The BLS cipher stores compressed
/// G1 points here, tests are free to store plain integers.
#[derive(Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EncryptedCard(Vec<u8>);

impl EncryptedCard {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_point(point: &CardPoint) -> Self {
        Self(point.to_compressed().to_vec())
    }

    pub fn to_point(&self) -> Result<CardPoint, CipherError> {
        let bytes: [u8; CARD_POINT_COMPRESSED_LEN] = self
            .0
            .as_slice()
            .try_into()
            .map_err(|_| CipherError::InvalidPoint("Len Error"))?;
        CardPoint::from_compressed(&bytes)
            .into_option()
            .ok_or(CipherError::InvalidPoint("Decode Error"))
    }
}

impl From<u64> for EncryptedCard {
    fn from(value: u64) -> Self {
        Self(value.to_le_bytes().to_vec())
    }
}

impl fmt::Debug for EncryptedCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedCard({})", hex::encode(&self.0))
    }
}

/// Commitment over an ordered run of cards.
pub fn hash_cards(cards: &[EncryptedCard]) -> B256 {
    let mut hasher = Keccak256::new();
    for card in cards {
        hasher.update((card.as_bytes().len() as u32).to_le_bytes());
        hasher.update(card.as_bytes());
    }
    hasher.finalize()
}
