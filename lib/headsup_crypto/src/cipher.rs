//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use crate::{
    card::EncryptedCard,
    error::CipherError,
    mask::{mask, unmask},
    types::SigningKey,
};

/// Encryption whose layers can be applied and removed in any order.
///
/// For any two keys `a` and `b`, `remove(a, remove(b, apply(a, apply(b, x))))`
/// yields `x`, and so does removing `a` before `b`.
pub trait CommutativeCipher {
    type Key;

    fn apply(
        &self,
        key: &Self::Key,
        cards: &[EncryptedCard],
    ) -> Result<Vec<EncryptedCard>, CipherError>;

    fn remove(
        &self,
        key: &Self::Key,
        cards: &[EncryptedCard],
    ) -> Result<Vec<EncryptedCard>, CipherError>;
}

/// Scalar multiplication over BLS12-381 G1.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlsCipher;

impl CommutativeCipher for BlsCipher {
    type Key = SigningKey;

    fn apply(
        &self,
        key: &SigningKey,
        cards: &[EncryptedCard],
    ) -> Result<Vec<EncryptedCard>, CipherError> {
        cards
            .iter()
            .map(|card| Ok(EncryptedCard::from_point(&mask(card.to_point()?, key)?)))
            .collect()
    }

    fn remove(
        &self,
        key: &SigningKey,
        cards: &[EncryptedCard],
    ) -> Result<Vec<EncryptedCard>, CipherError> {
        cards
            .iter()
            .map(|card| Ok(EncryptedCard::from_point(&unmask(card.to_point()?, key)?)))
            .collect()
    }
}
