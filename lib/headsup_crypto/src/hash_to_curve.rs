//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use alloy_primitives::Keccak256;
use bls12_381::{
    G1Projective,
    hash_to_curve::{ExpandMsgXmd, HashToCurve},
};
use digest::generic_array::{GenericArray, typenum};

const CARD_DOMAIN: &[u8] = b"HEADSUP_CARD_BLS12381G1_XMD:KECCAK-256_SSWU_RO_";

/// Keccak-256 exposed through the `digest` 0.9 traits expected by `ExpandMsgXmd`.
#[derive(Default)]
pub struct Keccak256Xmd(Keccak256);

impl digest::BlockInput for Keccak256Xmd {
    // Keccak-256 sponge rate
    type BlockSize = typenum::U136;
}

impl digest::Digest for Keccak256Xmd {
    type OutputSize = typenum::U32;

    fn new() -> Self {
        Self::default()
    }

    fn update(&mut self, data: impl AsRef<[u8]>) {
        self.0.update(data);
    }

    fn chain(mut self, data: impl AsRef<[u8]>) -> Self {
        self.0.update(data);
        self
    }

    fn finalize(self) -> digest::Output<Self> {
        GenericArray::clone_from_slice(self.0.finalize().as_slice())
    }

    fn finalize_reset(&mut self) -> digest::Output<Self> {
        std::mem::take(self).finalize()
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn output_size() -> usize {
        32
    }

    fn digest(data: &[u8]) -> digest::Output<Self> {
        Self::new().chain(data).finalize()
    }
}

/// Maps a card label onto G1. The same label always lands on the same point,
/// so both players agree on the plaintext deck without exchanging it.
pub fn hash_to_curve(message: &[u8]) -> G1Projective {
    <G1Projective as HashToCurve<ExpandMsgXmd<Keccak256Xmd>>>::hash_to_curve(message, CARD_DOMAIN)
}
