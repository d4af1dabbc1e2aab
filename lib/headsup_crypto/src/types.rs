//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use bls12_381::{G1Affine, G2Affine, Scalar};

pub type SigningKey = Scalar;
pub type PublicKey = G2Affine;
pub type CardPoint = G1Affine;

pub const CARD_POINT_COMPRESSED_LEN: usize = 48;
pub const PUBLIC_KEY_COMPRESSED_LEN: usize = 96;
pub const SIGNING_KEY_LEN: usize = 32;
