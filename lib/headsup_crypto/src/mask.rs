//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

/// Secret (Un)Masking
use bls12_381::Scalar;
use ff::Field;
use pairing::group::Curve;

use crate::{
    error::CipherError,
    types::{CardPoint, SigningKey},
};

fn checked_key(k: &SigningKey) -> Result<SigningKey, CipherError> {
    if bool::from(k.is_zero()) {
        return Err(CipherError::InvalidKey("Zero signing key"));
    }
    Ok(*k)
}

pub fn mask(point: CardPoint, k: &SigningKey) -> Result<CardPoint, CipherError> {
    let k = checked_key(k)?;
    Ok((point * k).to_affine())
}

pub fn unmask(point: CardPoint, k: &SigningKey) -> Result<CardPoint, CipherError> {
    let k = checked_key(k)?;
    let inverse: Scalar = k
        .invert()
        .into_option()
        .ok_or(CipherError::InvalidKey("Failed to invert"))?;
    Ok((point * inverse).to_affine())
}
