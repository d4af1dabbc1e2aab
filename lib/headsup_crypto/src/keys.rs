//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use std::fmt;

use alloy_primitives::hex;
use bls12_381::G2Projective;
use ff::Field;
use pairing::group::Curve;
use rand_core::RngCore;

use crate::{
    error::CipherError,
    types::{PUBLIC_KEY_COMPRESSED_LEN, PublicKey, SIGNING_KEY_LEN, SigningKey},
};

/// Ephemeral per-hand masking key.
#[derive(Clone, Debug)]
pub struct KeyPair {
    secret: SigningKey,
    public: PublicKey,
}

impl KeyPair {
    pub fn random(rng: &mut impl RngCore) -> Self {
        loop {
            let secret = SigningKey::random(&mut *rng);
            if let Ok(pair) = Self::from_secret(secret) {
                return pair;
            }
        }
    }

    pub fn from_secret(secret: SigningKey) -> Result<Self, CipherError> {
        if bool::from(secret.is_zero()) {
            return Err(CipherError::InvalidKey("Zero signing key"));
        }
        Ok(Self {
            secret,
            public: make_public_key_from_signing_key(&secret),
        })
    }

    pub const fn secret(&self) -> &SigningKey {
        &self.secret
    }

    pub const fn public(&self) -> &PublicKey {
        &self.public
    }
}

/// A per-hand secret published once betting is over, so the table can
/// replay every layer the player added or removed.
#[derive(Clone, PartialEq, Eq)]
pub struct RevealedKey(Vec<u8>);

impl RevealedKey {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn from_secret(secret: &SigningKey) -> Self {
        Self(secret.to_bytes().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_secret(&self) -> Result<SigningKey, CipherError> {
        let bytes: [u8; SIGNING_KEY_LEN] = self
            .0
            .as_slice()
            .try_into()
            .map_err(|_| CipherError::InvalidKey("Len Error"))?;
        let secret = SigningKey::from_bytes(&bytes)
            .into_option()
            .ok_or(CipherError::InvalidKey("Decode Error"))?;
        if bool::from(secret.is_zero()) {
            return Err(CipherError::InvalidKey("Zero signing key"));
        }
        Ok(secret)
    }
}

impl fmt::Debug for RevealedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RevealedKey({})", hex::encode(&self.0))
    }
}

pub fn make_public_key_from_signing_key(sk: &SigningKey) -> PublicKey {
    (G2Projective::generator() * sk).to_affine()
}

pub fn make_public_key_from_compressed_slice(data: &[u8]) -> Result<PublicKey, CipherError> {
    let bytes: [u8; PUBLIC_KEY_COMPRESSED_LEN] = data
        .try_into()
        .map_err(|_| CipherError::InvalidKey("Len Error"))?;
    PublicKey::from_compressed(&bytes)
        .into_option()
        .ok_or(CipherError::InvalidKey("Decode Error"))
}
