//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

/// Verification of unmasking
use bls12_381::{Bls12, G2Affine, G2Prepared, Gt, pairing};
use pairing::{MultiMillerLoop, group::Group};

use crate::{
    card::EncryptedCard,
    error::CipherError,
    types::{CardPoint, PublicKey},
};

/// Verifies that "masked" data has been "unmasked" with signing key
/// corresponding to public key.
///
/// e(unmasked, PK) * e(masked, -G2) == 1
pub fn verify_unmasking(masked: &CardPoint, unmasked: &CardPoint, pk: &PublicKey) -> bool {
    let pk_prepared = G2Prepared::from(*pk);
    let neg_g2_prepared = G2Prepared::from(-G2Affine::generator());
    Bls12::multi_miller_loop(&[(unmasked, &pk_prepared), (masked, &neg_g2_prepared)])
        .final_exponentiation()
        .is_identity()
        .into()
}

/// Audits a whole batch of peeled cards with a single final exponentiation.
///
/// Returns the position of the first forged card, or `None` when every card
/// was unmasked honestly.
pub fn find_forged_unmasking(
    masked: &[EncryptedCard],
    unmasked: &[EncryptedCard],
    pk: &PublicKey,
) -> Result<Option<usize>, CipherError> {
    if masked.len() != unmasked.len() {
        return Err(CipherError::InvalidPoint("Masked and unmasked lengths differ"));
    }

    let pairs = masked
        .iter()
        .zip(unmasked)
        .map(|(m, u)| Ok((m.to_point()?, u.to_point()?)))
        .collect::<Result<Vec<_>, CipherError>>()?;

    let pk_prepared = G2Prepared::from(*pk);
    let neg_g2_prepared = G2Prepared::from(-G2Affine::generator());

    let mut miller_terms = Vec::with_capacity(pairs.len() * 2);
    for (m, u) in &pairs {
        miller_terms.push((u, &pk_prepared));
        miller_terms.push((m, &neg_g2_prepared));
    }

    let batch_valid: bool = Bls12::multi_miller_loop(&miller_terms)
        .final_exponentiation()
        .is_identity()
        .into();

    if batch_valid {
        return Ok(None);
    }

    // Batch failed, find the culprit one pair at a time
    Ok(pairs
        .iter()
        .position(|(m, u)| !verify_unmasking(m, u, pk)))
}

/// Verifies that `after` holds the cards of `before` in some order, each
/// with one more layer added by the signing key behind `pk`. No card of
/// `before` may be matched twice.
///
/// e(after, G2) == e(before, PK)
pub fn verify_shuffle(
    before: &[EncryptedCard],
    after: &[EncryptedCard],
    pk: &PublicKey,
) -> Result<(), CipherError> {
    if before.len() != after.len() {
        return Err(CipherError::Forgery("Shuffled deck changed length"));
    }

    let g2 = G2Affine::generator();
    let mut available = before
        .iter()
        .map(|card| Ok(pairing(&card.to_point()?, pk)))
        .collect::<Result<Vec<Gt>, CipherError>>()?;

    for card in after {
        let target = pairing(&card.to_point()?, &g2);
        match available.iter().position(|gt| *gt == target) {
            Some(i) => {
                available.swap_remove(i);
            }
            None => return Err(CipherError::Forgery("Shuffled card matches no card before")),
        }
    }

    Ok(())
}
