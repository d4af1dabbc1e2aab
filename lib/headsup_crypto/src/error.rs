//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    /// Zero scalar has no inverse, so a layer applied with it could never be removed.
    #[error("Invalid key: {0}")]
    InvalidKey(&'static str),

    #[error("Invalid card point: {0}")]
    InvalidPoint(&'static str),

    #[error("Forgery detected: {0}")]
    Forgery(&'static str),
}
