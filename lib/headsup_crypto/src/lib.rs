//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

pub mod card;
pub mod cipher;
pub mod deck;
pub mod error;
pub mod hash_to_curve;
pub mod keys;
pub mod mask;
pub mod types;
pub mod verify;

pub use card::{CardIndex, DECK_SIZE, EncryptedCard, hash_cards};
pub use cipher::{BlsCipher, CommutativeCipher};
pub use deck::CardDeck;
pub use error::CipherError;
pub use keys::{KeyPair, RevealedKey};
