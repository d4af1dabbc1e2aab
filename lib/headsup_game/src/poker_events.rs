//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use alloy_primitives::{B256, U256};
use headsup_crypto::{CardIndex, RevealedKey};

use crate::{
    poker_registry::{PlayerId, Role},
    poker_showdown::ShowdownOutcome,
    poker_state::GamePhase,
};

/// Notifications emitted by successful actions, drained by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    PlayerJoined { player: PlayerId, role: Role },
    PlayerLeft { player: PlayerId, refund: U256 },
    PhaseChanged { from: GamePhase, to: GamePhase },
    DeckSubmitted { by: Role, commitment: B256 },
    CardsSelected { by: Role, owner: Role, positions: [CardIndex; 2] },
    CardsDecrypted { by: Role, owner: Role },
    BetPlaced { role: Role, amount: U256, pot: U256 },
    CommunityDealt { positions: Vec<CardIndex>, total: usize },
    Folded { role: Role, winner: Role, pot: U256 },
    KeyRevealed { role: Role, key: RevealedKey },
    ShowdownResolved { outcome: ShowdownOutcome, pot: U256 },
    CheatDetected { cheater: Role, reason: String, pot: U256 },
    Withdrawn { player: PlayerId, amount: U256 },
}
