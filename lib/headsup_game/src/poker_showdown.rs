//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use headsup_crypto::CardIndex;
use serde::{Deserialize, Serialize};

use crate::poker_registry::Role;

/// The opened cards of an audited hand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShowdownView {
    pub first_hole: [CardIndex; 2],
    pub second_hole: [CardIndex; 2],
    pub community: Vec<CardIndex>,
}

impl ShowdownView {
    pub const fn hole(&self, role: Role) -> &[CardIndex; 2] {
        match role {
            Role::First => &self.first_hole,
            Role::Second => &self.second_hole,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShowdownOutcome {
    Winner(Role),
    Split,
}

/// How a hand that reached showdown was paid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Settlement {
    Scored(ShowdownOutcome),
    /// The audit caught `cheater`; its opponent takes the pot.
    Forfeited { cheater: Role },
}

/// Scores a showdown. The table installs one oracle when it is built and
/// hands it only audited cards.
pub trait ShowdownOracle {
    fn resolve(&self, view: &ShowdownView) -> Result<ShowdownOutcome, String>;
}

impl<F> ShowdownOracle for F
where
    F: Fn(&ShowdownView) -> Result<ShowdownOutcome, String>,
{
    fn resolve(&self, view: &ShowdownView) -> Result<ShowdownOutcome, String> {
        self(view)
    }
}
