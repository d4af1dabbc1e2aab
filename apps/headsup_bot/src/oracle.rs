//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use std::cmp::Ordering;

use headsup_crypto::{CardDeck, CardIndex};
use headsup_game::{Role, ShowdownOracle, ShowdownOutcome, ShowdownView};
use itertools::Itertools;

use crate::hand_rank::evaluate_best_hand;

/// Ranks both hands of an audited showdown, best five of seven.
pub struct HandRankOracle {
    deck: CardDeck,
}

impl HandRankOracle {
    pub fn new(deck: CardDeck) -> Self {
        Self { deck }
    }

    fn labels(&self, cards: &[CardIndex]) -> String {
        cards
            .iter()
            .map(|c| self.deck.label(*c).unwrap_or("??"))
            .join(", ")
    }
}

impl ShowdownOracle for HandRankOracle {
    fn resolve(&self, view: &ShowdownView) -> Result<ShowdownOutcome, String> {
        tracing::info!("Community cards: {}", self.labels(&view.community));

        let mut values = Vec::with_capacity(2);
        for role in [Role::First, Role::Second] {
            let hole = view.hole(role);
            let cards = [hole.as_slice(), view.community.as_slice()].concat();
            let value = evaluate_best_hand(&cards).ok_or("Not enough cards to rank")?;
            tracing::info!(
                "{} player shows {}: {:?}",
                role,
                self.labels(hole),
                value.category
            );
            values.push(value);
        }

        Ok(match values[0].cmp(&values[1]) {
            Ordering::Greater => ShowdownOutcome::Winner(Role::First),
            Ordering::Less => ShowdownOutcome::Winner(Role::Second),
            Ordering::Equal => ShowdownOutcome::Split,
        })
    }
}
