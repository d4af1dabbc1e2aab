//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use headsup_crypto::{
    CardIndex,
    deck::{card_rank, card_suit},
};
use itertools::Itertools;

/// Texas Hold'em hand categories, weakest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum HandCategory {
    HighCard,
    Pair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

/// Comparable strength of a five card hand.
///
/// Kickers are ordered by group size, then rank, so two hands of the same
/// category compare correctly with a plain lexicographic comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct HandValue {
    pub category: HandCategory,
    pub kickers: [u8; 5],
}

/// Best five card hand out of hole plus community cards.
pub fn evaluate_best_hand(cards: &[CardIndex]) -> Option<HandValue> {
    cards
        .iter()
        .copied()
        .combinations(5)
        .map(|hand| evaluate_five(&hand))
        .max()
}

fn evaluate_five(cards: &[CardIndex]) -> HandValue {
    let mut counts = [0u8; 15];
    for card in cards {
        counts[card_rank(*card) as usize] += 1;
    }

    let grouped: Vec<u8> = cards
        .iter()
        .map(|c| card_rank(*c))
        .sorted_by(|a, b| {
            counts[*b as usize]
                .cmp(&counts[*a as usize])
                .then(b.cmp(a))
        })
        .collect();
    let mut kickers = [0u8; 5];
    kickers.copy_from_slice(&grouped);

    let is_flush = cards.iter().map(|c| card_suit(*c)).all_equal();
    let distinct = counts.iter().filter(|c| **c > 0).count();

    let is_straight = if distinct != 5 {
        false
    } else if kickers[0] - kickers[4] == 4 {
        true
    } else if kickers == [14, 5, 4, 3, 2] {
        // Wheel, the ace plays low
        kickers = [5, 4, 3, 2, 1];
        true
    } else {
        false
    };

    let top = counts[kickers[0] as usize];
    let next = if is_straight {
        1
    } else {
        counts[kickers[top as usize] as usize]
    };

    let category = match (top, next) {
        _ if is_straight && is_flush => HandCategory::StraightFlush,
        (4, _) => HandCategory::FourOfAKind,
        (3, 2) => HandCategory::FullHouse,
        _ if is_flush => HandCategory::Flush,
        _ if is_straight => HandCategory::Straight,
        (3, _) => HandCategory::ThreeOfAKind,
        (2, 2) => HandCategory::TwoPair,
        (2, _) => HandCategory::Pair,
        _ => HandCategory::HighCard,
    };

    HandValue { category, kickers }
}
