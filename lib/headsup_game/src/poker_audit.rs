//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use headsup_crypto::{
    BlsCipher, CardDeck, CardIndex, CipherError, CommutativeCipher, EncryptedCard, RevealedKey,
    types::SigningKey,
};

use crate::{
    poker_exchange::HoleCards,
    poker_registry::Role,
    poker_showdown::ShowdownView,
};

/// Everything the table recorded about one hand's deck.
#[derive(Clone, Debug)]
pub struct HandTranscript<'a> {
    /// First player's masked deck from stage 1
    pub committed: &'a [EncryptedCard],
    /// Deck after Second player's re-ordering
    pub sorted: &'a [EncryptedCard],
    /// Deck after Second player's final pass
    pub encrypted: &'a [EncryptedCard],
    pub first_hole: &'a HoleCards,
    pub second_hole: &'a HoleCards,
    pub undealt: Vec<CardIndex>,
    pub community: &'a [CardIndex],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditFailure {
    pub cheater: Role,
    pub reason: String,
}

impl AuditFailure {
    pub fn new(cheater: Role, reason: &str) -> Self {
        Self {
            cheater,
            reason: reason.to_string(),
        }
    }
}

/// Replays a finished hand with both revealed keys and opens the cards.
///
/// Returns the plain cards of the hand, or the player whose submission does
/// not match the keys it revealed.
pub trait HandAuditor {
    fn audit(
        &self,
        transcript: &HandTranscript<'_>,
        keys: &[RevealedKey; 2],
    ) -> Result<ShowdownView, AuditFailure>;
}

/// Audits hands played with [`BlsCipher`].
///
/// Checks that only need one player's key run before those that need both,
/// so a wrong revealed key is blamed on whoever revealed it.
#[derive(Clone, Debug, Default)]
pub struct BlsAuditor {
    deck: CardDeck,
}

impl BlsAuditor {
    pub fn new(deck: CardDeck) -> Self {
        Self { deck }
    }

    fn open(&self, cards: &[EncryptedCard]) -> Option<Vec<CardIndex>> {
        cards
            .iter()
            .map(|c| self.deck.find_card(c).ok().flatten())
            .collect()
    }
}

impl HandAuditor for BlsAuditor {
    fn audit(
        &self,
        t: &HandTranscript<'_>,
        keys: &[RevealedKey; 2],
    ) -> Result<ShowdownView, AuditFailure> {
        let first = secret_of(Role::First, &keys[0])?;
        let second = secret_of(Role::Second, &keys[1])?;
        let cipher = BlsCipher;

        // First player alone
        let plain = cipher
            .remove(&first, t.committed)
            .map_err(blame(Role::First, "committed deck holds invalid cards"))?;
        let mut indices = self
            .open(&plain)
            .ok_or_else(|| AuditFailure::new(Role::First, "committed deck is not a masked deck"))?;
        indices.sort_unstable();
        indices.dedup();
        if indices.len() != plain.len() {
            return Err(AuditFailure::new(Role::First, "committed deck repeats a card"));
        }

        let claimed = (*t.second_hole.positions()).map(|p| plain[p].clone());
        if stage(t.second_hole, 1, Role::First)? != &claimed {
            return Err(AuditFailure::new(
                Role::First,
                "second player's hole cards were unmasked with another key",
            ));
        }

        // Second player alone
        let committed = (*t.first_hole.positions()).map(|p| t.committed[p].clone());
        let masked = cipher
            .apply(&second, &committed)
            .map_err(blame(Role::Second, "first player's hole cards are invalid"))?;
        if stage(t.first_hole, 0, Role::Second)?.as_slice() != masked.as_slice() {
            return Err(AuditFailure::new(
                Role::Second,
                "first player's hole cards were masked with another key",
            ));
        }

        let before = t.undealt.iter().map(|p| t.sorted[*p].clone()).collect::<Vec<_>>();
        let after = t.undealt.iter().map(|p| t.encrypted[*p].clone()).collect::<Vec<_>>();
        let mut peeled = cipher
            .remove(&second, &after)
            .map_err(blame(Role::Second, "final pass holds invalid cards"))?;
        let mut expected = before;
        peeled.sort();
        expected.sort();
        if peeled != expected {
            return Err(AuditFailure::new(
                Role::Second,
                "final pass is not a masked shuffle of the sorted deck",
            ));
        }

        // Both layers on First player's hole cards
        let peeled = cipher
            .remove(&first, stage(t.first_hole, 0, Role::Second)?)
            .map_err(blame(Role::First, "first player's hole cards are invalid"))?;
        if stage(t.first_hole, 1, Role::First)?.as_slice() != peeled.as_slice() {
            return Err(AuditFailure::new(
                Role::First,
                "own hole cards were unmasked with another key",
            ));
        }
        let peeled = cipher
            .remove(&second, &peeled)
            .map_err(blame(Role::Second, "first player's hole cards are invalid"))?;
        if stage(t.first_hole, 2, Role::Second)?.as_slice() != peeled.as_slice() {
            return Err(AuditFailure::new(
                Role::Second,
                "first player's hole cards were unmasked with another key",
            ));
        }

        let community = t.community.iter().map(|p| t.encrypted[*p].clone()).collect::<Vec<_>>();
        let community = cipher
            .remove(&first, &community)
            .and_then(|cards| cipher.remove(&second, &cards))
            .ok()
            .and_then(|cards| self.open(&cards))
            .ok_or_else(|| AuditFailure::new(Role::Second, "community cards do not open"))?;

        let hole = |cards: &[EncryptedCard; 2], role| {
            self.open(cards)
                .and_then(|c| c.try_into().ok())
                .ok_or_else(|| AuditFailure::new(role, "hole cards do not open"))
        };
        Ok(ShowdownView {
            first_hole: hole(t.first_hole.cards(), Role::Second)?,
            second_hole: hole(t.second_hole.cards(), Role::First)?,
            community,
        })
    }
}

fn blame(cheater: Role, reason: &'static str) -> impl FnOnce(CipherError) -> AuditFailure {
    move |_| AuditFailure::new(cheater, reason)
}

fn secret_of(role: Role, key: &RevealedKey) -> Result<SigningKey, AuditFailure> {
    key.to_secret()
        .map_err(|_| AuditFailure::new(role, "revealed key is not a signing key"))
}

/// Values of a hole selection after its `index`th transform. A missing one
/// is blamed on the player who had to submit it.
fn stage<'a>(
    hole: &'a HoleCards,
    index: usize,
    actor: Role,
) -> Result<&'a [EncryptedCard; 2], AuditFailure> {
    hole.stage(index)
        .ok_or_else(|| AuditFailure::new(actor, "hand transcript is incomplete"))
}
