//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use alloy_primitives::U256;
use anyhow::{Context, anyhow, bail};
use headsup_crypto::{
    BlsCipher, CardDeck, CardIndex, CommutativeCipher, EncryptedCard, KeyPair, RevealedKey,
    types::PublicKey,
    verify::{find_forged_unmasking, verify_shuffle},
};
use headsup_game::{Game, GamePhase, PlayerId, Role};
use itertools::Itertools;
use rand::{
    Rng, SeedableRng,
    distributions::WeightedIndex,
    rngs::StdRng,
    seq::SliceRandom,
};

/// One automated player. Holds a fresh masking key per hand.
pub struct HeadsUpBot {
    name: String,
    identity: PlayerId,
    rng: StdRng,
    keys: KeyPair,
    opponent_key: Option<PublicKey>,
    /// Hole card values before the opponent peeled its layer, kept for audit
    audit: Option<Vec<EncryptedCard>>,
    /// Whether the opponent's whole-deck pass was checked this hand
    audited_deck: bool,
    max_raises: usize,
    street: GamePhase,
    raises: usize,
}

impl HeadsUpBot {
    pub fn new(name: &str, identity: PlayerId, seed: u64, max_raises: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let keys = KeyPair::random(&mut rng);
        Self {
            name: name.to_string(),
            identity,
            rng,
            keys,
            opponent_key: None,
            audit: None,
            audited_deck: false,
            max_raises,
            street: GamePhase::Joining,
            raises: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn identity(&self) -> PlayerId {
        self.identity
    }

    pub fn public_key(&self) -> PublicKey {
        *self.keys.public()
    }

    pub fn set_opponent_key(&mut self, pk: PublicKey) {
        self.opponent_key = Some(pk);
    }

    pub fn new_hand(&mut self) {
        self.keys = KeyPair::random(&mut self.rng);
        self.opponent_key = None;
        self.audit = None;
        self.audited_deck = false;
        self.street = GamePhase::Joining;
        self.raises = 0;
    }

    pub fn act(&mut self, game: &mut Game, deck: &CardDeck) -> anyhow::Result<()> {
        let role = game
            .role_of(&self.identity)
            .with_context(|| format!("{} is not seated", self.name))?;
        let phase = game.phase();
        let cipher = BlsCipher;

        self.audit_deck(game, role, deck)?;
        self.audit_hole_cards(game, role, deck)?;

        match phase {
            GamePhase::CommitPhase => {
                tracing::info!("{} masks and shuffles the deck", self.name);
                let mut cards = cipher.apply(self.keys.secret(), &deck.cards())?;
                cards.shuffle(&mut self.rng);
                game.submit_encrypted_deck(self.identity, cards)?;
            }
            GamePhase::SecondPlayerCardSelection => {
                let positions = self.pick_two(game)?;
                tracing::info!("{} selects positions {:?}", self.name, positions);
                self.audit = Some(positions.map(|p| game.public_deck()[p].clone()).to_vec());
                game.select_cards(self.identity, positions)?;
            }
            GamePhase::FirstPlayerDecryption => {
                let opponent = game
                    .player(Role::Second)
                    .context("Second player missing")?
                    .identity;
                tracing::info!("{} unmasks the second player's hole cards", self.name);
                let cards = cipher.remove(self.keys.secret(), &game.pending_cards(&self.identity)?)?;
                game.decrypt_cards(self.identity, cards, &opponent)?;
            }
            GamePhase::SecondPlayerCardEncryption => {
                let positions = self.pick_two(game)?;
                tracing::info!("{} masks positions {:?} for the first player", self.name, positions);
                let cards = positions.map(|p| game.public_deck()[p].clone());
                let cards = cipher.apply(self.keys.secret(), &cards)?;
                game.encrypt_cards_for_first_player(self.identity, positions, cards)?;
            }
            GamePhase::FirstPlayerCardDecryption => {
                tracing::info!("{} unmasks its own hole cards", self.name);
                let cards = cipher.remove(self.keys.secret(), &game.pending_cards(&self.identity)?)?;
                self.audit = Some(cards.clone());
                game.decrypt_cards(self.identity, cards, &self.identity)?;
            }
            GamePhase::SecondPlayerOwnCardSelection => {
                tracing::info!("{} releases the first player's hole cards", self.name);
                let cards = cipher.remove(self.keys.secret(), &game.pending_cards(&self.identity)?)?;
                game.select_own_cards(self.identity, cards)?;
            }
            GamePhase::SecondPlayerDeckSort => {
                tracing::info!("{} re-orders the undealt cards", self.name);
                let deck = self.shuffle_undealt(game, false)?;
                game.submit_sorted_deck(self.identity, deck)?;
            }
            GamePhase::DeckEncryption => {
                tracing::info!("{} masks and re-orders the undealt cards", self.name);
                let deck = self.shuffle_undealt(game, true)?;
                game.submit_encrypted_deck(self.identity, deck)?;
            }
            GamePhase::FlopDealing | GamePhase::TurnDealing | GamePhase::RiverDealing => {
                game.deal_community_cards(self.identity)?;
                tracing::info!(
                    "{} deals, {} community cards on the table",
                    self.name,
                    game.snapshot().community_cards_dealt
                );
            }
            GamePhase::Showdown => {
                tracing::info!("{} reveals its hand key", self.name);
                let key = RevealedKey::from_secret(self.keys.secret());
                if let Some(settlement) = game.reveal_hand_key(self.identity, key)? {
                    tracing::info!("{} sees the hand settled: {:?}", self.name, settlement);
                }
            }
            phase if phase.is_betting() => self.bet(game, role, phase)?,
            phase => bail!("{} has nothing to do in {}", self.name, phase),
        }
        Ok(())
    }

    /// Public deck with the undealt values shuffled, under one more layer
    /// when `mask` is set.
    fn shuffle_undealt(&mut self, game: &Game, mask: bool) -> anyhow::Result<Vec<EncryptedCard>> {
        let mut deck = game.public_deck().to_vec();
        let undealt = game.undealt_positions();
        let mut values = undealt.iter().map(|p| deck[*p].clone()).collect_vec();
        if mask {
            values = BlsCipher.apply(self.keys.secret(), &values)?;
        }
        values.shuffle(&mut self.rng);
        for (p, v) in undealt.iter().zip(values) {
            deck[*p] = v;
        }
        Ok(deck)
    }

    /// Checks the opponent's whole-deck pass against the key it announced.
    /// Second player checks that First player's deck is a masked shuffle of
    /// the plain cards before picking from it. First player checks Second
    /// player's final pass on its first turn after it.
    fn audit_deck(&mut self, game: &Game, role: Role, deck: &CardDeck) -> anyhow::Result<()> {
        let ready = match role {
            Role::Second => GamePhase::SecondPlayerCardSelection,
            Role::First => GamePhase::PreFlopBetting,
        };
        if self.audited_deck || game.phase().code() < ready.code() {
            return Ok(());
        }
        let pk = self.opponent_key.context("Opponent key not announced")?;

        let (before, after) = match role {
            Role::Second => (deck.cards(), game.committed_deck().to_vec()),
            Role::First => {
                let mut positions = game.undealt_positions();
                positions.extend_from_slice(game.community_positions());
                let values = |cards: &[EncryptedCard]| {
                    positions.iter().map(|p| cards[*p].clone()).collect_vec()
                };
                (values(game.sorted_deck()), values(game.public_deck()))
            }
        };
        verify_shuffle(&before, &after, &pk)
            .with_context(|| format!("{} rejects the {} player's deck", self.name, role.opponent()))?;

        tracing::info!("{} verified the {} player's deck", self.name, role.opponent());
        self.audited_deck = true;
        Ok(())
    }

    /// Checks the opponent peeled its layer off our hole cards with the key
    /// it announced, as soon as the final values are on the table.
    fn audit_hole_cards(&mut self, game: &Game, role: Role, deck: &CardDeck) -> anyhow::Result<()> {
        let ready = match role {
            Role::Second => GamePhase::SecondPlayerCardEncryption,
            Role::First => GamePhase::SecondPlayerDeckSort,
        };
        if game.phase().code() < ready.code() {
            return Ok(());
        }
        let Some(masked) = self.audit.take() else {
            return Ok(());
        };
        let pk = self.opponent_key.context("Opponent key not announced")?;

        let unmasked = game.hole_cards(&self.identity)?;
        if let Some(i) = find_forged_unmasking(&masked, &unmasked, &pk)? {
            bail!("{} caught a forged unmasking of hole card {}", self.name, i);
        }

        let labels = unmasked
            .iter()
            .map(|c| {
                deck.find_card(c)?
                    .and_then(|i| deck.label(i))
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("Hole card is still masked"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        tracing::info!("{} holds {}", self.name, labels.join(", "));
        Ok(())
    }

    fn pick_two(&mut self, game: &Game) -> anyhow::Result<[CardIndex; 2]> {
        let undealt = game.undealt_positions();
        let picked = undealt
            .choose_multiple(&mut self.rng, 2)
            .copied()
            .collect_vec();
        picked
            .try_into()
            .map_err(|_| anyhow!("Not enough undealt cards"))
    }

    fn bet(&mut self, game: &mut Game, role: Role, phase: GamePhase) -> anyhow::Result<()> {
        if self.street != phase {
            self.street = phase;
            self.raises = 0;
        }

        let call = game.call_amount_required(role);
        let unit = game.config().buy_in / U256::from(10);

        // fold, call or check, raise
        let mut weights = [1, 8, 3];
        if call.is_zero() {
            weights[0] = 0;
        }
        if self.raises >= self.max_raises {
            weights[2] = 0;
        }
        let dist = WeightedIndex::new(weights)?;

        match self.rng.sample(dist) {
            0 => {
                tracing::info!("{} folds facing {}", self.name, call);
                game.fold(self.identity)?;
            }
            1 => {
                tracing::info!("{} {} {}", self.name, if call.is_zero() { "checks" } else { "calls" }, call);
                game.place_bet(self.identity, call)?;
            }
            _ => {
                let raise = unit * U256::from(self.rng.gen_range(1..=3u64));
                self.raises += 1;
                tracing::info!("{} raises {} over {}", self.name, raise, call);
                game.place_bet(self.identity, call + raise)?;
            }
        }
        Ok(())
    }
}
