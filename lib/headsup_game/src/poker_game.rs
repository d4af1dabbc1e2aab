//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use alloy_primitives::U256;
use headsup_crypto::{CardIndex, EncryptedCard, RevealedKey};
use serde::{Deserialize, Serialize};

use crate::{
    config::TableConfig,
    error::{GameError, GameResult},
    poker_audit::{BlsAuditor, HandAuditor},
    poker_bets::BettingRound,
    poker_dealer::CommunityDealer,
    poker_escrow::EscrowLedger,
    poker_events::GameEvent,
    poker_exchange::DeckExchange,
    poker_registry::{PlayerId, PlayerRegistry, PlayerSnapshot, Role},
    poker_showdown::{Settlement, ShowdownOracle, ShowdownOutcome},
    poker_state::GamePhase,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub phase: GamePhase,
    pub pot: U256,
    pub current_bet: U256,
    pub community_cards_dealt: usize,
    pub hands_played: u64,
}

/// One heads-up table.
///
/// Every action is attributed to a caller identity and is applied whole or
/// not at all: each method validates phase, role and payload before touching
/// any state. Waiting for the opponent is simply being in a phase that
/// rejects the caller.
///
/// Hand flow:
/// Player 1 encrypts the deck, Player 2 claims its hole cards,
/// Player 1 peels its layer off them, Player 2 claims and encrypts cards
/// for Player 1, Player 1 peels its layer, Player 2 peels its layer,
/// Player 2 sorts and re-encrypts the rest of the deck, then the streets
/// are bet with Player 1 dealing flop, turn and river between them. At
/// showdown both players reveal their hand keys; the table audits every
/// layer before the installed oracle scores the opened cards.
pub struct Game {
    config: TableConfig,
    phase: GamePhase,
    registry: PlayerRegistry,
    ledger: EscrowLedger,
    exchange: DeckExchange,
    betting: BettingRound,
    dealer: CommunityDealer,
    events: Vec<GameEvent>,
    hands_played: u64,
    keys: [Option<RevealedKey>; 2],
    auditor: Box<dyn HandAuditor>,
    scorer: Box<dyn ShowdownOracle>,
}

impl Game {
    /// A table audited with the BLS cipher.
    pub fn new(config: TableConfig, scorer: impl ShowdownOracle + 'static) -> GameResult<Self> {
        Self::with_auditor(config, BlsAuditor::default(), scorer)
    }

    pub fn with_auditor(
        config: TableConfig,
        auditor: impl HandAuditor + 'static,
        scorer: impl ShowdownOracle + 'static,
    ) -> GameResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            phase: GamePhase::Joining,
            registry: PlayerRegistry::default(),
            ledger: EscrowLedger::default(),
            exchange: DeckExchange::default(),
            betting: BettingRound::default(),
            dealer: CommunityDealer::default(),
            events: vec![],
            hands_played: 0,
            keys: [None, None],
            auditor: Box::new(auditor),
            scorer: Box::new(scorer),
        })
    }

    pub const fn config(&self) -> &TableConfig {
        &self.config
    }

    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            phase: self.phase,
            pot: self.ledger.pot(),
            current_bet: self.betting.current_bet(),
            community_cards_dealt: self.dealer.dealt_count(),
            hands_played: self.hands_played,
        }
    }

    pub fn player(&self, role: Role) -> Option<PlayerSnapshot> {
        self.registry
            .player(role)
            .map(|p| p.snapshot(self.ledger.committed(&p.identity())))
    }

    pub fn is_player_in_game(&self, identity: &PlayerId) -> bool {
        self.registry.is_player_in_game(identity)
    }

    pub fn role_of(&self, identity: &PlayerId) -> Option<Role> {
        self.registry.role_of(identity)
    }

    /// Winnings and refunds waiting to be withdrawn.
    pub fn balance_of(&self, identity: &PlayerId) -> U256 {
        self.ledger.balance_of(identity)
    }

    pub fn total_escrowed(&self) -> U256 {
        self.ledger.total_escrowed()
    }

    /// Role that may act right now. `None` while joining and at showdown,
    /// where both players reveal their keys in either order.
    pub fn expected_actor(&self) -> Option<Role> {
        if self.phase.is_betting() {
            return Some(self.betting.to_act());
        }
        self.phase.protocol_actor()
    }

    pub fn call_amount_required(&self, role: Role) -> U256 {
        self.betting.call_amount_required(role)
    }

    /// The encrypted deck everyone sees. Hole updates never appear here.
    pub fn public_deck(&self) -> &[EncryptedCard] {
        self.exchange.deck()
    }

    /// First player's stage 1 deck, kept public for the whole hand.
    pub fn committed_deck(&self) -> &[EncryptedCard] {
        self.exchange.committed()
    }

    /// The deck as Second player re-ordered it, before its final pass.
    pub fn sorted_deck(&self) -> &[EncryptedCard] {
        self.exchange.sorted()
    }

    /// Positions still available to sort, re-encrypt and deal.
    pub fn undealt_positions(&self) -> Vec<CardIndex> {
        self.exchange.undealt_positions()
    }

    pub fn community_positions(&self) -> &[CardIndex] {
        self.dealer.dealt()
    }

    pub fn community_cards(&self) -> Vec<EncryptedCard> {
        self.dealer
            .dealt()
            .iter()
            .filter_map(|p| self.exchange.card(*p).cloned())
            .collect()
    }

    /// The caller's own hole positions. Nobody can query the opponent's.
    pub fn hole_positions(&self, caller: &PlayerId) -> GameResult<[CardIndex; 2]> {
        let role = self.registry.require_seated(caller)?;
        self.exchange
            .hole(role)
            .map(|h| *h.positions())
            .ok_or(GameError::InvalidSelection("no cards selected"))
    }

    /// Current values of the caller's own hole cards.
    pub fn hole_cards(&self, caller: &PlayerId) -> GameResult<[EncryptedCard; 2]> {
        let role = self.registry.require_seated(caller)?;
        self.exchange
            .hole(role)
            .map(|h| h.cards().clone())
            .ok_or(GameError::InvalidSelection("no cards selected"))
    }

    /// The two cards the designated actor has to transform in the current
    /// exchange stage. Handed to that actor only.
    pub fn pending_cards(&self, caller: &PlayerId) -> GameResult<[EncryptedCard; 2]> {
        let (actor, owner) = match self.phase {
            GamePhase::FirstPlayerDecryption => (Role::First, Role::Second),
            GamePhase::FirstPlayerCardDecryption => (Role::First, Role::First),
            GamePhase::SecondPlayerOwnCardSelection => (Role::Second, Role::First),
            phase => return Err(GameError::WrongPhase(phase)),
        };
        self.registry.require_role(caller, actor)?;
        self.exchange
            .hole(owner)
            .map(|h| h.cards().clone())
            .ok_or(GameError::InvalidSelection("no cards selected"))
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Escrows the buy-in and takes the next free seat. The second join
    /// opens the commit phase.
    pub fn join(&mut self, caller: PlayerId, stake: U256) -> GameResult<Role> {
        if stake != self.config.buy_in {
            return Err(GameError::InvalidStake {
                expected: self.config.buy_in,
                got: stake,
            });
        }

        let role = self.registry.vacant_role(&caller)?;
        self.require_phase(GamePhase::Joining)?;

        self.ledger.deposit(caller, stake)?;
        self.registry.seat(caller, role);

        tracing::info!("Player {} joined as {} player", caller, role);
        self.events.push(GameEvent::PlayerJoined {
            player: caller,
            role,
        });

        if self.registry.seated_count() == 2 {
            self.advance();
        }

        Ok(role)
    }

    /// A lone player waiting for an opponent takes its buy-in back.
    pub fn leave(&mut self, caller: PlayerId) -> GameResult<U256> {
        self.require_phase(GamePhase::Joining)?;
        let role = self.registry.require_seated(&caller)?;

        let refund = self.ledger.refund(caller)?;
        self.registry.unseat(role);

        tracing::info!("Player {} left, {} refunded", caller, refund);
        self.events.push(GameEvent::PlayerLeft {
            player: caller,
            refund,
        });

        Ok(refund)
    }

    /// Stage 1 (First player) commits the encrypted deck; stage 8 (Second
    /// player) submits the final encryption pass over the undealt cards.
    pub fn submit_encrypted_deck(
        &mut self,
        caller: PlayerId,
        deck: Vec<EncryptedCard>,
    ) -> GameResult<()> {
        let (role, commitment) = match self.phase {
            GamePhase::CommitPhase => {
                self.registry.require_role(&caller, Role::First)?;
                (Role::First, self.exchange.commit_deck(deck)?)
            }
            GamePhase::DeckEncryption => {
                self.registry.require_role(&caller, Role::Second)?;
                (Role::Second, self.exchange.encrypt_remaining(deck)?)
            }
            phase => return Err(GameError::WrongPhase(phase)),
        };

        self.events.push(GameEvent::DeckSubmitted {
            by: role,
            commitment,
        });
        self.advance();
        Ok(())
    }

    /// Stage 2: Second player claims two still-encrypted positions.
    pub fn select_cards(&mut self, caller: PlayerId, positions: [CardIndex; 2]) -> GameResult<()> {
        self.require_phase(GamePhase::SecondPlayerCardSelection)?;
        self.registry.require_role(&caller, Role::Second)?;

        self.exchange.claim(Role::Second, positions, None)?;

        self.events.push(GameEvent::CardsSelected {
            by: Role::Second,
            owner: Role::Second,
            positions,
        });
        self.advance();
        Ok(())
    }

    /// Stages 3 and 5: First player peels its layer off the target's hole
    /// cards. The stage fixes the target: Second player's cards in stage 3,
    /// First player's own in stage 5.
    pub fn decrypt_cards(
        &mut self,
        caller: PlayerId,
        cards: Vec<EncryptedCard>,
        target: &PlayerId,
    ) -> GameResult<()> {
        let expected = match self.phase {
            GamePhase::FirstPlayerDecryption => Role::Second,
            GamePhase::FirstPlayerCardDecryption => Role::First,
            phase => return Err(GameError::WrongPhase(phase)),
        };
        self.registry.require_role(&caller, Role::First)?;
        if self.registry.role_of(target) != Some(expected) {
            return Err(GameError::WrongTarget { expected });
        }

        self.exchange.update_hole(expected, cards)?;

        self.events.push(GameEvent::CardsDecrypted {
            by: Role::First,
            owner: expected,
        });
        self.advance();
        Ok(())
    }

    /// Stage 4: Second player claims two other positions for First player
    /// and submits them under its own layer.
    pub fn encrypt_cards_for_first_player(
        &mut self,
        caller: PlayerId,
        positions: [CardIndex; 2],
        cards: Vec<EncryptedCard>,
    ) -> GameResult<()> {
        self.require_phase(GamePhase::SecondPlayerCardEncryption)?;
        self.registry.require_role(&caller, Role::Second)?;

        self.exchange.claim(Role::First, positions, Some(cards))?;

        self.events.push(GameEvent::CardsSelected {
            by: Role::Second,
            owner: Role::First,
            positions,
        });
        self.advance();
        Ok(())
    }

    /// Stage 6: Second player peels its layer off the cards First player
    /// prepared in stage 5, completing First player's hole cards.
    pub fn select_own_cards(&mut self, caller: PlayerId, cards: Vec<EncryptedCard>) -> GameResult<()> {
        self.require_phase(GamePhase::SecondPlayerOwnCardSelection)?;
        self.registry.require_role(&caller, Role::Second)?;

        self.exchange.update_hole(Role::First, cards)?;

        self.events.push(GameEvent::CardsDecrypted {
            by: Role::Second,
            owner: Role::First,
        });
        self.advance();
        Ok(())
    }

    /// Stage 7: Second player re-orders the undealt cards.
    pub fn submit_sorted_deck(&mut self, caller: PlayerId, deck: Vec<EncryptedCard>) -> GameResult<()> {
        self.require_phase(GamePhase::SecondPlayerDeckSort)?;
        self.registry.require_role(&caller, Role::Second)?;

        let commitment = self.exchange.sort_remaining(deck)?;

        self.events.push(GameEvent::DeckSubmitted {
            by: Role::Second,
            commitment,
        });
        self.advance();
        Ok(())
    }

    /// Called by the player on turn. A settled street moves on to dealing,
    /// or to showdown after the river.
    pub fn place_bet(&mut self, caller: PlayerId, amount: U256) -> GameResult<()> {
        if !self.phase.is_betting() {
            return Err(GameError::WrongPhase(self.phase));
        }
        let role = self.registry.require_seated(&caller)?;
        self.betting.validate(role, amount)?;
        self.ledger.check_deposit(&caller, amount)?;

        self.ledger.deposit(caller, amount)?;
        let complete = self.betting.record(role, amount);

        tracing::info!("Player {} ({}) bet {}", caller, role, amount);
        self.events.push(GameEvent::BetPlaced {
            role,
            amount,
            pot: self.ledger.pot(),
        });

        if complete {
            self.betting.next_street();
            self.advance();
        }
        Ok(())
    }

    /// Either player, any betting phase, out of turn too. The opponent
    /// takes the pot and the table resets.
    pub fn fold(&mut self, caller: PlayerId) -> GameResult<()> {
        if !self.phase.is_betting() {
            return Err(GameError::WrongPhase(self.phase));
        }
        let role = self.registry.require_seated(&caller)?;
        let winner = role.opponent();
        let winner_id = self.registry.identity(winner)?;

        let pot = self.ledger.award(winner_id)?;
        self.registry.mark_folded(role);

        tracing::info!("Player {} ({}) folded, {} to {}", caller, role, pot, winner_id);
        self.events.push(GameEvent::Folded { role, winner, pot });
        self.end_hand();
        Ok(())
    }

    /// First player reveals the next community batch: 3, then 1, then 1.
    pub fn deal_community_cards(&mut self, caller: PlayerId) -> GameResult<()> {
        if !self.phase.is_dealing() {
            return Err(GameError::WrongPhase(self.phase));
        }
        self.registry.require_role(&caller, Role::First)?;

        let undealt = self.exchange.undealt_positions();
        let positions = self.dealer.deal(self.phase, &undealt)?.to_vec();

        self.events.push(GameEvent::CommunityDealt {
            positions,
            total: self.dealer.dealt_count(),
        });
        self.advance();
        Ok(())
    }

    /// Each player reveals its hand key once. The second reveal audits the
    /// hand, pays the pot and reopens the table; a player caught cheating
    /// forfeits the pot to its opponent.
    pub fn reveal_hand_key(
        &mut self,
        caller: PlayerId,
        key: RevealedKey,
    ) -> GameResult<Option<Settlement>> {
        self.require_phase(GamePhase::Showdown)?;
        let role = self.registry.require_seated(&caller)?;
        if self.keys[role.seat()].is_some() {
            return Err(GameError::KeyAlreadyRevealed);
        }

        let Some(other) = self.keys[role.opponent().seat()].clone() else {
            tracing::info!("Player {} ({}) revealed its hand key", caller, role);
            self.events.push(GameEvent::KeyRevealed { role, key: key.clone() });
            self.keys[role.seat()] = Some(key);
            return Ok(None);
        };
        let keys = match role {
            Role::First => [key.clone(), other],
            Role::Second => [other, key.clone()],
        };

        let first = self.registry.identity(Role::First)?;
        let second = self.registry.identity(Role::Second)?;
        let pot = self.ledger.pot();

        let transcript = self.exchange.transcript(self.dealer.dealt())?;
        let (settlement, event) = match self.auditor.audit(&transcript, &keys) {
            Ok(view) => {
                let outcome = self.scorer.resolve(&view).map_err(GameError::Oracle)?;
                let event = GameEvent::ShowdownResolved { outcome, pot };
                (Settlement::Scored(outcome), event)
            }
            Err(failure) => {
                let cheater = failure.cheater;
                let event = GameEvent::CheatDetected {
                    cheater,
                    reason: failure.reason,
                    pot,
                };
                (Settlement::Forfeited { cheater }, event)
            }
        };

        match settlement {
            Settlement::Scored(ShowdownOutcome::Winner(winner)) => {
                let id = if winner == Role::First { first } else { second };
                self.ledger.award(id)?;
                tracing::info!("Showdown won by {} player {}, pot {}", winner, id, pot);
            }
            Settlement::Scored(ShowdownOutcome::Split) => {
                self.ledger.split(first, second)?;
                tracing::info!("Showdown split, pot {}", pot);
            }
            Settlement::Forfeited { cheater } => {
                let id = if cheater == Role::First { second } else { first };
                self.ledger.award(id)?;
                tracing::warn!("{} player cheated, pot {} goes to {}", cheater, pot, id);
            }
        }

        self.events.push(GameEvent::KeyRevealed { role, key });
        self.events.push(event);
        self.end_hand();
        Ok(Some(settlement))
    }

    /// Pays out the caller's balance. Allowed in any phase since only
    /// finished hands credit balances.
    pub fn withdraw(&mut self, caller: PlayerId) -> GameResult<U256> {
        let amount = self.ledger.withdraw(&caller)?;
        tracing::info!("Player {} withdrew {}", caller, amount);
        self.events.push(GameEvent::Withdrawn {
            player: caller,
            amount,
        });
        Ok(amount)
    }

    fn require_phase(&self, phase: GamePhase) -> GameResult<()> {
        if self.phase != phase {
            return Err(GameError::WrongPhase(self.phase));
        }
        Ok(())
    }

    fn advance(&mut self) {
        self.set_phase(self.phase.next());
    }

    fn set_phase(&mut self, to: GamePhase) {
        let from = self.phase;
        self.phase = to;
        tracing::debug!("Phase {} -> {}", from, to);
        self.events.push(GameEvent::PhaseChanged { from, to });
    }

    /// Pot must already be paid out.
    fn end_hand(&mut self) {
        self.ledger.clear_hand();
        self.registry.clear();
        self.exchange = DeckExchange::default();
        self.betting = BettingRound::default();
        self.dealer = CommunityDealer::default();
        self.keys = [None, None];
        self.hands_played += 1;
        self.set_phase(GamePhase::Joining);
    }
}
