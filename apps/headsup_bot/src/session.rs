//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use alloy_primitives::{Address, U256};
use anyhow::{Context, bail};
use headsup_crypto::CardDeck;
use headsup_game::{
    Game, GameEvent, GamePhase, PlayerId, Role, ShowdownOutcome, TableConfig,
};

use crate::{bot::HeadsUpBot, oracle::HandRankOracle};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandOutcome {
    Folded { winner: Role },
    Showdown(ShowdownOutcome),
    /// The showdown audit caught `cheater`, whose opponent took the pot
    Forfeited { cheater: Role },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandSummary {
    /// Identities seated as First and Second player
    pub seats: [PlayerId; 2],
    pub outcome: HandOutcome,
    pub pot: U256,
}

/// Two bots sharing one table.
pub struct Session {
    game: Game,
    bots: [HeadsUpBot; 2],
    deck: CardDeck,
}

impl Session {
    pub fn new(config: TableConfig, seed: u64, max_raises: usize) -> anyhow::Result<Self> {
        let deck = CardDeck::new();
        let game = Game::new(config, HandRankOracle::new(deck.clone()))?;
        let bots = [
            HeadsUpBot::new("Alice", Address::with_last_byte(1), seed, max_raises),
            HeadsUpBot::new("Bob", Address::with_last_byte(2), seed.wrapping_add(1), max_raises),
        ];
        Ok(Self { game, bots, deck })
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn bots(&self) -> &[HeadsUpBot; 2] {
        &self.bots
    }

    /// Seats both bots, alternating who joins first, and drives the table
    /// until the hand is paid out.
    pub fn play_hand(&mut self) -> anyhow::Result<HandSummary> {
        let hand = self.game.snapshot().hands_played;
        let buy_in = self.game.config().buy_in;
        let order = if hand % 2 == 0 { [0, 1] } else { [1, 0] };

        for i in order {
            self.bots[i].new_hand();
            self.game.join(self.bots[i].identity(), buy_in)?;
        }
        let keys = [self.bots[0].public_key(), self.bots[1].public_key()];
        self.bots[0].set_opponent_key(keys[1]);
        self.bots[1].set_opponent_key(keys[0]);

        let seats = order.map(|i| self.bots[i].identity());
        tracing::info!(
            "Hand {}: {} is first player, {} is second player",
            hand + 1,
            self.bots[order[0]].name(),
            self.bots[order[1]].name()
        );
        self.drain_events();

        loop {
            match self.game.phase() {
                GamePhase::Joining => bail!("Hand ended without a payout"),
                GamePhase::Showdown => {
                    for i in order {
                        self.bots[i].act(&mut self.game, &self.deck)?;
                    }
                }
                _ => {
                    let actor = self.game.expected_actor().context("Nobody may act")?;
                    let bot = self
                        .bots
                        .iter_mut()
                        .find(|b| self.game.role_of(&b.identity()) == Some(actor))
                        .with_context(|| format!("No bot seated as {actor} player"))?;
                    bot.act(&mut self.game, &self.deck)?;
                }
            }
            if let Some(summary) = summarize(&self.drain_events(), seats) {
                return Ok(summary);
            }
        }
    }

    /// Withdraws every bot's winnings. Returns the amounts in bot order.
    pub fn cash_out(&mut self) -> anyhow::Result<[U256; 2]> {
        let mut paid = [U256::ZERO; 2];
        for (i, bot) in self.bots.iter().enumerate() {
            if !self.game.balance_of(&bot.identity()).is_zero() {
                paid[i] = self.game.withdraw(bot.identity())?;
            }
        }
        self.drain_events();
        Ok(paid)
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        let events = self.game.take_events();
        for event in &events {
            tracing::debug!("{:?}", event);
        }
        events
    }
}

/// The hand result among `events`, if the hand ended.
pub fn summarize(events: &[GameEvent], seats: [PlayerId; 2]) -> Option<HandSummary> {
    events.iter().rev().find_map(|event| {
        let (outcome, pot) = match event {
            GameEvent::Folded { winner, pot, .. } => (HandOutcome::Folded { winner: *winner }, pot),
            GameEvent::ShowdownResolved { outcome, pot } => (HandOutcome::Showdown(*outcome), pot),
            GameEvent::CheatDetected { cheater, pot, .. } => {
                (HandOutcome::Forfeited { cheater: *cheater }, pot)
            }
            _ => return None,
        };
        Some(HandSummary {
            seats,
            outcome,
            pot: *pot,
        })
    })
}
