//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use std::fmt;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};

pub type PlayerId = Address;

/// Seat assigned by join order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    First,
    Second,
}

impl Role {
    pub const fn opponent(self) -> Self {
        match self {
            Role::First => Role::Second,
            Role::Second => Role::First,
        }
    }

    pub const fn seat(self) -> usize {
        match self {
            Role::First => 0,
            Role::Second => 1,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::First => write!(f, "first"),
            Role::Second => write!(f, "second"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    identity: PlayerId,
    role: Role,
    is_active: bool,
    has_folded: bool,
}

impl Player {
    const fn new(identity: PlayerId, role: Role) -> Self {
        Self {
            identity,
            role,
            is_active: true,
            has_folded: false,
        }
    }

    pub const fn identity(&self) -> PlayerId {
        self.identity
    }

    pub const fn role(&self) -> Role {
        self.role
    }

    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    pub const fn has_folded(&self) -> bool {
        self.has_folded
    }

    pub fn snapshot(&self, committed: U256) -> PlayerSnapshot {
        PlayerSnapshot {
            identity: self.identity,
            role: self.role,
            is_active: self.is_active,
            has_folded: self.has_folded,
            committed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub identity: PlayerId,
    pub role: Role,
    pub is_active: bool,
    pub has_folded: bool,
    pub committed: U256,
}

/// Both seats of the table.
#[derive(Clone, Debug, Default)]
pub struct PlayerRegistry {
    seats: [Option<Player>; 2],
}

impl PlayerRegistry {
    /// Role the identity would receive on joining now.
    pub fn vacant_role(&self, identity: &PlayerId) -> GameResult<Role> {
        if self.role_of(identity).is_some() {
            return Err(GameError::AlreadySeated);
        }
        match &self.seats {
            [None, _] => Ok(Role::First),
            [Some(_), None] => Ok(Role::Second),
            [Some(_), Some(_)] => Err(GameError::TableFull),
        }
    }

    pub fn seat(&mut self, identity: PlayerId, role: Role) {
        self.seats[role.seat()] = Some(Player::new(identity, role));
    }

    pub fn unseat(&mut self, role: Role) -> Option<Player> {
        self.seats[role.seat()].take()
    }

    pub fn role_of(&self, identity: &PlayerId) -> Option<Role> {
        self.seats
            .iter()
            .flatten()
            .find(|p| p.identity == *identity)
            .map(|p| p.role)
    }

    pub fn is_player_in_game(&self, identity: &PlayerId) -> bool {
        self.role_of(identity).is_some()
    }

    pub fn player(&self, role: Role) -> Option<&Player> {
        self.seats[role.seat()].as_ref()
    }

    pub fn seated_count(&self) -> usize {
        self.seats.iter().flatten().count()
    }

    /// Seated identity holding this role.
    pub fn identity(&self, role: Role) -> GameResult<PlayerId> {
        self.player(role)
            .map(Player::identity)
            .ok_or(GameError::NotSeated)
    }

    /// Caller must hold exactly this role.
    pub fn require_role(&self, caller: &PlayerId, role: Role) -> GameResult<()> {
        match self.role_of(caller) {
            Some(r) if r == role => Ok(()),
            _ => Err(GameError::WrongPlayer { expected: role }),
        }
    }

    /// Caller must hold either seat.
    pub fn require_seated(&self, caller: &PlayerId) -> GameResult<Role> {
        self.role_of(caller).ok_or(GameError::NotSeated)
    }

    pub fn mark_folded(&mut self, role: Role) {
        if let Some(player) = self.seats[role.seat()].as_mut() {
            player.has_folded = true;
            player.is_active = false;
        }
    }

    pub fn clear(&mut self) {
        self.seats = [None, None];
    }
}
