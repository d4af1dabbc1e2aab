//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};

/// One ether in wei.
pub const ONE_ETHER: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Exact stake each player escrows on join
    pub buy_in: U256,
}

impl TableConfig {
    pub fn validate(&self) -> GameResult<()> {
        if self.buy_in.is_zero() {
            return Err(GameError::InvalidConfig("buy-in must be non-zero"));
        }
        Ok(())
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self { buy_in: ONE_ETHER }
    }
}
