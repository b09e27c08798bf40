pub mod chain;
pub mod constants;
pub mod error;
pub mod hasher;
pub mod pow;

use constants::{
    GENESIS_DIFFICULTY, GENESIS_HASH, GENESIS_LAST_HASH, GENESIS_NONCE, GENESIS_TIMESTAMP,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

pub use chain::{validate_chain, Blockchain};
pub use error::{LedgerError, Result};
pub use pow::{adjust_difficulty, mine_block, mine_block_cancellable};

pub type Hash = [u8; 32];

/// One immutable link of the chain. `hash` commits to every other field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub timestamp: u64,
    pub last_hash: String,
    pub hash: String,
    pub data: Value,
    pub nonce: u64,
    pub difficulty: u32,
}

impl Block {
    /// The fixed first block shared by every node.
    pub fn genesis() -> Self {
        Self {
            timestamp: GENESIS_TIMESTAMP,
            last_hash: GENESIS_LAST_HASH.to_string(),
            hash: GENESIS_HASH.to_string(),
            data: Value::Array(Vec::new()),
            nonce: GENESIS_NONCE,
            difficulty: GENESIS_DIFFICULTY,
        }
    }

    pub fn is_genesis(&self) -> bool {
        *self == Self::genesis()
    }

    /// Recompute the digest from the stored fields.
    pub fn compute_hash(&self) -> Result<Hash> {
        hasher::block_hash(
            self.timestamp,
            &self.last_hash,
            &self.data,
            self.nonce,
            self.difficulty,
        )
    }

    /// Whether the stored hash carries at least `difficulty` leading zero bits.
    /// A hash that is not 32 bytes of hex never qualifies.
    pub fn meets_difficulty(&self) -> bool {
        let mut raw = [0u8; 32];
        match hex::decode_to_slice(&self.hash, &mut raw) {
            Ok(()) => pow::count_leading_zero_bits(&raw) >= self.difficulty,
            Err(_) => false,
        }
    }
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
