use crate::constants::{BYTE, MINE_RATE_MS, MIN_DIFFICULTY};
use crate::error::Result;
use crate::hasher::{block_hash, to_hex};
use crate::{now_ms, Block, Hash};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Difficulty for a block stamped at `timestamp` on top of `last_block`.
///
/// One step up when the block came faster than `MINE_RATE_MS`, one step down when
/// slower, never below `MIN_DIFFICULTY`.
pub fn adjust_difficulty(last_block: &Block, timestamp: u64) -> u32 {
    let elapsed = timestamp.saturating_sub(last_block.timestamp);
    let difficulty = if elapsed < MINE_RATE_MS {
        last_block.difficulty.saturating_add(1)
    } else if elapsed > MINE_RATE_MS {
        last_block.difficulty.saturating_sub(1)
    } else {
        last_block.difficulty
    };
    difficulty.max(MIN_DIFFICULTY)
}

pub fn count_leading_zero_bits(hash: &Hash) -> u32 {
    let mut total = 0u32;
    for b in hash {
        if *b == 0 {
            total += BYTE as u32;
        } else {
            total += b.leading_zeros();
            break;
        }
    }
    total
}

/// Mine the block following `last_block`, searching nonces from zero until the
/// digest has at least `difficulty` leading zero bits.
pub fn mine_block(last_block: &Block, data: Value) -> Result<Block> {
    let mut nonce = 0u64;
    loop {
        if let Some(block) = attempt(last_block, &data, nonce)? {
            return Ok(block);
        }
        nonce = nonce.wrapping_add(1);
    }
}

/// Same search as [`mine_block`], checking `cancel` before every attempt.
/// Returns `Ok(None)` once the flag is raised.
pub fn mine_block_cancellable(
    last_block: &Block,
    data: Value,
    cancel: &AtomicBool,
) -> Result<Option<Block>> {
    let mut nonce = 0u64;
    loop {
        if cancel.load(Ordering::Relaxed) {
            return Ok(None);
        }
        if let Some(block) = attempt(last_block, &data, nonce)? {
            return Ok(Some(block));
        }
        nonce = nonce.wrapping_add(1);
    }
}

/// One proof-of-work attempt: fresh timestamp, retargeted difficulty, digest.
fn attempt(last_block: &Block, data: &Value, nonce: u64) -> Result<Option<Block>> {
    let timestamp = now_ms();
    let difficulty = adjust_difficulty(last_block, timestamp);
    let hash = block_hash(timestamp, &last_block.hash, data, nonce, difficulty)?;

    if count_leading_zero_bits(&hash) < difficulty {
        return Ok(None);
    }

    let hash = to_hex(&hash);
    info!(
        "Mined block with nonce {} difficulty {} and hash {}",
        nonce, difficulty, hash
    );
    Ok(Some(Block {
        timestamp,
        last_hash: last_block.hash.clone(),
        hash,
        data: data.clone(),
        nonce,
        difficulty,
    }))
}
