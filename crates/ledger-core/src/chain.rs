use crate::error::{LedgerError, Result};
use crate::hasher::to_hex;
use crate::pow;
use crate::Block;
use serde_json::Value;
use tracing::{debug, info};

/// Check a whole chain from genesis onward. Never panics: anything malformed is `false`.
pub fn validate_chain(chain: &[Block]) -> bool {
    let Some(first) = chain.first() else {
        debug!("rejecting empty chain");
        return false;
    };
    if !first.is_genesis() {
        debug!("rejecting chain with a foreign genesis block");
        return false;
    }

    chain.windows(2).enumerate().all(|(i, pair)| {
        match check_link(&pair[0], &pair[1]) {
            Ok(()) => true,
            Err(reason) => {
                debug!("rejecting chain at block {}: {}", i + 1, reason);
                false
            }
        }
    })
}

/// Invariants between a block and its predecessor.
fn check_link(prev: &Block, curr: &Block) -> std::result::Result<(), String> {
    if curr.last_hash != prev.hash {
        return Err("last hash does not match predecessor".into());
    }
    if prev.difficulty.abs_diff(curr.difficulty) > 1 {
        return Err(format!(
            "difficulty jumped from {} to {}",
            prev.difficulty, curr.difficulty
        ));
    }
    let expected = curr.compute_hash().map_err(|e| e.to_string())?;
    if to_hex(&expected) != curr.hash {
        return Err("hash does not match block contents".into());
    }
    Ok(())
}

/// A node's ledger: the chain it currently believes in.
///
/// The chain always starts at genesis and only changes by appending a block mined
/// on the current tip or by swapping in a longer valid chain wholesale.
#[derive(Clone, Debug)]
pub struct Blockchain {
    chain: Vec<Block>,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    pub fn new() -> Self {
        Self {
            chain: vec![Block::genesis()],
        }
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn into_chain(self) -> Vec<Block> {
        self.chain
    }

    pub fn last_block(&self) -> &Block {
        // never empty: constructed with genesis and only replaced by validated chains
        &self.chain[self.chain.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Mine `data` on top of the current tip and append it.
    pub fn add_block(&mut self, data: Value) -> Result<Block> {
        let block = pow::mine_block(self.last_block(), data)?;
        self.chain.push(block.clone());
        Ok(block)
    }

    /// Append a block that was mined away from this ledger, e.g. on a worker thread.
    ///
    /// The block must extend the current tip; a block mined on a predecessor that
    /// has since been replaced is reported as [`LedgerError::StaleBlock`].
    pub fn append_mined(&mut self, block: Block) -> Result<&Block> {
        let tip = self.last_block();
        if block.last_hash != tip.hash {
            return Err(LedgerError::StaleBlock {
                expected: tip.hash.clone(),
                found: block.last_hash,
            });
        }
        check_link(tip, &block).map_err(LedgerError::InvalidBlock)?;
        self.chain.push(block);
        Ok(self.last_block())
    }

    /// Adopt `candidate` iff it is strictly longer than the current chain and fully
    /// valid. Returns whether the swap happened; a rejected candidate leaves the
    /// ledger untouched and is not otherwise reported.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> bool {
        if candidate.len() <= self.chain.len() {
            debug!(
                "ignoring candidate chain of length {} (have {})",
                candidate.len(),
                self.chain.len()
            );
            return false;
        }
        if !validate_chain(&candidate) {
            debug!("ignoring invalid candidate chain of length {}", candidate.len());
            return false;
        }
        info!(
            "replacing chain of length {} with length {}",
            self.chain.len(),
            candidate.len()
        );
        self.chain = candidate;
        true
    }
}
