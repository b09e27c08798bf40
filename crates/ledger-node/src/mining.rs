use crate::constants::MAX_MINING_ATTEMPTS;
use crate::error::ApiError;
use ledger_core::{mine_block_cancellable, Block, Blockchain, LedgerError};
use serde_json::Value;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Runs proof-of-work off the ledger lock.
///
/// Only one search runs at a time. The search works on a snapshot of the tip and
/// is cancelled when the chain is replaced underneath it; the block is then mined
/// again on the new tip.
#[derive(Default)]
pub struct MiningService {
    turn: Mutex<()>,
    cancel: Arc<AtomicBool>,
}

impl MiningService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the in-flight search, if any, at its next nonce.
    fn cancel_in_flight(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Offer `candidate` to `ledger`, cancelling the in-flight search if it is
    /// adopted. Callers pass the ledger through their write guard, so the flag is
    /// up before the new chain becomes visible.
    pub fn replace_chain(&self, ledger: &mut Blockchain, candidate: Vec<Block>) -> bool {
        if !ledger.replace_chain(candidate) {
            return false;
        }
        self.cancel_in_flight();
        true
    }

    /// Mine `data` and append it to `ledger`. Returns the block and the chain as it
    /// stood right after the append.
    pub async fn mine(
        &self,
        ledger: &RwLock<Blockchain>,
        data: Value,
    ) -> Result<(Block, Vec<Block>), ApiError> {
        let _turn = self.turn.lock().await;

        for attempt in 1..=MAX_MINING_ATTEMPTS {
            self.cancel.store(false, Ordering::SeqCst);
            let tip = ledger.read().await.last_block().clone();

            let cancel = Arc::clone(&self.cancel);
            let payload = data.clone();
            let mined = tokio::task::spawn_blocking(move || {
                mine_block_cancellable(&tip, payload, &cancel)
            })
            .await??;

            let Some(block) = mined else {
                debug!("mining attempt {} cancelled by chain replacement", attempt);
                continue;
            };

            let mut chain = ledger.write().await;
            match chain.append_mined(block) {
                Ok(appended) => {
                    let appended = appended.clone();
                    info!("appended block {} at height {}", appended.hash, chain.len() - 1);
                    return Ok((appended, chain.chain().to_vec()));
                }
                Err(LedgerError::StaleBlock { .. }) => {
                    debug!("mining attempt {} produced a stale block", attempt);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ApiError::MiningConflict)
    }
}
