//! Chain propagation between nodes: pull a peer's chain, push ours after it changes.
//!
//! Delivery is best effort. A failed pull or a dropped push only delays
//! convergence, since every received chain goes through `replace_chain`.

use crate::api::ApiResponse;
use crate::constants::{BLOCKCHAIN_PATH, BROADCAST_CAPACITY, SYNC_PATH};
use crate::AppState;
use anyhow::{anyhow, Context, Result};
use ledger_core::Block;
use std::sync::Arc;
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, info, warn};

/// Published chains are shared, not copied, between subscribers.
pub type ChainMessage = Arc<Vec<Block>>;

/// Pushes a node's full chain to everyone interested. Fire-and-forget.
pub trait Broadcaster: Send + Sync {
    fn broadcast(&self, chain: ChainMessage);
}

/// POSTs the chain to each peer's sync endpoint.
pub struct HttpBroadcaster {
    client: reqwest::Client,
    peers: Vec<String>,
}

impl HttpBroadcaster {
    pub fn new(client: reqwest::Client, peers: Vec<String>) -> Self {
        Self { client, peers }
    }
}

impl Broadcaster for HttpBroadcaster {
    fn broadcast(&self, chain: ChainMessage) {
        for peer in &self.peers {
            let client = self.client.clone();
            let url = format!("{peer}{SYNC_PATH}");
            let chain = Arc::clone(&chain);
            tokio::spawn(async move {
                match client.post(&url).json(&*chain).send().await {
                    Ok(res) if res.status().is_success() => {
                        debug!("pushed chain of length {} to {}", chain.len(), url)
                    }
                    Ok(res) => warn!("peer {} refused chain push: {}", url, res.status()),
                    Err(e) => warn!("failed to push chain to {}: {}", url, e),
                }
            });
        }
    }
}

/// In-process publish/subscribe channel; every subscriber sees every chain.
#[derive(Clone)]
pub struct ChannelBroadcaster {
    tx: broadcast::Sender<ChainMessage>,
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChainMessage> {
        self.tx.subscribe()
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn broadcast(&self, chain: ChainMessage) {
        if self.tx.send(chain).is_err() {
            debug!("no subscribers for chain broadcast");
        }
    }
}

/// Feed every chain published on `rx` into the node behind `state`.
pub fn spawn_subscriber(
    state: AppState,
    mut rx: broadcast::Receiver<ChainMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(chain) => {
                    state.receive_chain(chain.to_vec()).await;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("subscriber lagged, skipped {} chain broadcasts", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Fetch the full chain served by `node`.
pub async fn fetch_chain(client: &reqwest::Client, node: &str) -> Result<Vec<Block>> {
    let url = format!("{node}{BLOCKCHAIN_PATH}");
    let res = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("GET {url}"))?
        .error_for_status()?;
    let body: ApiResponse<Vec<Block>> = res.json().await.context("decoding chain")?;
    body.data
        .ok_or_else(|| anyhow!("{} returned no chain: {:?}", url, body.error))
}

/// Pull `node`'s chain and offer it to our ledger. Returns whether it was adopted.
pub async fn synchronize(state: &AppState, client: &reqwest::Client, node: &str) -> Result<bool> {
    let chain = fetch_chain(client, node).await?;
    info!("fetched chain of length {} from {}", chain.len(), node);
    Ok(state.receive_chain(chain).await)
}
