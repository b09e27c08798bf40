pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod mining;
pub mod sync;

use anyhow::Result;
use config::NodeConfig;
use error::ApiError;
use ledger_core::{Block, Blockchain};
use mining::MiningService;
use serde_json::Value;
use std::{net::SocketAddr, sync::Arc};
use sync::{Broadcaster, HttpBroadcaster};
use tokio::{net::TcpListener, sync::oneshot, sync::RwLock, task::JoinHandle};
use tracing::{info, warn};

/// Everything a node owns: its ledger, the miner working on it, and the way it
/// tells peers about changes.
#[derive(Clone)]
pub struct AppState {
    blockchain: Arc<RwLock<Blockchain>>,
    miner: Arc<MiningService>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl AppState {
    pub fn new(blockchain: Blockchain, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            blockchain: Arc::new(RwLock::new(blockchain)),
            miner: Arc::new(MiningService::new()),
            broadcaster,
        }
    }

    pub async fn chain(&self) -> Vec<Block> {
        self.blockchain.read().await.chain().to_vec()
    }

    pub async fn len(&self) -> usize {
        self.blockchain.read().await.len()
    }

    /// Mine `data` onto our chain and announce the result.
    pub async fn mine(&self, data: Value) -> Result<Block, ApiError> {
        let (block, chain) = self.miner.mine(&self.blockchain, data).await?;
        self.broadcaster.broadcast(Arc::new(chain));
        Ok(block)
    }

    /// Offer a peer's chain to our ledger; adopted chains are re-announced.
    pub async fn receive_chain(&self, candidate: Vec<Block>) -> bool {
        let adopted = {
            let mut ledger = self.blockchain.write().await;
            if !self.miner.replace_chain(&mut ledger, candidate) {
                return false;
            }
            ledger.chain().to_vec()
        };
        self.broadcaster.broadcast(Arc::new(adopted));
        true
    }

    /// Announce our current chain unprompted.
    pub async fn announce(&self) {
        let chain = self.chain().await;
        self.broadcaster.broadcast(Arc::new(chain));
    }
}

/// A node serving on a bound listener.
pub struct NodeHandle {
    pub addr: SocketAddr,
    pub state: AppState,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl NodeHandle {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        let _ = self.task.await;
    }
}

/// Serve `state` on `listener` until the handle is shut down.
pub fn spawn(listener: TcpListener, state: AppState) -> Result<NodeHandle> {
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel::<()>();
    let app = api::router(state.clone());
    let task = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async {
            let _ = rx.await;
        });
        if let Err(e) = server.await {
            warn!("server on {} stopped with error: {}", addr, e);
        }
    });
    Ok(NodeHandle {
        addr,
        state,
        shutdown: tx,
        task,
    })
}

/// Run a node until ctrl-c.
pub async fn run(config: NodeConfig) -> Result<()> {
    let client = reqwest::Client::new();
    let broadcaster = Arc::new(HttpBroadcaster::new(client.clone(), config.peers.clone()));
    let state = AppState::new(Blockchain::new(), broadcaster);

    let listener = TcpListener::bind(config.listen).await?;
    let node = spawn(listener, state.clone())?;
    info!("ledger-node listening on {}", node.url());

    if let Some(root) = &config.sync_from {
        match sync::synchronize(&state, &client, root).await {
            Ok(adopted) => info!("initial sync from {} done (adopted: {})", root, adopted),
            Err(e) => warn!("initial sync from {} failed: {:#}", root, e),
        }
    }

    if let Some(delay) = config.announce_delay {
        let state = state.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            state.announce().await;
        });
    }

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    node.shutdown().await;
    Ok(())
}
