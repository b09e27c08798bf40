use crate::constants::{ANNOUNCE_DELAY_MS, DEFAULT_PORT, PORT_SPREAD, ROOT_NODE};
use anyhow::{anyhow, Context};
use clap::Parser;
use rand::Rng;
use std::{net::SocketAddr, time::Duration};

#[derive(Parser, Debug, Clone)]
#[command(name = "ledger-node")]
#[command(about = "Proof-of-work ledger node")]
pub struct Args {
    /// Interface to bind
    #[arg(long, env = "LEDGER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on; ignored with --generate-port
    #[arg(long, env = "LEDGER_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Pick a random port above the default one
    #[arg(long, env = "GENERATE_NODE_PORT")]
    pub generate_port: bool,

    /// Node to pull the chain from when not running on the default port
    #[arg(long, env = "LEDGER_ROOT_NODE", default_value = ROOT_NODE)]
    pub root_node: String,

    /// Peer base URL to push chain updates to (repeatable or comma-separated)
    #[arg(long = "peer", env = "LEDGER_PEERS", value_delimiter = ',')]
    pub peers: Vec<String>,

    /// Delay before the first broadcast of our chain, in milliseconds (0 disables)
    #[arg(long, env = "LEDGER_ANNOUNCE_DELAY_MS", default_value_t = ANNOUNCE_DELAY_MS)]
    pub announce_delay_ms: u64,
}

/// Resolved node settings.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub listen: SocketAddr,
    /// Where to pull the initial chain from, if anywhere.
    pub sync_from: Option<String>,
    pub peers: Vec<String>,
    pub announce_delay: Option<Duration>,
}

impl Args {
    /// Resolve the arguments into settings. `--host` may be an IP literal or a
    /// name such as `localhost`; the first address it resolves to is bound.
    pub async fn into_config(self) -> anyhow::Result<NodeConfig> {
        let port = if self.generate_port {
            DEFAULT_PORT + rand::thread_rng().gen_range(1..=PORT_SPREAD)
        } else {
            self.port
        };
        let listen: SocketAddr = tokio::net::lookup_host((self.host.as_str(), port))
            .await
            .with_context(|| format!("invalid listen address {}:{}", self.host, port))?
            .next()
            .ok_or_else(|| anyhow!("{}:{} resolved to no address", self.host, port))?;

        // the root node is the source of truth; everyone else catches up from it
        let sync_from = (port != DEFAULT_PORT).then(|| trim_url(&self.root_node));
        let peers = self
            .peers
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(trim_url)
            .collect();
        let announce_delay =
            (self.announce_delay_ms > 0).then(|| Duration::from_millis(self.announce_delay_ms));

        Ok(NodeConfig {
            listen,
            sync_from,
            peers,
            announce_delay,
        })
    }
}

fn trim_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
