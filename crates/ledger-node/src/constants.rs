pub const DEFAULT_PORT: u16 = 5001;
pub const ROOT_NODE: &str = "http://localhost:5001";
/// Upper bound of the random offset added to `DEFAULT_PORT` by `--generate-port`.
pub const PORT_SPREAD: u16 = 1000;

pub const BLOCKCHAIN_PATH: &str = "/api/v1/blockchain";
pub const MINE_PATH: &str = "/api/v1/blocks/mine";
pub const SYNC_PATH: &str = "/api/v1/blockchain/sync";

/// Request body cap for pushed chains; a full chain outgrows axum's 2 MiB default.
pub const MAX_CHAIN_BODY_BYTES: usize = 256 * 1024 * 1024;

pub const ANNOUNCE_DELAY_MS: u64 = 1_000;
pub(crate) const MAX_MINING_ATTEMPTS: usize = 3;
pub(crate) const BROADCAST_CAPACITY: usize = 64;
