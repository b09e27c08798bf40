pub const BYTE: usize = 8;
pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;

/// Target interval between two consecutive blocks, in milliseconds.
pub const MINE_RATE_MS: u64 = 1_000;
pub const INITIAL_DIFFICULTY: u32 = 4;
pub const MIN_DIFFICULTY: u32 = 1;

pub const GENESIS_TIMESTAMP: u64 = 1;
pub const GENESIS_LAST_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";
pub const GENESIS_NONCE: u64 = 0;
pub const GENESIS_DIFFICULTY: u32 = INITIAL_DIFFICULTY;
/// Digest of the genesis fields above with an empty array as data.
pub const GENESIS_HASH: &str = "54197eb7400ca44b31aa1a37e1e658fbad8871967a5bf9981a1aa05b41240187";
