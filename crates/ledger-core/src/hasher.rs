//! Order-sensitive SHA-256 over a sequence of JSON-normalised fields.

use crate::error::Result;
use crate::Hash;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Incremental digest over a fixed sequence of fields.
///
/// Every field is normalised with `serde_json` before it reaches the digest, so
/// strings are quoted and maps come out key-sorted. Two nodes hashing the same
/// values in the same order always agree; the same values in another order do not.
#[derive(Clone, Default)]
pub struct FieldHasher {
    inner: Sha256,
}

impl FieldHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(value)?;
        self.inner.update(&bytes);
        Ok(self)
    }

    pub fn finish(self) -> Hash {
        let digest = self.inner.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest[..]);
        out
    }
}

/// Digest of the block fields in the one order used by both mining and validation.
pub fn block_hash(
    timestamp: u64,
    last_hash: &str,
    data: &Value,
    nonce: u64,
    difficulty: u32,
) -> Result<Hash> {
    Ok(FieldHasher::new()
        .field(&timestamp)?
        .field(last_hash)?
        .field(data)?
        .field(&nonce)?
        .field(&difficulty)?
        .finish())
}

pub fn to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn two(a: &str, b: &str) -> Hash {
        FieldHasher::new()
            .field(a)
            .and_then(|h| h.field(b))
            .unwrap()
            .finish()
    }

    #[test]
    fn same_fields_same_digest() {
        assert_eq!(two("degen", "hodler"), two("degen", "hodler"));
    }

    #[test]
    fn field_order_matters() {
        assert_ne!(two("degen", "hodler"), two("hodler", "degen"));
    }

    #[test]
    fn known_digest() {
        let expected = "f7b64a2913af6824915c51a9cfa71735cb666e9de9c2666b805f980a7a4d05c2";
        assert_eq!(to_hex(&two("degen", "hodler")), expected);
    }

    #[test]
    fn quoting_keeps_field_boundaries() {
        assert_ne!(two("ab", "c"), two("a", "bc"));
    }

    #[test]
    fn object_key_order_does_not_matter() {
        let a = json!({ "x": 1, "y": [1, 2] });
        let b: Value = serde_json::from_str(r#"{"y":[1,2],"x":1}"#).unwrap();
        let ha = block_hash(10, "prev", &a, 0, 1).unwrap();
        let hb = block_hash(10, "prev", &b, 0, 1).unwrap();
        assert_eq!(ha, hb);
    }

    #[test]
    fn genesis_hash_matches_its_fields() {
        let hash = block_hash(
            GENESIS_TIMESTAMP,
            GENESIS_LAST_HASH,
            &json!([]),
            GENESIS_NONCE,
            GENESIS_DIFFICULTY,
        )
        .unwrap();
        assert_eq!(to_hex(&hash), GENESIS_HASH);
        assert_eq!(GENESIS_HASH.len(), HASH_HEX_SIZE);
    }

    #[test]
    fn unserializable_field_is_an_error() {
        let mut bad: HashMap<(u8, u8), u8> = HashMap::new();
        bad.insert((1, 2), 3);
        let res = FieldHasher::new().field(&bad);
        assert!(matches!(res, Err(crate::LedgerError::Serialization(_))));
    }

    #[test]
    fn every_field_changes_the_digest() {
        let data = json!("payload");
        let base = block_hash(1_000, "abc", &data, 7, 3).unwrap();
        assert_ne!(base, block_hash(1_001, "abc", &data, 7, 3).unwrap());
        assert_ne!(base, block_hash(1_000, "abd", &data, 7, 3).unwrap());
        assert_ne!(base, block_hash(1_000, "abc", &json!("other"), 7, 3).unwrap());
        assert_ne!(base, block_hash(1_000, "abc", &data, 8, 3).unwrap());
        assert_ne!(base, block_hash(1_000, "abc", &data, 7, 4).unwrap());
    }
}
