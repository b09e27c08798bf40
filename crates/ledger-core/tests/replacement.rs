use ledger_core::constants::{MINE_RATE_MS, MIN_DIFFICULTY};
use ledger_core::{adjust_difficulty, validate_chain, Block, Blockchain};
use serde_json::json;

fn node_with(data: &[&str]) -> anyhow::Result<Blockchain> {
    let mut node = Blockchain::new();
    for d in data {
        node.add_block(json!(d))?;
    }
    Ok(node)
}

#[test]
fn fresh_node_adopts_longer_peer_chain() -> anyhow::Result<()> {
    let mut a = Blockchain::new();
    let b = node_with(&["x", "y", "z"])?;
    assert_eq!(b.len(), 4);

    assert!(a.replace_chain(b.chain().to_vec()));
    assert_eq!(a.chain(), b.chain());
    Ok(())
}

#[test]
fn tampered_peer_chain_is_not_adopted() -> anyhow::Result<()> {
    let mut a = Blockchain::new();
    let mut chain = node_with(&["x", "y", "z"])?.into_chain();
    chain[2].hash = "tampered".into();

    assert!(!a.replace_chain(chain));
    assert_eq!(a.len(), 1);
    assert!(a.chain()[0].is_genesis());
    Ok(())
}

#[test]
fn shorter_or_equal_chain_is_not_adopted_even_if_valid() -> anyhow::Result<()> {
    let mut a = node_with(&["a1", "a2"])?;
    let before = a.chain().to_vec();

    let equal = node_with(&["b1", "b2"])?;
    assert!(validate_chain(equal.chain()));
    assert!(!a.replace_chain(equal.into_chain()));

    let shorter = node_with(&["c1"])?;
    assert!(!a.replace_chain(shorter.into_chain()));

    assert_eq!(a.chain(), before.as_slice());
    Ok(())
}

#[test]
fn nodes_converge_on_longest_chain() -> anyhow::Result<()> {
    let mut a = node_with(&["a"])?;
    let mut b = node_with(&["b1", "b2"])?;

    // a hears about b first; b later hears about a and keeps its own
    assert!(a.replace_chain(b.chain().to_vec()));
    assert!(!b.replace_chain(a.chain().to_vec()));
    assert_eq!(a.chain(), b.chain());

    a.add_block(json!("a3"))?;
    assert!(b.replace_chain(a.chain().to_vec()));
    assert_eq!(a.chain(), b.chain());
    Ok(())
}

#[test]
fn chain_survives_json_round_trip() -> anyhow::Result<()> {
    let node = node_with(&["x", "y"])?;
    let wire = serde_json::to_string(node.chain())?;
    let back: Vec<Block> = serde_json::from_str(&wire)?;
    assert!(validate_chain(&back));

    let mut peer = Blockchain::new();
    assert!(peer.replace_chain(back));
    assert_eq!(peer.chain(), node.chain());
    Ok(())
}

#[test]
fn difficulty_follows_mining_speed() {
    let base = Block {
        timestamp: 1_000_000,
        difficulty: 6,
        ..Block::genesis()
    };

    // fast: every block arrives well inside the target interval
    let mut last = base.clone();
    for _ in 0..5 {
        let ts = last.timestamp + MINE_RATE_MS / 4;
        let next = adjust_difficulty(&last, ts);
        assert!(next >= last.difficulty);
        last = Block { timestamp: ts, difficulty: next, ..last };
    }
    assert_eq!(last.difficulty, 11);

    // slow: every block overshoots the target interval
    let mut last = base;
    for _ in 0..10 {
        let ts = last.timestamp + MINE_RATE_MS * 3;
        let next = adjust_difficulty(&last, ts);
        assert!(next <= last.difficulty);
        assert!(next >= MIN_DIFFICULTY);
        last = Block { timestamp: ts, difficulty: next, ..last };
    }
    assert_eq!(last.difficulty, MIN_DIFFICULTY);
}
