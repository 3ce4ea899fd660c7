//! Shared helpers for unit tests.

use crate::consensus::Block;
use crate::crypto::{derive_signature, BlockSignature};
use crate::storage::{BlockRepository, ChainStore, StoreManager};

/// A correctly linked chain of `len` blocks starting at height 1.
/// Block 1 is not the configured genesis block.
pub(crate) fn chain(len: u32) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    for height in 1..=len {
        let reference = blocks
            .last()
            .map(|b| b.signature.clone())
            .unwrap_or_else(BlockSignature::zero);
        let signature = derive_signature(&height.to_le_bytes());
        blocks.push(Block::new(height, signature, reference, 1000 * height as u64));
    }
    blocks
}

/// Temporary database seeded with `blocks`
pub(crate) fn seeded_store(blocks: &[Block]) -> (StoreManager, ChainStore) {
    let manager = StoreManager::temporary().unwrap();
    let mut store = manager.open_store().unwrap();
    for block in blocks {
        store.save_block(block).unwrap();
    }
    store.commit().unwrap();
    let manager = manager.reopen().unwrap();
    let store = manager.open_store().unwrap();
    (manager, store)
}
