//! Collaborators the consensus core drives but does not implement itself.

use tracing::debug;

use crate::consensus::Block;
use crate::storage::{BlockRepository, DataError};

/// Applies and reverses the ledger effects of a block.
pub trait BlockProcessor: Send + Sync {
    /// Process `block` on top of the current tip
    fn apply(&self, repository: &mut dyn BlockRepository, block: &Block) -> Result<(), DataError>;

    /// Reverse `block`, which must be the current tip
    fn undo(&self, repository: &mut dyn BlockRepository, block: &Block) -> Result<(), DataError>;
}

/// Imports a trusted chain snapshot in place of the local chain.
pub trait Bootstrapper: Send + Sync {
    fn import_snapshot(&self) -> Result<(), DataError>;
}

/// Installs the initial peer set into storage.
pub trait PeerSeeder: Send + Sync {
    fn install_initial_peers(&self, repository: &mut dyn BlockRepository) -> Result<(), DataError>;
}

/// Saves node-local sensitive state before a destructive rebuild.
pub trait NodeStateExporter: Send + Sync {
    fn export_node_local_state(&self, repository: &dyn BlockRepository) -> Result<(), DataError>;
}

/// Told about every block removed from the chain tip.
pub trait OrphanObserver: Send + Sync {
    fn on_block_orphaned(&self, height: u32, block: &Block);
}

/// Block processing limited to the chain index: apply stores the block,
/// undo removes it. Ledger state beyond the index is not tracked.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChainIndexProcessor;

impl BlockProcessor for ChainIndexProcessor {
    fn apply(&self, repository: &mut dyn BlockRepository, block: &Block) -> Result<(), DataError> {
        if let Some(tip) = repository.get_tip()? {
            if block.height != tip.height + 1 || !block.is_child_of(&tip) {
                return Err(DataError::BrokenChain {
                    height: block.height,
                    expected: block.reference.clone(),
                    actual: tip.signature,
                });
            }
        }
        debug!(height = block.height, signature = %block.signature.short(), "Applying block");
        repository.save_block(block)
    }

    fn undo(&self, repository: &mut dyn BlockRepository, block: &Block) -> Result<(), DataError> {
        match repository.get_tip()? {
            Some(tip) if tip.signature == block.signature => {
                debug!(height = block.height, signature = %block.signature.short(), "Undoing block");
                repository.remove_block(block)
            }
            _ => Err(DataError::UndoFailed {
                height: block.height,
                reason: "block is not the current tip".to_string(),
            }),
        }
    }
}
