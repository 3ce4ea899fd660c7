//! Chain linkage validation
//!
//! Exhaustive walk from the tip down to the oldest retained block checking
//! that every block's parent reference matches the signature of the block
//! below it. O(chain length): a maintenance and audit operation, not part
//! of block processing.

use tracing::{info, warn};

use crate::consensus::Block;
use crate::storage::{BlockRepository, DataError};

/// Fetch a block from primary storage, falling back to the archive
pub fn fetch_block<R>(repository: &R, height: u32) -> Result<Option<Block>, DataError>
where
    R: BlockRepository + ?Sized,
{
    match repository.get_by_height(height)? {
        Some(block) => Ok(Some(block)),
        None => repository.archive_get_by_height(height),
    }
}

/// Verifies parent linkage of every retained block
pub struct ChainLinkageVerifier<'a, R: BlockRepository + ?Sized> {
    repository: &'a R,
    floor_height: u32,
}

impl<'a, R: BlockRepository + ?Sized> ChainLinkageVerifier<'a, R> {
    /// `floor_height` is the lowest height walked (1 for a full chain)
    pub fn new(repository: &'a R, floor_height: u32) -> Self {
        Self {
            repository,
            floor_height: floor_height.max(1),
        }
    }

    /// Walk tip to floor.
    ///
    /// A broken link is reported at the height of the block whose
    /// reference does not match its parent.
    pub fn validate_all_blocks(&self) -> Result<(), DataError> {
        let Some(tip) = self.repository.get_tip()? else {
            info!("No blocks stored, nothing to validate");
            return Ok(());
        };

        let tip_height = tip.height;
        let mut child = tip;
        for height in (self.floor_height..tip_height).rev() {
            let block = fetch_block(self.repository, height)?
                .ok_or(DataError::MissingBlock(height))?;

            if !child.is_child_of(&block) {
                warn!(
                    height = child.height,
                    expected = %child.reference.short(),
                    actual = %block.signature.short(),
                    "Broken chain linkage"
                );
                return Err(DataError::BrokenChain {
                    height: child.height,
                    expected: child.reference,
                    actual: block.signature,
                });
            }
            child = block;
        }

        info!(
            from = tip_height,
            to = self.floor_height.min(tip_height),
            "Chain linkage verified"
        );
        Ok(())
    }
}
