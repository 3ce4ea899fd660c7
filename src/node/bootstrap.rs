//! Bootstrap snapshots
//!
//! A snapshot is the bincode encoding of every retained block, lowest
//! height first. Importing one replaces the local chain; the imported chain
//! is linkage-verified before the import is reported as successful.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::consensus::{fetch_block, Block, ChainLinkageVerifier};
use crate::node::ports::Bootstrapper;
use crate::storage::{BlockRepository, DataError, RepositoryManager};

/// Write every block from `from_height` to the tip into a snapshot file.
/// Returns the number of blocks written.
pub fn create_snapshot<R, P>(repository: &R, from_height: u32, path: P) -> Result<usize, DataError>
where
    R: BlockRepository + ?Sized,
    P: AsRef<Path>,
{
    let tip_height = repository.get_tip()?.map_or(0, |tip| tip.height);
    let mut blocks = Vec::new();
    for height in from_height.max(1)..=tip_height {
        blocks.push(fetch_block(repository, height)?.ok_or(DataError::MissingBlock(height))?);
    }

    let bytes = bincode::serialize(&blocks)?;
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent).map_err(|e| DataError::Bootstrap(e.to_string()))?;
    }
    std::fs::write(path.as_ref(), bytes).map_err(|e| DataError::Bootstrap(e.to_string()))?;
    info!(blocks = blocks.len(), path = %path.as_ref().display(), "Snapshot created");
    Ok(blocks.len())
}

/// Imports a snapshot file into storage
pub struct SnapshotImporter<M: RepositoryManager> {
    manager: M,
    snapshot_path: PathBuf,
}

impl<M: RepositoryManager> SnapshotImporter<M> {
    pub fn new(manager: M, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            manager,
            snapshot_path: snapshot_path.into(),
        }
    }

    fn read_snapshot(&self) -> Result<Vec<Block>, DataError> {
        let bytes = std::fs::read(&self.snapshot_path).map_err(|e| {
            DataError::Bootstrap(format!(
                "unable to read {}: {}",
                self.snapshot_path.display(),
                e
            ))
        })?;
        let blocks: Vec<Block> = bincode::deserialize(&bytes)?;
        if blocks.is_empty() {
            return Err(DataError::Bootstrap("snapshot contains no blocks".to_string()));
        }
        Ok(blocks)
    }
}

impl<M> Bootstrapper for SnapshotImporter<M>
where
    M: RepositoryManager + Send + Sync,
{
    fn import_snapshot(&self) -> Result<(), DataError> {
        let blocks = self.read_snapshot()?;
        let floor_height = blocks[0].height;
        let tip_height = blocks[blocks.len() - 1].height;
        info!(
            blocks = blocks.len(),
            path = %self.snapshot_path.display(),
            "Importing bootstrap snapshot"
        );

        let mut repository = self.manager.open_repository()?;
        repository.full_rebuild()?;
        for block in &blocks {
            repository.save_block(block)?;
        }
        repository.commit()?;

        ChainLinkageVerifier::new(&repository, floor_height)
            .validate_all_blocks()
            .map_err(|e| DataError::Bootstrap(format!("imported chain is invalid: {}", e)))?;

        info!(tip = tip_height, blocks = blocks.len(), "Bootstrap snapshot imported");
        Ok(())
    }
}
