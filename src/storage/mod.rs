//! Storage module - block repository interface and its sled implementation

pub mod db;

use thiserror::Error;

use crate::consensus::Block;
use crate::crypto::BlockSignature;

pub use db::{ChainStore, StoreManager};

/// Chain data errors raised by linkage verification, rebuild and orphaning
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Block at height {0} is missing from both primary and archive storage")]
    MissingBlock(u32),
    #[error("Broken chain at height {height}: reference {expected} does not match parent signature {actual}")]
    BrokenChain {
        height: u32,
        expected: BlockSignature,
        actual: BlockSignature,
    },
    #[error("Unable to orphan block at height {height}: {reason}")]
    UndoFailed { height: u32, reason: String },
    #[error("Unable to commit repository at height {height}: {reason}")]
    StorageCommitFailed { height: u32, reason: String },
    #[error("Repository error: {0}")]
    Repository(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Bootstrap failed: {0}")]
    Bootstrap(String),
    #[error("Unable to export node-local state: {0}")]
    Export(String),
}

impl From<sled::Error> for DataError {
    fn from(e: sled::Error) -> Self {
        DataError::Repository(e.to_string())
    }
}

impl From<bincode::Error> for DataError {
    fn from(e: bincode::Error) -> Self {
        DataError::Serialization(e.to_string())
    }
}

/// Block storage as seen by the consensus core.
///
/// Writes (`save_block`, `remove_block`, `save_peers`) are staged and only
/// become visible on `commit`. `discard` drops anything staged.
pub trait BlockRepository {
    /// Highest stored block
    fn get_tip(&self) -> Result<Option<Block>, DataError>;

    fn get_by_height(&self, height: u32) -> Result<Option<Block>, DataError>;

    /// Height of the block with `signature`, in primary storage
    fn get_height_for(&self, signature: &BlockSignature) -> Result<Option<u32>, DataError>;

    /// Block from the archive, for pruned or archived chains
    fn archive_get_by_height(&self, height: u32) -> Result<Option<Block>, DataError>;

    /// First block at or above `start_height` whose reference does not
    /// resolve to any known block
    fn detect_detached(&self, start_height: u32) -> Result<Option<Block>, DataError>;

    fn save_block(&mut self, block: &Block) -> Result<(), DataError>;

    fn remove_block(&mut self, block: &Block) -> Result<(), DataError>;

    fn save_peers(&mut self, peers: &[String]) -> Result<(), DataError>;

    fn commit(&mut self) -> Result<(), DataError>;

    fn discard(&mut self) -> Result<(), DataError>;

    /// Whether storage was empty when this repository was opened
    fn is_pristine_at_open(&self) -> bool;

    /// Wipe all chain data
    fn full_rebuild(&mut self) -> Result<(), DataError>;

    /// Repository-level consistency check run at startup
    fn check_consistency(&self) -> Result<(), DataError>;

    /// Whether any minting-capable accounts are stored locally
    fn has_minting_accounts(&self) -> Result<bool, DataError>;

    /// Locally stored minting account keys, hex encoded
    fn minting_accounts(&self) -> Result<Vec<String>, DataError>;
}

/// Hands out repository handles. A fresh handle must be acquired after a
/// rebuild since earlier handles may be stale.
pub trait RepositoryManager {
    type Repository: BlockRepository;

    fn open_repository(&self) -> Result<Self::Repository, DataError>;
}
