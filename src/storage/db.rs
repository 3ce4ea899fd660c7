//! Database persistence layer using Sled
//!
//! Blocks are keyed by big-endian height so the last entry of the `blocks`
//! tree is always the chain tip. Writes are staged in memory and applied in
//! a single multi-tree transaction on commit.

use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use std::path::Path;

use crate::consensus::Block;
use crate::crypto::BlockSignature;
use crate::storage::{BlockRepository, DataError, RepositoryManager};

const BLOCKS_TREE: &str = "blocks";
const INDEX_TREE: &str = "block_index";
const ARCHIVE_TREE: &str = "archive";
const ARCHIVE_INDEX_TREE: &str = "archive_index";
const PEERS_TREE: &str = "peers";
const MINTING_TREE: &str = "minting_accounts";

fn height_key(height: u32) -> Vec<u8> {
    height.to_be_bytes().to_vec()
}

fn decode_height(bytes: &[u8]) -> Result<u32, DataError> {
    <[u8; 4]>::try_from(bytes)
        .map(u32::from_be_bytes)
        .map_err(|_| DataError::Repository("corrupt height entry".to_string()))
}

/// A write waiting for commit
#[derive(Debug, Clone)]
enum PendingOp {
    PutBlock {
        height: u32,
        signature: Vec<u8>,
        bytes: Vec<u8>,
    },
    RemoveBlock {
        height: u32,
        signature: Vec<u8>,
    },
    ArchiveBlock {
        height: u32,
        signature: Vec<u8>,
        bytes: Vec<u8>,
    },
    PutPeer(String),
}

/// Opens the database once and hands out repository handles
#[derive(Debug, Clone)]
pub struct StoreManager {
    db: Db,
    pristine: bool,
}

impl StoreManager {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        Self::from_db(sled::open(path)?)
    }

    /// In-memory database removed on drop
    pub fn temporary() -> Result<Self, DataError> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> Result<Self, DataError> {
        let pristine = db.open_tree(BLOCKS_TREE)?.is_empty();
        Ok(Self { db, pristine })
    }

    /// Handle on the current database contents
    pub fn open_store(&self) -> Result<ChainStore, DataError> {
        ChainStore::new(self.db.clone(), self.pristine)
    }

    /// Same database, as if freshly opened
    #[cfg(test)]
    pub(crate) fn reopen(&self) -> Result<Self, DataError> {
        Self::from_db(self.db.clone())
    }
}

impl RepositoryManager for StoreManager {
    type Repository = ChainStore;

    fn open_repository(&self) -> Result<ChainStore, DataError> {
        self.open_store()
    }
}

/// Repository handle
#[derive(Debug, Clone)]
pub struct ChainStore {
    db: Db,
    blocks_tree: Tree,
    index_tree: Tree,
    archive_tree: Tree,
    archive_index_tree: Tree,
    peers_tree: Tree,
    minting_tree: Tree,
    pristine: bool,
    pending: Vec<PendingOp>,
}

impl ChainStore {
    fn new(db: Db, pristine: bool) -> Result<Self, DataError> {
        Ok(Self {
            blocks_tree: db.open_tree(BLOCKS_TREE)?,
            index_tree: db.open_tree(INDEX_TREE)?,
            archive_tree: db.open_tree(ARCHIVE_TREE)?,
            archive_index_tree: db.open_tree(ARCHIVE_INDEX_TREE)?,
            peers_tree: db.open_tree(PEERS_TREE)?,
            minting_tree: db.open_tree(MINTING_TREE)?,
            db,
            pristine,
            pending: Vec::new(),
        })
    }

    /// Number of blocks in primary storage
    pub fn block_count(&self) -> usize {
        self.blocks_tree.len()
    }

    /// Number of writes staged for the next commit
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Stage moving every primary block below `height` into the archive.
    /// Returns the number of blocks staged.
    pub fn archive_blocks_below(&mut self, height: u32) -> Result<usize, DataError> {
        let mut staged = 0;
        for item in self.blocks_tree.range(..height_key(height)) {
            let (_, bytes) = item?;
            let block = Block::from_bytes(&bytes)?;
            self.pending.push(PendingOp::ArchiveBlock {
                height: block.height,
                signature: block.signature.0.clone(),
                bytes: bytes.to_vec(),
            });
            staged += 1;
        }
        Ok(staged)
    }

    /// Record a local minting account (public key, hex). Written immediately.
    pub fn add_minting_account(&self, public_key_hex: &str) -> Result<(), DataError> {
        self.minting_tree
            .insert(public_key_hex.as_bytes(), &[] as &[u8])?;
        self.db.flush()?;
        Ok(())
    }

    /// Stored peer addresses
    pub fn peers(&self) -> Result<Vec<String>, DataError> {
        let mut peers = Vec::new();
        for item in self.peers_tree.iter() {
            let (key, _) = item?;
            peers.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(peers)
    }

    fn is_known_signature(&self, signature: &BlockSignature) -> Result<bool, DataError> {
        Ok(self.index_tree.contains_key(signature.as_bytes())?
            || self.archive_index_tree.contains_key(signature.as_bytes())?)
    }
}

impl BlockRepository for ChainStore {
    fn get_tip(&self) -> Result<Option<Block>, DataError> {
        match self.blocks_tree.last()? {
            Some((_, bytes)) => Ok(Some(Block::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    fn get_by_height(&self, height: u32) -> Result<Option<Block>, DataError> {
        match self.blocks_tree.get(height_key(height))? {
            Some(bytes) => Ok(Some(Block::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    fn get_height_for(&self, signature: &BlockSignature) -> Result<Option<u32>, DataError> {
        match self.index_tree.get(signature.as_bytes())? {
            Some(bytes) => Ok(Some(decode_height(&bytes)?)),
            None => Ok(None),
        }
    }

    fn archive_get_by_height(&self, height: u32) -> Result<Option<Block>, DataError> {
        match self.archive_tree.get(height_key(height))? {
            Some(bytes) => Ok(Some(Block::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    fn detect_detached(&self, start_height: u32) -> Result<Option<Block>, DataError> {
        // Genesis has no parent to resolve
        let from = start_height.max(2);
        for item in self.blocks_tree.range(height_key(from)..) {
            let (_, bytes) = item?;
            let block = Block::from_bytes(&bytes)?;
            if !self.is_known_signature(&block.reference)? {
                return Ok(Some(block));
            }
        }
        Ok(None)
    }

    fn save_block(&mut self, block: &Block) -> Result<(), DataError> {
        self.pending.push(PendingOp::PutBlock {
            height: block.height,
            signature: block.signature.0.clone(),
            bytes: block.to_bytes()?,
        });
        Ok(())
    }

    fn remove_block(&mut self, block: &Block) -> Result<(), DataError> {
        self.pending.push(PendingOp::RemoveBlock {
            height: block.height,
            signature: block.signature.0.clone(),
        });
        Ok(())
    }

    fn save_peers(&mut self, peers: &[String]) -> Result<(), DataError> {
        self.pending
            .extend(peers.iter().cloned().map(PendingOp::PutPeer));
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DataError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let pending = &self.pending;
        let result: Result<(), TransactionError<()>> = (
            &self.blocks_tree,
            &self.index_tree,
            &self.archive_tree,
            &self.archive_index_tree,
            &self.peers_tree,
        )
            .transaction(|(blocks, index, archive, archive_index, peers)| {
                for op in pending {
                    match op {
                        PendingOp::PutBlock { height, signature, bytes } => {
                            blocks.insert(height_key(*height), bytes.clone())?;
                            index.insert(signature.clone(), height_key(*height))?;
                        }
                        PendingOp::RemoveBlock { height, signature } => {
                            blocks.remove(height_key(*height))?;
                            index.remove(signature.clone())?;
                        }
                        PendingOp::ArchiveBlock { height, signature, bytes } => {
                            blocks.remove(height_key(*height))?;
                            index.remove(signature.clone())?;
                            archive.insert(height_key(*height), bytes.clone())?;
                            archive_index.insert(signature.clone(), height_key(*height))?;
                        }
                        PendingOp::PutPeer(addr) => {
                            peers.insert(addr.as_bytes(), &[] as &[u8])?;
                        }
                    }
                }
                Ok::<(), ConflictableTransactionError<()>>(())
            });

        result.map_err(|e| DataError::Repository(format!("transaction failed: {:?}", e)))?;
        self.pending.clear();
        self.db.flush()?;
        Ok(())
    }

    fn discard(&mut self) -> Result<(), DataError> {
        self.pending.clear();
        Ok(())
    }

    fn is_pristine_at_open(&self) -> bool {
        self.pristine
    }

    fn full_rebuild(&mut self) -> Result<(), DataError> {
        self.pending.clear();
        for tree in [
            &self.blocks_tree,
            &self.index_tree,
            &self.archive_tree,
            &self.archive_index_tree,
            &self.peers_tree,
            &self.minting_tree,
        ] {
            tree.clear()?;
        }
        self.db.flush()?;
        Ok(())
    }

    fn check_consistency(&self) -> Result<(), DataError> {
        let mut expected_height: Option<u32> = None;
        for item in self.blocks_tree.iter() {
            let (key, bytes) = item?;
            let height = decode_height(&key)?;
            let block = Block::from_bytes(&bytes)?;

            if block.height != height {
                return Err(DataError::Repository(format!(
                    "block stored under height {} claims height {}",
                    height, block.height
                )));
            }
            if let Some(expected) = expected_height {
                if height != expected {
                    return Err(DataError::Repository(format!(
                        "gap in stored blocks: expected height {}, found {}",
                        expected, height
                    )));
                }
            }
            if self.get_height_for(&block.signature)? != Some(height) {
                return Err(DataError::Repository(format!(
                    "block {} missing from signature index",
                    height
                )));
            }
            expected_height = height.checked_add(1);
        }

        if self.index_tree.len() != self.blocks_tree.len() {
            return Err(DataError::Repository(format!(
                "signature index has {} entries for {} blocks",
                self.index_tree.len(),
                self.blocks_tree.len()
            )));
        }
        Ok(())
    }

    fn has_minting_accounts(&self) -> Result<bool, DataError> {
        Ok(!self.minting_tree.is_empty())
    }

    fn minting_accounts(&self) -> Result<Vec<String>, DataError> {
        let mut accounts = Vec::new();
        for item in self.minting_tree.iter() {
            let (key, _) = item?;
            accounts.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(accounts)
    }
}
