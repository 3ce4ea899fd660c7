//! Block structure as seen by the consensus core
//!
//! Only the fields needed for linkage and economics are modelled here;
//! transaction payloads belong to block processing.

use serde::{Deserialize, Serialize};
use crate::crypto::BlockSignature;

/// A stored block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    /// Height in the chain (genesis is 1)
    pub height: u32,
    /// Block identity
    pub signature: BlockSignature,
    /// Signature of the parent block
    pub reference: BlockSignature,
    /// Block timestamp (milliseconds since Unix epoch)
    pub timestamp: u64,
}

impl Block {
    /// Create a new block
    pub fn new(
        height: u32,
        signature: BlockSignature,
        reference: BlockSignature,
        timestamp: u64,
    ) -> Self {
        Self {
            height,
            signature,
            reference,
            timestamp,
        }
    }

    /// Check whether `parent` is the block this one references
    pub fn is_child_of(&self, parent: &Block) -> bool {
        self.reference == parent.signature
    }

    /// Serialize for storage
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from storage
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}
