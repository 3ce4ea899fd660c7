//! Genesis block generation
//!
//! The genesis block is fully determined by the genesis descriptor in the
//! chain configuration. Its signature is derived from the descriptor bytes,
//! so a stored block 1 can be checked against configuration without any
//! key material.

use serde::{Deserialize, Serialize};

use crate::consensus::Block;
use crate::crypto::{derive_signature, BlockSignature};

/// Initial balance credited by the genesis block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAllocation {
    pub recipient: String,
    pub amount: u64,
}

/// Genesis descriptor from the chain configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisInfo {
    pub version: u32,
    /// Milliseconds since Unix epoch
    pub timestamp: u64,
    #[serde(default)]
    pub allocations: Vec<GenesisAllocation>,
}

impl GenesisInfo {
    /// Canonical byte encoding used for the genesis signature
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.version.to_le_bytes());
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        bytes.extend_from_slice(&(self.allocations.len() as u32).to_le_bytes());
        for allocation in &self.allocations {
            bytes.extend_from_slice(&(allocation.recipient.len() as u32).to_le_bytes());
            bytes.extend_from_slice(allocation.recipient.as_bytes());
            bytes.extend_from_slice(&allocation.amount.to_le_bytes());
        }
        bytes
    }

    pub fn signature(&self) -> BlockSignature {
        derive_signature(&self.to_bytes())
    }

    /// Total amount allocated at genesis
    pub fn total_allocation(&self) -> u64 {
        self.allocations
            .iter()
            .fold(0u64, |acc, a| acc.saturating_add(a.amount))
    }
}

/// Create the genesis block described by `info`
pub fn create_genesis_block(info: &GenesisInfo) -> Block {
    Block::new(1, info.signature(), BlockSignature::zero(), info.timestamp)
}

/// Whether `block` is the genesis block described by `info`
pub fn is_genesis_block(info: &GenesisInfo, block: &Block) -> bool {
    block.height == 1 && block.signature == info.signature() && block.reference == BlockSignature::zero()
}
