//! Ledger Consensus Core Library
//!
//! Chain parameters and their lookups, startup chain integrity checks,
//! chain rebuild and tip rollback for a block ledger node.

pub mod consensus;
pub mod crypto;
pub mod node;
pub mod p2p;
pub mod storage;

#[cfg(test)]
mod test_utils;

/// Protocol constants - HARD-CODED, NEVER CONFIGURABLE
pub mod constants {
    /// Mainnet seed nodes
    pub const SEED_NODES: &[&str] = &[
        "node1.ledger-core.org:12392",
        "node2.ledger-core.org:12392",
        "node3.ledger-core.org:12392",
    ];
}
