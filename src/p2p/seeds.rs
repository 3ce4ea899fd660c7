//! Seed Node Configuration
//!
//! Initial peers written into storage when the chain is rebuilt from
//! genesis. New nodes connect to these first to discover the rest of the
//! network.

use tracing::info;

use crate::constants;
use crate::node::ports::PeerSeeder;
use crate::storage::{BlockRepository, DataError};

/// Testnet seed nodes (for development/testing)
pub const TESTNET_SEEDS: &[&str] = &["127.0.0.1:62392"];

/// Get seed nodes for the current network
pub fn get_seed_nodes(testnet: bool) -> Vec<&'static str> {
    if testnet {
        TESTNET_SEEDS.to_vec()
    } else {
        constants::SEED_NODES.to_vec()
    }
}

/// Split a seed into host and port. Hostnames are kept unresolved.
pub fn parse_seed(seed: &str) -> Option<(&str, u16)> {
    let (host, port) = seed.rsplit_once(':')?;
    if host.is_empty() {
        return None;
    }
    let port = port.parse().ok().filter(|p| *p != 0)?;
    Some((host, port))
}

/// Installs the built-in seed list for the configured network
#[derive(Debug, Clone, Copy)]
pub struct SeedPeerInstaller {
    testnet: bool,
}

impl SeedPeerInstaller {
    pub fn new(testnet: bool) -> Self {
        Self { testnet }
    }
}

impl PeerSeeder for SeedPeerInstaller {
    fn install_initial_peers(&self, repository: &mut dyn BlockRepository) -> Result<(), DataError> {
        let peers: Vec<String> = get_seed_nodes(self.testnet)
            .into_iter()
            .filter(|seed| parse_seed(seed).is_some())
            .map(str::to_string)
            .collect();
        info!(count = peers.len(), testnet = self.testnet, "Installing initial peers");
        repository.save_peers(&peers)
    }
}
