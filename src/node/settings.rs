//! Node operating settings
//!
//! Read from a JSON settings file. Every field has a default, so an empty
//! object is a valid settings file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::consensus::ConfigError;

/// Blocks scanned for detached references on a full-history node
pub const FULL_NODE_VALIDATION_WINDOW: u32 = 1440;

/// Margin kept below the prune limit when sizing the validation window
const PRUNE_WINDOW_MARGIN: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeSettings {
    pub data_dir: PathBuf,
    pub chain_config_path: PathBuf,
    /// Pruned node: only recent history is kept
    pub top_only: bool,
    pub archive_enabled: bool,
    pub bootstrap_allowed: bool,
    pub prune_block_limit: u32,
    /// Lowest height walked by full linkage verification. When unset it is
    /// derived from the pruning mode.
    pub verification_floor_height: Option<u32>,
    pub bootstrap_snapshot_path: PathBuf,
    pub backup_dir: PathBuf,
    pub testnet: bool,
    pub log_filter: String,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("db"),
            chain_config_path: PathBuf::from("resources/blockchain.json"),
            top_only: false,
            archive_enabled: true,
            bootstrap_allowed: true,
            prune_block_limit: 1450,
            verification_floor_height: None,
            bootstrap_snapshot_path: PathBuf::from("bootstrap/snapshot.bin"),
            backup_dir: PathBuf::from("backups"),
            testnet: false,
            log_filter: "info".to_string(),
        }
    }
}

impl NodeSettings {
    pub fn load(source: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(source).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// Load settings, falling back to defaults if the file does not exist
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&std::fs::read_to_string(path)?)
    }

    /// Number of blocks below the tip scanned for detached references at startup
    pub fn validation_window(&self) -> u32 {
        if self.top_only || self.archive_enabled {
            self.prune_block_limit.saturating_sub(PRUNE_WINDOW_MARGIN)
        } else {
            FULL_NODE_VALIDATION_WINDOW
        }
    }

    /// Lowest height full linkage verification walks down to
    pub fn verification_floor(&self, tip_height: u32) -> u32 {
        match self.verification_floor_height {
            Some(floor) => floor.max(1),
            None if self.top_only => tip_height.saturating_sub(self.prune_block_limit).max(1),
            None => 1,
        }
    }
}
