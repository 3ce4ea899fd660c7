//! Node-local state backup
//!
//! Minting accounts live only on this node and are wiped by a full rebuild,
//! so they are written to a JSON file first.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

use crate::node::ports::NodeStateExporter;
use crate::storage::{BlockRepository, DataError};

pub const MINTING_ACCOUNTS_FILE: &str = "MintingAccounts.json";

/// Contents of the backup file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintingAccountsBackup {
    pub exported_at: u64,
    pub minting_accounts: Vec<String>,
}

/// Read a backup written by [`JsonStateExporter`]
pub fn read_backup<P: AsRef<Path>>(path: P) -> Result<MintingAccountsBackup, DataError> {
    let bytes = std::fs::read(path).map_err(|e| DataError::Export(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| DataError::Export(e.to_string()))
}

/// Writes minting accounts to `<backup_dir>/MintingAccounts.json`
#[derive(Debug, Clone)]
pub struct JsonStateExporter {
    backup_dir: PathBuf,
}

impl JsonStateExporter {
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
        }
    }

    pub fn backup_path(&self) -> PathBuf {
        self.backup_dir.join(MINTING_ACCOUNTS_FILE)
    }
}

impl NodeStateExporter for JsonStateExporter {
    fn export_node_local_state(&self, repository: &dyn BlockRepository) -> Result<(), DataError> {
        let backup = MintingAccountsBackup {
            exported_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
            minting_accounts: repository.minting_accounts()?,
        };

        let json =
            serde_json::to_vec_pretty(&backup).map_err(|e| DataError::Export(e.to_string()))?;
        std::fs::create_dir_all(&self.backup_dir).map_err(|e| DataError::Export(e.to_string()))?;

        let path = self.backup_path();
        std::fs::write(&path, json).map_err(|e| DataError::Export(e.to_string()))?;
        info!(
            accounts = backup.minting_accounts.len(),
            path = %path.display(),
            "Exported minting accounts"
        );
        Ok(())
    }
}
