//! Node module - startup integrity, rebuild, rollback and their collaborators

pub mod backup;
pub mod bootstrap;
mod genesis;
pub mod integrity;
pub mod orphan;
pub mod ports;
pub mod rebuild;
pub mod settings;

pub use backup::JsonStateExporter;
pub use bootstrap::{create_snapshot, SnapshotImporter};
pub use genesis::*;
pub use integrity::{ChainIntegrityChecker, IntegrityOutcome};
pub use orphan::{ChainLock, ChainLockGuard, OrphanController};
pub use ports::{
    BlockProcessor, Bootstrapper, ChainIndexProcessor, NodeStateExporter, OrphanObserver,
    PeerSeeder,
};
pub use rebuild::RebuildCoordinator;
pub use settings::NodeSettings;
