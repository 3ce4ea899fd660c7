//! Chain rebuild
//!
//! Replaces the local chain entirely, either by importing a bootstrap
//! snapshot or by rewriting storage from the genesis block. There is no
//! partial success: the chain either ends up usable or the node does not
//! start.

use tracing::info;

use crate::consensus::ChainParameters;
use crate::node::genesis::create_genesis_block;
use crate::node::ports::{BlockProcessor, Bootstrapper, PeerSeeder};
use crate::node::settings::NodeSettings;
use crate::storage::{BlockRepository, DataError, RepositoryManager};

pub struct RebuildCoordinator<'a, M: RepositoryManager> {
    params: &'a ChainParameters,
    settings: &'a NodeSettings,
    manager: &'a M,
    processor: &'a dyn BlockProcessor,
    bootstrapper: &'a dyn Bootstrapper,
    seeder: &'a dyn PeerSeeder,
}

impl<'a, M: RepositoryManager> RebuildCoordinator<'a, M> {
    pub fn new(
        params: &'a ChainParameters,
        settings: &'a NodeSettings,
        manager: &'a M,
        processor: &'a dyn BlockProcessor,
        bootstrapper: &'a dyn Bootstrapper,
        seeder: &'a dyn PeerSeeder,
    ) -> Self {
        Self {
            params,
            settings,
            manager,
            processor,
            bootstrapper,
            seeder,
        }
    }

    pub fn rebuild(&self) -> Result<(), DataError> {
        if self.settings.bootstrap_allowed {
            info!("Rebuilding chain from bootstrap snapshot");
            return self.bootstrapper.import_snapshot();
        }

        info!("Rebuilding chain from genesis");
        let mut repository = self.manager.open_repository()?;
        if !repository.is_pristine_at_open() {
            info!("Wiping existing chain data");
            repository.full_rebuild()?;
        }

        let genesis = create_genesis_block(self.params.genesis_info());
        self.processor.apply(&mut repository, &genesis)?;
        repository.commit()?;

        self.seeder.install_initial_peers(&mut repository)?;
        repository.commit()?;

        info!(signature = %genesis.signature.short(), "Chain rebuilt with genesis block");
        Ok(())
    }
}
