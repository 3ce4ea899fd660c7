//! Ledger node
//!
//! Loads settings and chain parameters, then checks the stored chain before
//! the node starts processing blocks.
//!
//! Usage: `ledger-node [settings.json] [--validate-all]`

use ledger_core::consensus::params::install;
use ledger_core::consensus::{ChainLinkageVerifier, ChainParameters};
use ledger_core::node::{
    ChainIndexProcessor, ChainIntegrityChecker, IntegrityOutcome, JsonStateExporter, NodeSettings,
    RebuildCoordinator, SnapshotImporter,
};
use ledger_core::p2p::SeedPeerInstaller;
use ledger_core::storage::{BlockRepository, StoreManager};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_SETTINGS_PATH: &str = "settings.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut settings_path = DEFAULT_SETTINGS_PATH.to_string();
    let mut validate_all = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--validate-all" => validate_all = true,
            path => settings_path = path.to_string(),
        }
    }

    let settings = NodeSettings::load_file(&settings_path)?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let params = match ChainParameters::load_file(&settings.chain_config_path) {
        Ok(params) => install(params)?,
        Err(e) => {
            error!(path = %settings.chain_config_path.display(), error = %e, "Unable to load chain parameters");
            return Err(e.into());
        }
    };
    info!(
        test_chain = params.is_test_chain(),
        max_level = params.max_level(),
        genesis_allocation = params.genesis_info().total_allocation(),
        "Chain parameters loaded"
    );

    let manager = StoreManager::open(&settings.data_dir)?;
    let processor = ChainIndexProcessor;
    let bootstrapper = SnapshotImporter::new(manager.clone(), &settings.bootstrap_snapshot_path);
    let seeder = SeedPeerInstaller::new(settings.testnet);
    let exporter = JsonStateExporter::new(&settings.backup_dir);

    let rebuilder = RebuildCoordinator::new(
        params,
        &settings,
        &manager,
        &processor,
        &bootstrapper,
        &seeder,
    );
    let checker = ChainIntegrityChecker::new(params, &settings, &manager, rebuilder, &exporter);

    match checker.validate()? {
        IntegrityOutcome::Rebuilt => info!("Chain rebuilt"),
        IntegrityOutcome::Verified {
            tip_height,
            detached: Some(block),
        } => warn!(
            tip_height,
            detached_height = block.height,
            "Chain has a detached block, bootstrap or resync recommended"
        ),
        IntegrityOutcome::Verified { tip_height, .. } => info!(tip_height, "Chain verified"),
    }

    if validate_all {
        let repository = manager.open_store()?;
        let tip_height = repository.get_tip()?.map_or(0, |tip| tip.height);
        let floor = settings.verification_floor(tip_height);
        info!(from = tip_height, to = floor, "Validating chain linkage");
        ChainLinkageVerifier::new(&repository, floor).validate_all_blocks()?;
        info!("Chain linkage valid");
    }

    Ok(())
}
