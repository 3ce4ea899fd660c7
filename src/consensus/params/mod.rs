//! Chain parameters
//!
//! Consensus constants, economic tables and feature triggers. Loaded once
//! from the chain configuration document, validated, derived, and then
//! shared read-only for the lifetime of the process.

mod derive;
mod validate;

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consensus::features::{FeatureName, FeatureTriggers};
use crate::node::GenesisInfo;

pub use derive::derive;

/// Total of all reward shares, in parts per 100,000,000
pub const SHARE_DENOMINATOR: u64 = 100_000_000;

/// Chain configuration errors. Always fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Malformed chain configuration: {0}")]
    Malformed(String),
    #[error("Invalid or missing chain configuration field: {0}")]
    Invalid(String),
    #[error("Illegal state: {0}")]
    IllegalState(String),
    #[error("Unable to read chain configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Chain parameters have already been installed")]
    AlreadyInstalled,
}

/// Block reward from `height` onwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardByHeight {
    pub height: u32,
    pub reward: u64,
}

/// Group of account levels sharing one block-reward percentage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareBin {
    pub levels: BTreeSet<u32>,
    /// Parts per 100,000,000
    pub share: u64,
}

/// Block timing from `height` onwards
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockTiming {
    pub height: u32,
    #[serde(rename = "target")]
    pub target_ms: u64,
    #[serde(rename = "deviation")]
    pub deviation_ms: u64,
    pub power: f64,
}

/// Name registration fee from `timestamp` onwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFeeAtTimestamp {
    pub timestamp: u64,
    pub fee: u64,
}

/// AT execution costs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtSettings {
    pub fee_per_step: u64,
    pub max_steps_per_round: u32,
    pub steps_per_function_call: u32,
    pub minutes_per_block: u32,
}

/// Chain configuration document as parsed, before validation.
///
/// Fields checked for presence by the validator are optional here, scalars
/// checked for positivity default to zero.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawChainParameters {
    #[serde(default)]
    pub is_test_chain: bool,
    #[serde(default, rename = "transactionExpiryPeriod")]
    pub transaction_expiry_period_ms: u64,
    pub unit_fee: u64,
    pub max_bytes_per_unit_fee: u32,
    #[serde(default, rename = "blockTimestampMargin")]
    pub block_timestamp_margin_ms: u64,
    #[serde(default, rename = "maxBlockSize")]
    pub max_block_size_bytes: u32,
    #[serde(default)]
    pub require_group_for_approval: bool,
    #[serde(default, rename = "useBrokenMD160ForAddresses")]
    pub use_broken_address_hash: bool,
    #[serde(default)]
    pub one_name_per_account: bool,
    pub min_account_level_to_mint: u32,
    #[serde(rename = "minAccountLevelForBlockSubmissions")]
    pub min_account_level_for_block_submission: u32,
    #[serde(default)]
    pub min_account_level_to_reward_share: u32,
    pub max_reward_shares_per_minter: u32,
    #[serde(default)]
    pub founder_effective_minting_level: u32,
    #[serde(rename = "onlineAccountSignaturesMinLifetime")]
    pub online_account_signatures_min_lifetime_ms: u64,
    #[serde(rename = "onlineAccountSignaturesMaxLifetime")]
    pub online_account_signatures_max_lifetime_ms: u64,
    pub genesis_info: Option<GenesisInfo>,
    pub rewards_by_height: Option<Vec<RewardByHeight>>,
    pub shares_by_level: Option<Vec<ShareBin>>,
    pub qora_holders_share: Option<u64>,
    pub qora_per_qort_reward: Option<u64>,
    pub blocks_needed_by_level: Option<Vec<u32>>,
    pub block_timings_by_height: Option<Vec<BlockTiming>>,
    #[serde(default)]
    pub name_registration_unit_fees: Vec<UnitFeeAtTimestamp>,
    #[serde(rename = "ciyamAtSettings")]
    pub at_settings: Option<AtSettings>,
    pub feature_triggers: Option<HashMap<String, u64>>,
}

/// Validated, derived chain parameters
#[derive(Debug, Clone)]
pub struct ChainParameters {
    is_test_chain: bool,
    transaction_expiry_period_ms: u64,
    unit_fee: u64,
    max_bytes_per_unit_fee: u32,
    block_timestamp_margin_ms: u64,
    max_block_size_bytes: u32,
    require_group_for_approval: bool,
    use_broken_address_hash: bool,
    one_name_per_account: bool,
    min_account_level_to_mint: u32,
    min_account_level_for_block_submission: u32,
    min_account_level_to_reward_share: u32,
    max_reward_shares_per_minter: u32,
    founder_effective_minting_level: u32,
    online_account_signatures_min_lifetime_ms: u64,
    online_account_signatures_max_lifetime_ms: u64,
    genesis: GenesisInfo,
    feature_triggers: FeatureTriggers,
    rewards_by_height: Vec<RewardByHeight>,
    shares_by_level: Vec<ShareBin>,
    blocks_needed_by_level: Vec<u32>,
    block_timings_by_height: Vec<BlockTiming>,
    name_registration_unit_fees: Vec<UnitFeeAtTimestamp>,
    qora_holders_share: u64,
    qora_per_qort_reward: u64,
    at_settings: AtSettings,
    // Derived
    cumulative_blocks_by_level: Vec<u32>,
    share_bin_by_level: Vec<Option<usize>>,
}

static INSTALLED: OnceLock<ChainParameters> = OnceLock::new();

/// Install the process-wide chain parameters. May only succeed once.
pub fn install(params: ChainParameters) -> Result<&'static ChainParameters, ConfigError> {
    INSTALLED
        .set(params)
        .map_err(|_| ConfigError::AlreadyInstalled)?;
    installed().ok_or_else(|| ConfigError::IllegalState("chain parameters not installed".into()))
}

/// The process-wide chain parameters, if installed
pub fn installed() -> Option<&'static ChainParameters> {
    INSTALLED.get()
}

impl ChainParameters {
    /// Parse, validate and derive chain parameters from a JSON document
    pub fn load(source: &str) -> Result<Self, ConfigError> {
        let raw: RawChainParameters =
            serde_json::from_str(source).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        let mut params = validate::validate(raw)?;
        derive(&mut params);
        Ok(params)
    }

    /// Load chain parameters from a JSON file
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::load(&source)
    }

    pub fn is_test_chain(&self) -> bool {
        self.is_test_chain
    }

    pub fn transaction_expiry_period_ms(&self) -> u64 {
        self.transaction_expiry_period_ms
    }

    pub fn unit_fee(&self) -> u64 {
        self.unit_fee
    }

    pub fn max_bytes_per_unit_fee(&self) -> u32 {
        self.max_bytes_per_unit_fee
    }

    pub fn block_timestamp_margin_ms(&self) -> u64 {
        self.block_timestamp_margin_ms
    }

    pub fn max_block_size_bytes(&self) -> u32 {
        self.max_block_size_bytes
    }

    pub fn require_group_for_approval(&self) -> bool {
        self.require_group_for_approval
    }

    pub fn use_broken_address_hash(&self) -> bool {
        self.use_broken_address_hash
    }

    pub fn one_name_per_account(&self) -> bool {
        self.one_name_per_account
    }

    pub fn min_account_level_to_mint(&self) -> u32 {
        self.min_account_level_to_mint
    }

    pub fn min_account_level_for_block_submission(&self) -> u32 {
        self.min_account_level_for_block_submission
    }

    pub fn min_account_level_to_reward_share(&self) -> u32 {
        self.min_account_level_to_reward_share
    }

    pub fn max_reward_shares_per_minter(&self) -> u32 {
        self.max_reward_shares_per_minter
    }

    pub fn founder_effective_minting_level(&self) -> u32 {
        self.founder_effective_minting_level
    }

    pub fn online_account_signatures_min_lifetime_ms(&self) -> u64 {
        self.online_account_signatures_min_lifetime_ms
    }

    pub fn online_account_signatures_max_lifetime_ms(&self) -> u64 {
        self.online_account_signatures_max_lifetime_ms
    }

    pub fn genesis_info(&self) -> &GenesisInfo {
        &self.genesis
    }

    pub fn feature_triggers(&self) -> &FeatureTriggers {
        &self.feature_triggers
    }

    /// Raw trigger value (height or timestamp, depending on the feature)
    pub fn feature_trigger(&self, feature: FeatureName) -> u64 {
        self.feature_triggers.get(feature)
    }

    pub fn is_feature_active(&self, feature: FeatureName, height: u32, timestamp: u64) -> bool {
        self.feature_triggers.is_active(feature, height, timestamp)
    }

    pub fn rewards_by_height(&self) -> &[RewardByHeight] {
        &self.rewards_by_height
    }

    pub fn shares_by_level(&self) -> &[ShareBin] {
        &self.shares_by_level
    }

    pub fn blocks_needed_by_level(&self) -> &[u32] {
        &self.blocks_needed_by_level
    }

    pub fn block_timings_by_height(&self) -> &[BlockTiming] {
        &self.block_timings_by_height
    }

    pub fn name_registration_unit_fees(&self) -> &[UnitFeeAtTimestamp] {
        &self.name_registration_unit_fees
    }

    pub fn qora_holders_share(&self) -> u64 {
        self.qora_holders_share
    }

    pub fn qora_per_qort_reward(&self) -> u64 {
        self.qora_per_qort_reward
    }

    pub fn at_settings(&self) -> &AtSettings {
        &self.at_settings
    }

    pub fn cumulative_blocks_by_level(&self) -> &[u32] {
        &self.cumulative_blocks_by_level
    }

    /// Index into `shares_by_level` for each level, starting at level 1
    pub(crate) fn share_bin_by_level(&self) -> &[Option<usize>] {
        &self.share_bin_by_level
    }
}
