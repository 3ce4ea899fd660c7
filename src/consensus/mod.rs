//! Consensus module - chain parameters, lookups, blocks and linkage validation

mod block;
pub mod features;
pub mod params;
mod rewards;
mod timing;
mod validation;

pub use block::*;
pub use features::{FeatureName, FeatureTriggers, TriggerKind, ALL_FEATURES};
pub use params::{
    AtSettings, BlockTiming, ChainParameters, ConfigError, RewardByHeight, ShareBin,
    UnitFeeAtTimestamp,
};
pub use validation::*;
