//! Consensus feature triggers.
//!
//! Every feature is activated either at a block height or at a block
//! timestamp. The trigger table is a fixed array indexed by the enum, so a
//! complete table can never yield a missing entry at lookup time.

use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum FeatureName {
    AtFindNextTransactionFix = 0,
    NewBlockSigHeight = 1,
    ShareBinFix = 2,
    SharesByLevelV2Height = 3,
    RewardShareLimitTimestamp = 4,
    CalcChainWeightTimestamp = 5,
    TransactionV5Timestamp = 6,
    TransactionV6Timestamp = 7,
    DisableReferenceTimestamp = 8,
    AggregateSignatureTimestamp = 9,
    OnlineAccountMinterLevelValidationHeight = 10,
    SelfSponsorshipAlgoV1Height = 11,
    FeeValidationFixTimestamp = 12,
    ChatReferenceTimestamp = 13,
}

pub const FEATURE_COUNT: usize = 14;

pub const ALL_FEATURES: [FeatureName; FEATURE_COUNT] = [
    FeatureName::AtFindNextTransactionFix,
    FeatureName::NewBlockSigHeight,
    FeatureName::ShareBinFix,
    FeatureName::SharesByLevelV2Height,
    FeatureName::RewardShareLimitTimestamp,
    FeatureName::CalcChainWeightTimestamp,
    FeatureName::TransactionV5Timestamp,
    FeatureName::TransactionV6Timestamp,
    FeatureName::DisableReferenceTimestamp,
    FeatureName::AggregateSignatureTimestamp,
    FeatureName::OnlineAccountMinterLevelValidationHeight,
    FeatureName::SelfSponsorshipAlgoV1Height,
    FeatureName::FeeValidationFixTimestamp,
    FeatureName::ChatReferenceTimestamp,
];

/// How a trigger value is interpreted
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TriggerKind {
    Height,
    Timestamp,
}

impl FeatureName {
    pub const fn as_usize(self) -> usize {
        self as usize
    }

    /// Key used in the chain configuration document
    pub const fn config_key(self) -> &'static str {
        match self {
            Self::AtFindNextTransactionFix => "atFindNextTransactionFix",
            Self::NewBlockSigHeight => "newBlockSigHeight",
            Self::ShareBinFix => "shareBinFix",
            Self::SharesByLevelV2Height => "sharesByLevelV2Height",
            Self::RewardShareLimitTimestamp => "rewardShareLimitTimestamp",
            Self::CalcChainWeightTimestamp => "calcChainWeightTimestamp",
            Self::TransactionV5Timestamp => "transactionV5Timestamp",
            Self::TransactionV6Timestamp => "transactionV6Timestamp",
            Self::DisableReferenceTimestamp => "disableReferenceTimestamp",
            Self::AggregateSignatureTimestamp => "aggregateSignatureTimestamp",
            Self::OnlineAccountMinterLevelValidationHeight => {
                "onlineAccountMinterLevelValidationHeight"
            }
            Self::SelfSponsorshipAlgoV1Height => "selfSponsorshipAlgoV1Height",
            Self::FeeValidationFixTimestamp => "feeValidationFixTimestamp",
            Self::ChatReferenceTimestamp => "chatReferenceTimestamp",
        }
    }

    pub const fn kind(self) -> TriggerKind {
        match self {
            Self::AtFindNextTransactionFix
            | Self::NewBlockSigHeight
            | Self::ShareBinFix
            | Self::SharesByLevelV2Height
            | Self::OnlineAccountMinterLevelValidationHeight
            | Self::SelfSponsorshipAlgoV1Height => TriggerKind::Height,
            Self::RewardShareLimitTimestamp
            | Self::CalcChainWeightTimestamp
            | Self::TransactionV5Timestamp
            | Self::TransactionV6Timestamp
            | Self::DisableReferenceTimestamp
            | Self::AggregateSignatureTimestamp
            | Self::FeeValidationFixTimestamp
            | Self::ChatReferenceTimestamp => TriggerKind::Timestamp,
        }
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_key())
    }
}

/// Activation point for every feature
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeatureTriggers([u64; FEATURE_COUNT]);

impl FeatureTriggers {
    /// Build a complete table. Returns the first feature `lookup` has no
    /// value for.
    pub fn from_lookup<F>(mut lookup: F) -> Result<Self, FeatureName>
    where
        F: FnMut(FeatureName) -> Option<u64>,
    {
        let mut values = [0u64; FEATURE_COUNT];
        for feature in ALL_FEATURES {
            values[feature.as_usize()] = lookup(feature).ok_or(feature)?;
        }
        Ok(Self(values))
    }

    pub fn get(&self, feature: FeatureName) -> u64 {
        self.0[feature.as_usize()]
    }

    /// Whether `feature` is in force for a block at `height` with `timestamp`
    pub fn is_active(&self, feature: FeatureName, height: u32, timestamp: u64) -> bool {
        let trigger = self.get(feature);
        match feature.kind() {
            TriggerKind::Height => u64::from(height) >= trigger,
            TriggerKind::Timestamp => timestamp >= trigger,
        }
    }
}
