//! Property-based and adversarial tests for chain parameters
//!
//! These tests verify lookup and validation invariants hold under random
//! configuration tables.

use ledger_core::consensus::params::SHARE_DENOMINATOR;
use ledger_core::consensus::{ChainParameters, ConfigError, ALL_FEATURES};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::BTreeSet;

/// Minimal valid chain configuration
fn base_config() -> Value {
    let triggers: serde_json::Map<String, Value> = ALL_FEATURES
        .iter()
        .map(|f| (f.config_key().to_string(), json!(0)))
        .collect();

    json!({
        "transactionExpiryPeriod": 86400000,
        "unitFee": 100000,
        "maxBytesPerUnitFee": 1024,
        "blockTimestampMargin": 2000,
        "maxBlockSize": 2097152,
        "minAccountLevelToMint": 1,
        "minAccountLevelForBlockSubmissions": 1,
        "minAccountLevelToRewardShare": 5,
        "maxRewardSharesPerMinter": 6,
        "founderEffectiveMintingLevel": 10,
        "onlineAccountSignaturesMinLifetime": 43200000,
        "onlineAccountSignaturesMaxLifetime": 86400000,
        "genesisInfo": { "version": 4, "timestamp": 1593450000000u64 },
        "rewardsByHeight": [ { "height": 1, "reward": 500 } ],
        "sharesByLevel": [ { "levels": [1], "share": 1000 } ],
        "qoraHoldersShare": 0,
        "qoraPerQortReward": 250,
        "blocksNeededByLevel": [ 10, 10, 10, 10, 10, 10 ],
        "blockTimingsByHeight": [
            { "height": 1, "target": 60000, "deviation": 30000, "power": 0.2 }
        ],
        "ciyamAtSettings": {
            "feePerStep": 1,
            "maxStepsPerRound": 500,
            "stepsPerFunctionCall": 10,
            "minutesPerBlock": 1
        },
        "featureTriggers": triggers
    })
}

fn load(config: &Value) -> Result<ChainParameters, ConfigError> {
    ChainParameters::load(&config.to_string())
}

/// Ascending reward table: (height, reward)
fn reward_table() -> impl Strategy<Value = Vec<(u32, u64)>> {
    prop::collection::btree_set(0u32..1_000_000, 1..12).prop_flat_map(|heights| {
        let len = heights.len();
        let heights: Vec<u32> = heights.into_iter().collect();
        prop::collection::vec(1u64..1_000_000_000, len)
            .prop_map(move |rewards| heights.iter().copied().zip(rewards).collect())
    })
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

proptest! {
    /// Validated configurations never pay out more than the whole reward
    #[test]
    fn prop_total_share_bounded(
        shares in prop::collection::vec(0u64..60_000_000, 1..6),
        qora_share in 0u64..60_000_000,
    ) {
        let bins: Vec<Value> = shares
            .iter()
            .enumerate()
            .map(|(i, share)| json!({ "levels": [i as u32 + 1], "share": share }))
            .collect();
        let mut config = base_config();
        config["sharesByLevel"] = Value::Array(bins);
        config["qoraHoldersShare"] = json!(qora_share);

        let total: u64 = shares.iter().sum::<u64>() + qora_share;
        match load(&config) {
            Ok(params) => {
                prop_assert!(total <= SHARE_DENOMINATOR);
                let loaded: u64 = params.shares_by_level().iter().map(|b| b.share).sum();
                prop_assert!(loaded + params.qora_holders_share() <= SHARE_DENOMINATOR);
            }
            Err(ConfigError::Invalid(field)) => {
                prop_assert!(total > SHARE_DENOMINATOR);
                prop_assert_eq!(field, "shares_by_level");
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    /// Reward lookup returns the latest entry not above the queried height
    #[test]
    fn prop_reward_is_latest_applicable(table in reward_table(), height in 0u32..1_200_000) {
        let mut config = base_config();
        config["rewardsByHeight"] = Value::Array(
            table.iter().map(|(h, r)| json!({ "height": h, "reward": r })).collect(),
        );
        let params = load(&config).unwrap();

        let expected = table
            .iter()
            .filter(|(h, _)| *h <= height)
            .last()
            .map(|(_, r)| *r)
            .unwrap_or(0);
        prop_assert_eq!(params.reward_at_height(height), expected);
    }

    /// Cumulative thresholds are prefix sums starting at zero
    #[test]
    fn prop_cumulative_blocks_prefix_sums(needed in prop::collection::vec(0u32..100_000, 1..12)) {
        let mut config = base_config();
        config["blocksNeededByLevel"] = json!(needed);
        let params = load(&config).unwrap();

        prop_assert_eq!(params.cumulative_blocks_for_level(0), Some(0));
        let mut running = 0u32;
        for (i, n) in needed.iter().enumerate() {
            running += n;
            prop_assert_eq!(params.cumulative_blocks_for_level(i as u32 + 1), Some(running));
        }
        prop_assert_eq!(params.cumulative_blocks_for_level(needed.len() as u32 + 1), None);
    }

    /// Minting more blocks never lowers an account's level
    #[test]
    fn prop_level_monotonic(
        needed in prop::collection::vec(1u32..10_000, 1..10),
        a in 0u32..200_000,
        b in 0u32..200_000,
    ) {
        let mut config = base_config();
        config["blocksNeededByLevel"] = json!(needed);
        let params = load(&config).unwrap();

        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(params.level_for_blocks_minted(low) <= params.level_for_blocks_minted(high));
        prop_assert!(params.level_for_blocks_minted(high) <= params.max_level());
    }

    /// Every level in a bin resolves back to that bin
    #[test]
    fn prop_share_bin_lookup(levels in prop::collection::btree_set(1u32..40, 1..10)) {
        let mut config = base_config();
        config["sharesByLevel"] = json!([{ "levels": levels, "share": 1000 }]);
        config["blocksNeededByLevel"] = json!(vec![10u32; 40]);
        let params = load(&config).unwrap();

        for level in 0u32..45 {
            let found = params.share_bin_for_level(level);
            prop_assert_eq!(found.is_some(), levels.contains(&level));
        }
    }

    /// Block times stay inside the deviation window
    #[test]
    fn prop_block_time_within_window(
        target in 10_000u64..120_000,
        deviation_pct in 0u64..100,
        power in 0.1f64..2.0,
        ratio in -0.5f64..1.5,
    ) {
        let deviation = target * deviation_pct / 100;
        let mut config = base_config();
        config["blockTimingsByHeight"] = json!([
            { "height": 1, "target": target, "deviation": deviation, "power": power }
        ]);
        let params = load(&config).unwrap();

        let time = params.block_timing_at_height(1).unwrap().block_time_for_ratio(ratio);
        prop_assert!(time >= target - deviation);
        prop_assert!(time <= target + deviation);
    }
}

// ============================================================================
// ADVERSARIAL TESTS
// ============================================================================

/// Every required table, when removed, is named in the error
#[test]
fn test_each_required_table_named() {
    let cases = [
        ("genesisInfo", "genesis_info"),
        ("rewardsByHeight", "rewards_by_height"),
        ("sharesByLevel", "shares_by_level"),
        ("qoraHoldersShare", "qora_holders_share"),
        ("qoraPerQortReward", "qora_per_qort_reward"),
        ("blocksNeededByLevel", "blocks_needed_by_level"),
        ("blockTimingsByHeight", "block_timings_by_height"),
        ("ciyamAtSettings", "at_settings"),
        ("featureTriggers", "feature_triggers"),
    ];

    for (key, field) in cases {
        let mut config = base_config();
        config.as_object_mut().unwrap().remove(key);
        match load(&config) {
            Err(ConfigError::Invalid(name)) => assert_eq!(name, field, "removing {}", key),
            other => panic!("removing {} gave {:?}", key, other),
        }
    }
}

/// Each feature trigger is individually required
#[test]
fn test_each_feature_trigger_required() {
    for feature in ALL_FEATURES {
        let mut config = base_config();
        config["featureTriggers"]
            .as_object_mut()
            .unwrap()
            .remove(feature.config_key());

        match load(&config) {
            Err(ConfigError::Invalid(name)) => {
                assert_eq!(name, format!("feature_triggers.{}", feature.config_key()))
            }
            other => panic!("missing {} gave {:?}", feature, other),
        }
    }
}

/// Share totals near u64::MAX must not wrap into a passing value
#[test]
fn test_share_overflow_rejected() {
    let mut config = base_config();
    config["sharesByLevel"] = json!([
        { "levels": [1], "share": u64::MAX },
        { "levels": [2], "share": 2 }
    ]);
    assert!(matches!(load(&config), Err(ConfigError::Invalid(_))));
}

/// Levels far beyond the threshold table are rejected before derivation
#[test]
fn test_huge_share_level_rejected() {
    let mut config = base_config();
    config["sharesByLevel"] = json!([{ "levels": [u32::MAX], "share": 1000 }]);
    match load(&config) {
        Err(ConfigError::Invalid(name)) => assert_eq!(name, "shares_by_level"),
        other => panic!("expected Invalid, got {:?}", other),
    }
}

/// Duplicate levels across bins resolve to the later bin
#[test]
fn test_overlapping_bins_last_wins() {
    let mut config = base_config();
    config["sharesByLevel"] = json!([
        { "levels": [1, 2], "share": 1000 },
        { "levels": [2, 3], "share": 2000 }
    ]);
    let params = load(&config).unwrap();
    assert_eq!(params.share_bin_for_level(1).unwrap().share, 1000);
    assert_eq!(params.share_bin_for_level(2).unwrap().share, 2000);
    let expected: BTreeSet<u32> = [2, 3].into_iter().collect();
    assert_eq!(params.share_bin_for_level(3).unwrap().levels, expected);
}
