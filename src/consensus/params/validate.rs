//! Chain configuration validation.
//!
//! Checks run in a fixed order and the first failure names the offending
//! field. There is no degraded mode: any failure aborts startup.

use super::{ChainParameters, ConfigError, RawChainParameters, SHARE_DENOMINATOR};
use crate::consensus::features::FeatureTriggers;

fn invalid(field: &str) -> ConfigError {
    ConfigError::Invalid(field.to_string())
}

fn require_positive(value: u64, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(invalid(field));
    }
    Ok(())
}

/// True if `keys` never decreases
fn is_ascending<I: IntoIterator<Item = u64>>(keys: I) -> bool {
    let mut last = None;
    for key in keys {
        if matches!(last, Some(prev) if key < prev) {
            return false;
        }
        last = Some(key);
    }
    true
}

pub(super) fn validate(raw: RawChainParameters) -> Result<ChainParameters, ConfigError> {
    let genesis = raw.genesis_info.ok_or_else(|| invalid("genesis_info"))?;

    let rewards_by_height = raw
        .rewards_by_height
        .filter(|rewards| !rewards.is_empty())
        .ok_or_else(|| invalid("rewards_by_height"))?;

    let shares_by_level = raw
        .shares_by_level
        .filter(|shares| !shares.is_empty())
        .ok_or_else(|| invalid("shares_by_level"))?;

    let qora_holders_share = raw
        .qora_holders_share
        .ok_or_else(|| invalid("qora_holders_share"))?;
    let qora_per_qort_reward = raw
        .qora_per_qort_reward
        .ok_or_else(|| invalid("qora_per_qort_reward"))?;
    let blocks_needed_by_level = raw
        .blocks_needed_by_level
        .ok_or_else(|| invalid("blocks_needed_by_level"))?;
    let block_timings_by_height = raw
        .block_timings_by_height
        .ok_or_else(|| invalid("block_timings_by_height"))?;

    require_positive(raw.block_timestamp_margin_ms, "block_timestamp_margin_ms")?;
    require_positive(raw.transaction_expiry_period_ms, "transaction_expiry_period_ms")?;
    require_positive(u64::from(raw.max_block_size_bytes), "max_block_size_bytes")?;
    require_positive(
        u64::from(raw.min_account_level_to_reward_share),
        "min_account_level_to_reward_share",
    )?;
    require_positive(
        u64::from(raw.founder_effective_minting_level),
        "founder_effective_minting_level",
    )?;

    let at_settings = raw.at_settings.ok_or_else(|| invalid("at_settings"))?;

    let triggers = raw
        .feature_triggers
        .ok_or_else(|| invalid("feature_triggers"))?;
    let feature_triggers = FeatureTriggers::from_lookup(|f| triggers.get(f.config_key()).copied())
        .map_err(|missing| ConfigError::Invalid(format!("feature_triggers.{}", missing)))?;

    let total_share = shares_by_level
        .iter()
        .fold(u128::from(qora_holders_share), |acc, bin| acc + u128::from(bin.share));
    if total_share > u128::from(SHARE_DENOMINATOR) {
        return Err(invalid("shares_by_level"));
    }

    if !is_ascending(rewards_by_height.iter().map(|r| u64::from(r.height))) {
        return Err(invalid("rewards_by_height"));
    }
    if block_timings_by_height.is_empty()
        || block_timings_by_height[0].height > 1
        || !is_ascending(block_timings_by_height.iter().map(|t| u64::from(t.height)))
    {
        return Err(invalid("block_timings_by_height"));
    }
    if !is_ascending(raw.name_registration_unit_fees.iter().map(|f| f.timestamp)) {
        return Err(invalid("name_registration_unit_fees"));
    }
    // One level past the last threshold is the highest a bin may name
    let max_share_level = blocks_needed_by_level.len() as u64 + 1;
    if shares_by_level.iter().any(|bin| {
        bin.levels.contains(&0)
            || bin
                .levels
                .last()
                .map_or(false, |level| u64::from(*level) > max_share_level)
    }) {
        return Err(invalid("shares_by_level"));
    }

    Ok(ChainParameters {
        is_test_chain: raw.is_test_chain,
        transaction_expiry_period_ms: raw.transaction_expiry_period_ms,
        unit_fee: raw.unit_fee,
        max_bytes_per_unit_fee: raw.max_bytes_per_unit_fee,
        block_timestamp_margin_ms: raw.block_timestamp_margin_ms,
        max_block_size_bytes: raw.max_block_size_bytes,
        require_group_for_approval: raw.require_group_for_approval,
        use_broken_address_hash: raw.use_broken_address_hash,
        one_name_per_account: raw.one_name_per_account,
        min_account_level_to_mint: raw.min_account_level_to_mint,
        min_account_level_for_block_submission: raw.min_account_level_for_block_submission,
        min_account_level_to_reward_share: raw.min_account_level_to_reward_share,
        max_reward_shares_per_minter: raw.max_reward_shares_per_minter,
        founder_effective_minting_level: raw.founder_effective_minting_level,
        online_account_signatures_min_lifetime_ms: raw.online_account_signatures_min_lifetime_ms,
        online_account_signatures_max_lifetime_ms: raw.online_account_signatures_max_lifetime_ms,
        genesis,
        feature_triggers,
        rewards_by_height,
        shares_by_level,
        blocks_needed_by_level,
        block_timings_by_height,
        name_registration_unit_fees: raw.name_registration_unit_fees,
        qora_holders_share,
        qora_per_qort_reward,
        at_settings,
        cumulative_blocks_by_level: Vec::new(),
        share_bin_by_level: Vec::new(),
    })
}
