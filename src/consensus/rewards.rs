//! Reward, fee and account-level lookups
//!
//! All threshold tables are sorted ascending by key and consulted by
//! "latest entry whose key is not above the query": scan from the end,
//! first match wins.

use crate::consensus::params::{ChainParameters, ShareBin};

impl ChainParameters {
    /// Block reward for a block at `height`
    ///
    /// Heights below the first table entry earn nothing.
    pub fn reward_at_height(&self, height: u32) -> u64 {
        self.rewards_by_height()
            .iter()
            .rev()
            .find(|entry| entry.height <= height)
            .map(|entry| entry.reward)
            .unwrap_or(0)
    }

    /// Unit fee for registering a name at `timestamp`
    ///
    /// Falls back to the chain-wide unit fee if no entry applies.
    pub fn name_registration_fee_at(&self, timestamp: u64) -> u64 {
        self.name_registration_unit_fees()
            .iter()
            .rev()
            .find(|entry| entry.timestamp <= timestamp)
            .map(|entry| entry.fee)
            .unwrap_or_else(|| self.unit_fee())
    }

    /// Share bin for an account level
    ///
    /// `None` for level 0 and for levels above the table. Callers decide
    /// whether that means "use the highest bin".
    pub fn share_bin_for_level(&self, level: u32) -> Option<&ShareBin> {
        let index = level.checked_sub(1)? as usize;
        let bin_index = (*self.share_bin_by_level().get(index)?)?;
        self.shares_by_level().get(bin_index)
    }

    /// Blocks an account must have minted to reach `level`
    ///
    /// `None` when `level` is beyond the table, which is a caller error.
    pub fn cumulative_blocks_for_level(&self, level: u32) -> Option<u32> {
        self.cumulative_blocks_by_level().get(level as usize).copied()
    }

    /// Highest level an account can reach
    pub fn max_level(&self) -> u32 {
        self.blocks_needed_by_level().len() as u32
    }

    /// Level reached after minting `blocks_minted` blocks
    pub fn level_for_blocks_minted(&self, blocks_minted: u32) -> u32 {
        self.cumulative_blocks_by_level()
            .iter()
            .rposition(|threshold| blocks_minted >= *threshold)
            .unwrap_or(0) as u32
    }
}
