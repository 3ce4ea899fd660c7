//! Block timing
//!
//! Target block times by height. The minimum delay before a minter may
//! produce the next block depends on how close its key is to the previous
//! block's minter key; `block_time_for_ratio` maps that distance ratio onto
//! the `[target - deviation, target + deviation]` window.

use crate::consensus::params::{BlockTiming, ChainParameters, ConfigError};

impl ChainParameters {
    /// Timing rules in force at `height`
    ///
    /// Height 1 is always covered by a validated table, so a miss here is a
    /// defect rather than a runtime condition.
    pub fn block_timing_at_height(&self, height: u32) -> Result<&BlockTiming, ConfigError> {
        self.block_timings_by_height()
            .iter()
            .rev()
            .find(|timing| timing.height <= height)
            .ok_or_else(|| {
                ConfigError::IllegalState(format!("no block timing for height {}", height))
            })
    }
}

impl BlockTiming {
    /// Block time in milliseconds for a key distance ratio in `[0, 1]`
    pub fn block_time_for_ratio(&self, ratio: f64) -> u64 {
        let ratio = ratio.clamp(0.0, 1.0);
        let offset = (self.deviation_ms as f64 * 2.0 * ratio.powf(self.power)) as u64;
        self.target_ms.saturating_sub(self.deviation_ms) + offset
    }
}
