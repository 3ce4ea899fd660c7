//! Lookup tables derived from the raw economic tables.

use super::ChainParameters;

/// Build `cumulative_blocks_by_level` and `share_bin_by_level`.
///
/// Pure and infallible; `load` runs it exactly once.
pub fn derive(params: &mut ChainParameters) {
    let mut cumulative = Vec::with_capacity(params.blocks_needed_by_level.len() + 1);
    let mut total: u32 = 0;
    cumulative.push(total);
    for needed in &params.blocks_needed_by_level {
        total = total.saturating_add(*needed);
        cumulative.push(total);
    }
    params.cumulative_blocks_by_level = cumulative;

    let max_level = params
        .shares_by_level
        .iter()
        .flat_map(|bin| bin.levels.iter().copied())
        .max()
        .unwrap_or(0);

    // Index is level - 1; level 0 never reaches the table
    let mut by_level = vec![None; max_level as usize];
    for (bin_index, bin) in params.shares_by_level.iter().enumerate() {
        for level in bin.levels.iter().filter(|level| **level > 0) {
            by_level[(*level - 1) as usize] = Some(bin_index);
        }
    }
    params.share_bin_by_level = by_level;
}

#[cfg(test)]
mod tests {
    use crate::consensus::params::tests::sample_params;

    #[test]
    fn test_cumulative_blocks() {
        let params = sample_params();
        assert_eq!(params.cumulative_blocks_by_level(), &[0, 200, 500]);
        assert_eq!(
            params.cumulative_blocks_by_level().len(),
            params.blocks_needed_by_level().len() + 1
        );
    }

    #[test]
    fn test_share_bin_table_length() {
        let params = sample_params();
        assert_eq!(params.share_bin_by_level.len(), 3);
        assert_eq!(params.share_bin_by_level, vec![Some(0), Some(0), Some(1)]);
    }
}
