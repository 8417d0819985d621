//! Rank-based distribution of the dropped pool.
//!
//! The `distribution` module holds the table that maps competition
//! ranks to a percentage of the dropped-participant pool, and the
//! window rule used when several participants tie for a rank.

use std::collections::BTreeMap;

/// Maps ranks to whole-number percentages of the dropped pool.  Ranks
/// missing from the table receive nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundDistribution {
    shares: BTreeMap<u32, u32>,
}

impl RefundDistribution {
    /// The season table: 70% to first, 20% to second, 10% to third.
    pub fn standard() -> Self {
        Self {
            shares: BTreeMap::from([(1, 70), (2, 20), (3, 10)]),
        }
    }

    /// Percentage assigned to a single rank.
    pub fn percentage_for(&self, rank: u32) -> u32 {
        self.shares.get(&rank).copied().unwrap_or(0)
    }

    /// Highest rank that receives a share.
    pub fn last_paid_rank(&self) -> u32 {
        self.shares.keys().next_back().copied().unwrap_or(0)
    }

    /// Total percentage for a tie group of `group_size` members starting
    /// at `rank`.
    ///
    /// The group occupies ranks `rank..rank + group_size` and absorbs the
    /// table entries in that window up to the last paid rank.  A group
    /// starting past the last paid rank gets nothing.
    pub fn group_percentage(&self, rank: u32, group_size: usize) -> u32 {
        let last = self.last_paid_rank();
        if rank == 0 || group_size == 0 || rank > last {
            return 0;
        }
        let span = u32::try_from(group_size - 1).unwrap_or(u32::MAX);
        let end = rank.saturating_add(span).min(last);
        (rank..=end).map(|r| self.percentage_for(r)).sum()
    }
}

impl Default for RefundDistribution {
    fn default() -> Self {
        Self::standard()
    }
}

/// Floored share of `pool` for one member of a group that splits
/// `group_percentage` percent evenly across `group_size` members.
///
/// Equivalent to `floor(pool * (group_percentage / group_size) / 100)`
/// computed without floating point.
pub fn floored_share(pool: u64, group_percentage: u32, group_size: usize) -> u64 {
    if group_size == 0 {
        return 0;
    }
    let numerator = u128::from(pool) * u128::from(group_percentage);
    let denominator = 100 * group_size as u128;
    u64::try_from(numerator / denominator).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table() {
        let table = RefundDistribution::standard();
        assert_eq!(table.percentage_for(1), 70);
        assert_eq!(table.percentage_for(2), 20);
        assert_eq!(table.percentage_for(3), 10);
        assert_eq!(table.percentage_for(4), 0);
        assert_eq!(table.last_paid_rank(), 3);
    }

    #[test]
    fn single_member_groups_take_their_own_rank() {
        let table = RefundDistribution::standard();
        assert_eq!(table.group_percentage(1, 1), 70);
        assert_eq!(table.group_percentage(2, 1), 20);
        assert_eq!(table.group_percentage(3, 1), 10);
    }

    #[test]
    fn ties_absorb_following_ranks() {
        let table = RefundDistribution::standard();
        assert_eq!(table.group_percentage(1, 2), 90);
        assert_eq!(table.group_percentage(1, 3), 100);
        assert_eq!(table.group_percentage(1, 10), 100);
        assert_eq!(table.group_percentage(2, 2), 30);
        // A tie at rank 3 absorbs rank 4's zero.
        assert_eq!(table.group_percentage(3, 2), 10);
    }

    #[test]
    fn groups_past_the_table_get_nothing() {
        let table = RefundDistribution::standard();
        assert_eq!(table.group_percentage(4, 1), 0);
        assert_eq!(table.group_percentage(5, 3), 0);
        assert_eq!(table.group_percentage(1, 0), 0);
    }

    #[test]
    fn floored_share_truncates() {
        assert_eq!(floored_share(20_000, 70, 1), 14_000);
        assert_eq!(floored_share(10_000, 90, 2), 4_500);
        // 100% over three members of 10_000: 3333.33.. each
        assert_eq!(floored_share(10_000, 100, 3), 3_333);
        assert_eq!(floored_share(0, 70, 1), 0);
        assert_eq!(floored_share(10_000, 70, 0), 0);
    }
}
