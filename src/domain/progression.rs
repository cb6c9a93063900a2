//! Experience thresholds and level derivation.
//!
//! Level is a pure function of cumulative XP against a monotonic threshold
//! table — never incremented in place, so replays and recoveries always
//! land on the same level for the same XP total.

/// XP awarded for a winning bet.
pub const XP_PER_WIN: u64 = 25;

/// XP awarded for a losing bet (participation still earns something).
pub const XP_PER_LOSS: u64 = 5;

/// Cumulative XP required to reach level `index + 1`.
///
/// Strictly increasing. Levels beyond the table are clamped to the last
/// entry; the table is the whole progression system.
const LEVEL_THRESHOLDS: &[u64] = &[
    0,      // level 1
    100,    // level 2
    250,    // level 3
    500,    // level 4
    1_000,  // level 5
    2_000,  // level 6
    3_500,  // level 7
    5_500,  // level 8
    8_000,  // level 9
    11_000, // level 10
];

/// Derive the level for a cumulative XP total.
pub fn level_for_xp(xp: u64) -> u32 {
    let mut level = 1u32;
    for (i, threshold) in LEVEL_THRESHOLDS.iter().enumerate() {
        if xp >= *threshold {
            level = u32::try_from(i).unwrap_or(0) + 1;
        } else {
            break;
        }
    }
    level
}

/// XP delta for a settled bet outcome.
pub fn xp_for_outcome(won: bool) -> u64 {
    if won { XP_PER_WIN } else { XP_PER_LOSS }
}

/// The maximum level the table can produce.
pub fn max_level() -> u32 {
    u32::try_from(LEVEL_THRESHOLDS.len()).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_account_is_level_one() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
    }

    #[test]
    fn exact_threshold_levels_up() {
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(250), 3);
        assert_eq!(level_for_xp(1_000), 5);
    }

    #[test]
    fn xp_beyond_table_clamps_to_max_level() {
        assert_eq!(level_for_xp(11_000), max_level());
        assert_eq!(level_for_xp(u64::MAX), max_level());
    }

    #[test]
    fn win_outranks_loss() {
        assert!(xp_for_outcome(true) > xp_for_outcome(false));
        assert!(xp_for_outcome(false) > 0);
    }

    #[test]
    fn thresholds_strictly_increase() {
        for pair in LEVEL_THRESHOLDS.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }
}
