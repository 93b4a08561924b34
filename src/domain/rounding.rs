// ============================================================================
// Rounding Modes
// Policies for results that cannot be represented at the target precision
// ============================================================================

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rounding mode applied by the numeric engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RoundingMode {
    /// Round to nearest, ties to even
    #[default]
    NearestTiesEven,
    /// Round toward zero (truncate)
    TowardZero,
    /// Round toward +Infinity
    TowardPositive,
    /// Round toward -Infinity
    TowardNegative,
    /// Round away from zero
    AwayFromZero,
}

impl RoundingMode {
    /// All supported modes.
    pub const ALL: [RoundingMode; 5] = [
        RoundingMode::NearestTiesEven,
        RoundingMode::TowardZero,
        RoundingMode::TowardPositive,
        RoundingMode::TowardNegative,
        RoundingMode::AwayFromZero,
    ];

    /// Whether an inexact magnitude must be bumped up by one unit.
    ///
    /// `negative` is the sign of the exact value, `inexact` whether any
    /// discarded bits were set, `half` how the discarded part compares to
    /// half a unit, and `odd` whether the kept magnitude is odd.
    #[inline]
    pub fn rounds_up(
        self,
        negative: bool,
        inexact: bool,
        half: std::cmp::Ordering,
        odd: bool,
    ) -> bool {
        use std::cmp::Ordering;

        if !inexact {
            return false;
        }
        match self {
            RoundingMode::NearestTiesEven => match half {
                Ordering::Greater => true,
                Ordering::Equal => odd,
                Ordering::Less => false,
            },
            RoundingMode::TowardZero => false,
            RoundingMode::TowardPositive => !negative,
            RoundingMode::TowardNegative => negative,
            RoundingMode::AwayFromZero => true,
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundingMode::NearestTiesEven => write!(f, "nearest-ties-even"),
            RoundingMode::TowardZero => write!(f, "toward-zero"),
            RoundingMode::TowardPositive => write!(f, "toward-positive"),
            RoundingMode::TowardNegative => write!(f, "toward-negative"),
            RoundingMode::AwayFromZero => write!(f, "away-from-zero"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn test_default_is_nearest() {
        assert_eq!(RoundingMode::default(), RoundingMode::NearestTiesEven);
    }

    #[test]
    fn test_nearest_ties_to_even() {
        let mode = RoundingMode::NearestTiesEven;
        assert!(mode.rounds_up(false, true, Ordering::Greater, false));
        assert!(!mode.rounds_up(false, true, Ordering::Less, true));
        assert!(mode.rounds_up(false, true, Ordering::Equal, true));
        assert!(!mode.rounds_up(false, true, Ordering::Equal, false));
    }

    #[test]
    fn test_directed_modes_follow_sign() {
        assert!(RoundingMode::TowardPositive.rounds_up(false, true, Ordering::Less, false));
        assert!(!RoundingMode::TowardPositive.rounds_up(true, true, Ordering::Greater, false));
        assert!(RoundingMode::TowardNegative.rounds_up(true, true, Ordering::Less, false));
        assert!(!RoundingMode::TowardNegative.rounds_up(false, true, Ordering::Greater, false));
        assert!(RoundingMode::AwayFromZero.rounds_up(true, true, Ordering::Less, false));
        assert!(!RoundingMode::TowardZero.rounds_up(false, true, Ordering::Greater, true));
    }

    #[test]
    fn test_exact_never_rounds() {
        for mode in RoundingMode::ALL {
            assert!(!mode.rounds_up(false, false, Ordering::Less, true));
        }
    }
}
