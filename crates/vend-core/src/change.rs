//! # Change Module
//!
//! Greedy change-making against a finite reserve.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  remaining = change_due                                                 │
//! │  for d in [20, 10, 5, 1]:                                               │
//! │      take = min(remaining / d, reserve[d])                              │
//! │      if take > 0: breakdown[d] = take                                   │
//! │      remaining -= take × d                                              │
//! │  remaining > 0  →  InsufficientChange                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Greedy is only optimal for the canonical `{20,10,5,1}` set. There is no
//! fallback search: a reserve that greedy cannot use is reported as
//! insufficient even if some other combination would have worked.

use crate::cash::{CashCounts, CHANGE_DENOMINATIONS};
use crate::error::{CoreError, CoreResult};

/// Runs the greedy pass and returns the breakdown plus the amount it could
/// not cover. Never fails; see [`make_change`] for the checked version.
pub fn greedy_breakdown(change_due: i64, reserve: &CashCounts) -> (CashCounts, i64) {
    let mut remaining = change_due.max(0);
    let mut breakdown = CashCounts::new();

    for denomination in CHANGE_DENOMINATIONS {
        let need = remaining / denomination.value();
        let avail = reserve.get(denomination).max(0);
        let take = need.min(avail);

        if take > 0 {
            breakdown.set(denomination, take);
            remaining -= take * denomination.value();
        }
    }

    (breakdown, remaining)
}

/// Computes the exact change for `change_due` from `reserve`.
///
/// ## Returns
/// * `Ok(breakdown)` - Denomination → count to pay out (empty for zero)
/// * `Err(CoreError::InsufficientChange)` - Exact amount cannot be formed
///
/// ## Example
/// ```rust
/// use vend_core::cash::{CashCounts, Denomination};
/// use vend_core::change::make_change;
///
/// let reserve: CashCounts = [
///     (Denomination::Twenty, 5),
///     (Denomination::Ten, 5),
///     (Denomination::Five, 5),
///     (Denomination::One, 5),
/// ]
/// .into_iter()
/// .collect();
///
/// let change = make_change(3, &reserve).unwrap();
/// assert_eq!(change.get(Denomination::One), 3);
/// assert_eq!(change.len(), 1);
/// ```
pub fn make_change(change_due: i64, reserve: &CashCounts) -> CoreResult<CashCounts> {
    let (breakdown, shortfall) = greedy_breakdown(change_due, reserve);

    if shortfall > 0 {
        return Err(CoreError::InsufficientChange {
            change_due,
            shortfall,
        });
    }

    Ok(breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cash::Denomination;

    fn reserve(twenty: i64, ten: i64, five: i64, one: i64) -> CashCounts {
        [
            (Denomination::Twenty, twenty),
            (Denomination::Ten, ten),
            (Denomination::Five, five),
            (Denomination::One, one),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_small_change_uses_ones() {
        let change = make_change(3, &reserve(5, 5, 5, 5)).unwrap();
        assert_eq!(change.get(Denomination::One), 3);
        assert_eq!(change.len(), 1);
    }

    #[test]
    fn test_zero_change_is_empty() {
        let change = make_change(0, &reserve(0, 0, 0, 0)).unwrap();
        assert!(change.is_empty());
    }

    #[test]
    fn test_prefers_large_denominations() {
        let change = make_change(63, &reserve(5, 5, 5, 5)).unwrap();
        assert_eq!(change.get(Denomination::Twenty), 3);
        assert_eq!(change.get(Denomination::One), 3);
        assert_eq!(change.total_value(), 63);
    }

    #[test]
    fn test_falls_back_when_large_notes_run_out() {
        // Only one 20 left: 20 + 10 + 5 + 1×2
        let change = make_change(37, &reserve(1, 1, 1, 5)).unwrap();
        assert_eq!(change.get(Denomination::Twenty), 1);
        assert_eq!(change.get(Denomination::Ten), 1);
        assert_eq!(change.get(Denomination::Five), 1);
        assert_eq!(change.get(Denomination::One), 2);
        assert_eq!(change.total_value(), 37);
    }

    #[test]
    fn test_walkthrough_with_short_reserve() {
        // 17 due; 10:0, 5:3, 1:1 → 5×3 + 1×1 leaves 1 uncovered
        let short = reserve(0, 0, 3, 1);
        let (breakdown, remaining) = greedy_breakdown(17, &short);
        assert_eq!(breakdown.get(Denomination::Ten), 0);
        assert_eq!(breakdown.get(Denomination::Five), 3);
        assert_eq!(breakdown.get(Denomination::One), 1);
        assert_eq!(remaining, 1);

        let err = make_change(17, &short).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientChange {
                change_due: 17,
                shortfall: 1
            }
        );
    }

    #[test]
    fn test_never_pays_out_hundreds() {
        let mut with_hundreds = reserve(0, 0, 0, 0);
        with_hundreds.set(Denomination::Hundred, 10);
        assert!(make_change(100, &with_hundreds).is_err());
    }

    #[test]
    fn test_breakdown_never_exceeds_reserve() {
        let available = reserve(2, 1, 3, 4);
        for due in 0..=100 {
            let (breakdown, remaining) = greedy_breakdown(due, &available);
            for (d, count) in breakdown.iter() {
                assert!(count <= available.get(d));
            }
            assert_eq!(breakdown.total_value() + remaining, due);
        }
    }
}
