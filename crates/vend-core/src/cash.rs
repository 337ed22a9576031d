//! # Cash Module
//!
//! Denominations and denomination→count tallies.
//!
//! ## Two Denomination Sets
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Tender / collection box:   1   5   10   20   100                       │
//! │  Change reserve:            1   5   10   20                             │
//! │                                                                         │
//! │  100 is accepted from buyers but is never paid out as change.           │
//! │  Both sets are kept separate on purpose.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Values are whole baht. The store labels each denomination as `"<value>THB"`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

/// Suffix used by the store for denomination labels ("20THB").
pub const LABEL_SUFFIX: &str = "THB";

// =============================================================================
// Denomination
// =============================================================================

/// A note or coin the machine knows about.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub enum Denomination {
    #[serde(rename = "1THB")]
    One,
    #[serde(rename = "5THB")]
    Five,
    #[serde(rename = "10THB")]
    Ten,
    #[serde(rename = "20THB")]
    Twenty,
    #[serde(rename = "100THB")]
    Hundred,
}

/// Denominations a buyer may insert, ascending.
pub const TENDER_DENOMINATIONS: [Denomination; 5] = [
    Denomination::One,
    Denomination::Five,
    Denomination::Ten,
    Denomination::Twenty,
    Denomination::Hundred,
];

/// Denominations the change reserve holds, in the order the greedy
/// algorithm visits them (descending).
pub const CHANGE_DENOMINATIONS: [Denomination; 4] = [
    Denomination::Twenty,
    Denomination::Ten,
    Denomination::Five,
    Denomination::One,
];

/// Denominations the collection box holds, in seeding order.
pub const COLLECTION_DENOMINATIONS: [Denomination; 5] = [
    Denomination::Hundred,
    Denomination::Twenty,
    Denomination::Ten,
    Denomination::Five,
    Denomination::One,
];

impl Denomination {
    /// Face value in baht.
    #[inline]
    pub const fn value(self) -> i64 {
        match self {
            Denomination::One => 1,
            Denomination::Five => 5,
            Denomination::Ten => 10,
            Denomination::Twenty => 20,
            Denomination::Hundred => 100,
        }
    }

    /// Store label, e.g. `"20THB"`.
    pub const fn label(self) -> &'static str {
        match self {
            Denomination::One => "1THB",
            Denomination::Five => "5THB",
            Denomination::Ten => "10THB",
            Denomination::Twenty => "20THB",
            Denomination::Hundred => "100THB",
        }
    }

    /// Looks up a tendered value. Anything outside `{1,5,10,20,100}` is `None`.
    pub fn from_value(value: i64) -> Option<Self> {
        TENDER_DENOMINATIONS
            .into_iter()
            .find(|d| d.value() == value)
    }

    /// Parses a store label. The `THB` suffix is stripped before the value
    /// lookup, so `"20THB"` and `"20"` both parse.
    pub fn from_label(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        let digits = trimmed
            .strip_suffix(LABEL_SUFFIX)
            .or_else(|| trimmed.strip_suffix("thb"))
            .unwrap_or(trimmed);
        digits.trim().parse::<i64>().ok().and_then(Self::from_value)
    }

    /// Whether the change reserve may hold (and pay out) this denomination.
    #[inline]
    pub fn is_change(self) -> bool {
        !matches!(self, Denomination::Hundred)
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Denomination {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Denomination::from_label(s).ok_or_else(|| ValidationError::NotAllowed {
            field: "denomination".to_string(),
            allowed: TENDER_DENOMINATIONS
                .iter()
                .map(|d| d.value().to_string())
                .collect(),
        })
    }
}

// =============================================================================
// Cash Counts
// =============================================================================

/// One row of a cash ledger as shown to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashEntry {
    pub denomination: Denomination,
    pub count: i64,
}

/// Denomination → count tally.
///
/// Used for ledger snapshots (cash reserve, collection box) and for the
/// per-purchase tender and change breakdowns. Breakdowns only carry
/// denominations with a non-zero count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CashCounts(BTreeMap<Denomination, i64>);

impl CashCounts {
    pub fn new() -> Self {
        CashCounts(BTreeMap::new())
    }

    /// Count for `denomination`, zero when absent.
    #[inline]
    pub fn get(&self, denomination: Denomination) -> i64 {
        self.0.get(&denomination).copied().unwrap_or(0)
    }

    pub fn set(&mut self, denomination: Denomination, count: i64) {
        self.0.insert(denomination, count);
    }

    /// Adds `count` to the tally for `denomination`.
    pub fn add(&mut self, denomination: Denomination, count: i64) {
        *self.0.entry(denomination).or_insert(0) += count;
    }

    /// Iterates in ascending denomination order.
    pub fn iter(&self) -> impl Iterator<Item = (Denomination, i64)> + '_ {
        self.0.iter().map(|(d, c)| (*d, *c))
    }

    /// Number of denominations tracked.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of `count × value` over all denominations.
    pub fn total_value(&self) -> i64 {
        self.iter().map(|(d, c)| d.value() * c).sum()
    }

    /// Total number of notes and coins.
    pub fn piece_count(&self) -> i64 {
        self.0.values().sum()
    }

    /// Rows for display, highest denomination first.
    pub fn entries(&self) -> Vec<CashEntry> {
        self.0
            .iter()
            .rev()
            .map(|(d, c)| CashEntry {
                denomination: *d,
                count: *c,
            })
            .collect()
    }
}

impl FromIterator<(Denomination, i64)> for CashCounts {
    fn from_iter<I: IntoIterator<Item = (Denomination, i64)>>(iter: I) -> Self {
        let mut counts = CashCounts::new();
        for (denomination, count) in iter {
            counts.add(denomination, count);
        }
        counts
    }
}

impl From<&[CashEntry]> for CashCounts {
    fn from(entries: &[CashEntry]) -> Self {
        entries
            .iter()
            .map(|e| (e.denomination, e.count))
            .collect()
    }
}
