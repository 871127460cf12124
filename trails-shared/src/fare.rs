use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

/// A fare amount in minor currency units (paise, cents, ...).
///
/// Stored as an integer so totals never accumulate float error; the currency
/// label lives in configuration, not on every value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Fare(pub i64);

impl Fare {
    pub fn from_minor(minor: i64) -> Self {
        Fare(minor)
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }

    /// Total for a per-seat fare across a seat count.
    pub fn total_for(&self, seats: u32) -> Fare {
        Fare(self.0 * seats as i64)
    }
}

impl Sum for Fare {
    fn sum<I: Iterator<Item = Fare>>(iter: I) -> Self {
        Fare(iter.map(|f| f.0).sum())
    }
}

impl fmt::Display for Fare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, (self.0 % 100).abs())
    }
}
