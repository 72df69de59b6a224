use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// An accrued or settled fine amount in currency units.
///
/// Wrapper around `rust_decimal::Decimal` so fine arithmetic cannot be mixed
/// up with other numeric quantities.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Fine(pub Decimal);

impl Fine {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Fine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Fine {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Fine {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

/// Parameters of the accrual rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinePolicy {
    /// Days after the order date during which no fine accrues.
    pub grace_days: i64,
    /// Amount added per whole day past the grace period.
    pub daily_fine: Decimal,
    /// Largest amount still in the regular tier; above it the account is
    /// blocked.
    pub block_threshold: Decimal,
}

impl Default for FinePolicy {
    fn default() -> Self {
        Self {
            grace_days: 10,
            daily_fine: dec!(50),
            block_threshold: dec!(500),
        }
    }
}

/// Notification severity bucket derived from a fine amount.
///
/// Tiers are ordered; a sweep only notifies when an order's tier rises above
/// the last tier it was notified for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FineTier {
    #[default]
    None,
    First,
    Regular,
    Critical,
}

impl FineTier {
    pub fn classify(amount: Fine, policy: &FinePolicy) -> Self {
        if amount == Fine::ZERO {
            FineTier::None
        } else if amount.0 == policy.daily_fine {
            FineTier::First
        } else if amount.0 <= policy.block_threshold {
            FineTier::Regular
        } else {
            FineTier::Critical
        }
    }
}

/// Fine owed on an order taken out at `order_date`, as of `now`.
///
/// Zero within the grace period, then one `daily_fine` per whole day beyond
/// it. Pure; given a non-decreasing `now` the result is non-decreasing.
pub fn accrue(order_date: DateTime<Utc>, now: DateTime<Utc>, policy: &FinePolicy) -> Fine {
    let due = order_date + Duration::days(policy.grace_days);
    if now <= due {
        return Fine::ZERO;
    }
    let overdue_days = (now - due).num_days();
    Fine(Decimal::from(overdue_days) * policy.daily_fine)
}
