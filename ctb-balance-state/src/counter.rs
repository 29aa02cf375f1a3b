//! The pending balance counter.
//!
//! Each successful `ApplyPendingBalance` advances the counter by one. Callers
//! echo the value they observed, which makes the counter the optimistic
//! concurrency token for the account.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingBalanceCounter(u64);

impl PendingBalanceCounter {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// The next counter value; fails instead of wrapping at `u64::MAX`.
    pub fn advance(self) -> Result<Self> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or(Error::CounterOverflow { counter: self.0 })
    }

    /// Check that a caller-confirmed value matches this authoritative one.
    pub fn confirm(self, observed: u64) -> Result<()> {
        if observed != self.0 {
            return Err(Error::StaleCounter {
                expected: self.0,
                actual: observed,
            });
        }
        Ok(())
    }
}

impl From<u64> for PendingBalanceCounter {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for PendingBalanceCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn advance_at_max_overflows() {
        let err = PendingBalanceCounter::new(u64::MAX).advance().unwrap_err();
        assert_eq!(err, Error::CounterOverflow { counter: u64::MAX });
        assert!(err.is_fatal());
        assert!(!err.is_retryable());
    }

    #[test]
    fn confirm_reports_both_values() {
        let err = PendingBalanceCounter::new(3).confirm(2).unwrap_err();
        assert_eq!(
            err,
            Error::StaleCounter {
                expected: 3,
                actual: 2
            }
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn serializes_as_plain_integer() {
        let json = serde_json::to_string(&PendingBalanceCounter::new(42)).unwrap();
        assert_eq!(json, "42");
    }

    proptest! {
        #[test]
        fn advance_increments_by_one(value in 0u64..u64::MAX) {
            let next = PendingBalanceCounter::new(value).advance().unwrap();
            prop_assert_eq!(next.value(), value + 1);
            prop_assert!(next > PendingBalanceCounter::new(value));
        }

        #[test]
        fn confirm_accepts_only_equal(current in any::<u64>(), observed in any::<u64>()) {
            let result = PendingBalanceCounter::new(current).confirm(observed);
            prop_assert_eq!(result.is_ok(), current == observed);
        }
    }
}
