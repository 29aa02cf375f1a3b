//! Configuration for the balance state machine.

use std::env;

use serde::{Deserialize, Serialize};

/// Env var overriding [`BalanceStateConfig::max_pending_credits`].
pub const MAX_PENDING_CREDITS_ENV: &str = "CTB_MAX_PENDING_CREDITS";

/// Env var overriding [`BalanceStateConfig::max_apply_attempts`].
pub const MAX_APPLY_ATTEMPTS_ENV: &str = "CTB_MAX_APPLY_ATTEMPTS";

/// Tunables for crediting and applying pending balances.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceStateConfig {
    /// Maximum number of unapplied incoming credits per account.
    ///
    /// Bounds the discrete-log search the owner needs to read the pending
    /// balance.
    #[serde(default = "default_max_pending_credits")]
    pub max_pending_credits: u32,

    /// Attempts made by the ledger-side retry driver before surfacing
    /// `StaleCounter` to the caller.
    #[serde(default = "default_max_apply_attempts")]
    pub max_apply_attempts: u32,
}

fn default_max_pending_credits() -> u32 {
    u16::MAX as u32
}

fn default_max_apply_attempts() -> u32 {
    3
}

impl Default for BalanceStateConfig {
    fn default() -> Self {
        Self {
            max_pending_credits: default_max_pending_credits(),
            max_apply_attempts: default_max_apply_attempts(),
        }
    }
}

impl BalanceStateConfig {
    /// Load from the environment; unset or unparsable values use defaults.
    pub fn from_env() -> Self {
        let max_pending_credits = env::var(MAX_PENDING_CREDITS_ENV)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(default_max_pending_credits);

        let max_apply_attempts = env::var(MAX_APPLY_ATTEMPTS_ENV)
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|attempts: &u32| *attempts > 0)
            .unwrap_or_else(default_max_apply_attempts);

        Self {
            max_pending_credits,
            max_apply_attempts,
        }
    }
}
