//! Account balance snapshots.
//!
//! The ledger owns account state. Everything here works on snapshots passed
//! by value and returns new snapshots; nothing is retained between calls.

use std::fmt;

use ctb_common::CiphertextAlgebra;
use serde::{Deserialize, Serialize};

use crate::{accumulator::accumulate, BalanceStateConfig, Error, PendingBalanceCounter, Result};

/// Identifies one confidential balance: an account's holding of one denom.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountKey {
    pub address: String,
    pub denom: String,
}

impl AccountKey {
    pub fn new(address: impl Into<String>, denom: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            denom: denom.into(),
        }
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.denom)
    }
}

/// Encrypted balance state of one `(address, denom)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountBalanceState<C> {
    /// Account address (bech32, validated by the caller).
    pub address: String,

    /// Token denomination.
    pub denom: String,

    /// Spendable balance.
    pub available_balance: C,

    /// Incoming credits not yet folded into the available balance.
    pub pending_balance: C,

    /// Number of pending-balance applications so far.
    pub pending_balance_counter: PendingBalanceCounter,

    /// Incoming credits accumulated since the last application.
    #[serde(default)]
    pub pending_credit_count: u32,

    /// Owner/auditor-decryptable hint of the available balance.
    /// Opaque here; refreshed verbatim on every application.
    #[serde(default)]
    pub decryptable_available_balance: String,
}

impl<C: CiphertextAlgebra> AccountBalanceState<C> {
    /// State of an account on its first incoming transfer.
    pub fn new(address: impl Into<String>, denom: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            denom: denom.into(),
            available_balance: C::zero(),
            pending_balance: C::zero(),
            pending_balance_counter: PendingBalanceCounter::default(),
            pending_credit_count: 0,
            decryptable_available_balance: String::new(),
        }
    }

    pub fn key(&self) -> AccountKey {
        AccountKey::new(self.address.clone(), self.denom.clone())
    }

    /// Whether there are unapplied credits.
    pub fn has_pending(&self) -> bool {
        self.pending_credit_count > 0
    }

    /// Snapshot with `incoming` folded into the pending balance.
    pub fn credit_pending(&self, incoming: &C, config: &BalanceStateConfig) -> Result<Self> {
        if self.pending_credit_count >= config.max_pending_credits {
            tracing::warn!(
                address = %self.address,
                denom = %self.denom,
                limit = config.max_pending_credits,
                "pending credit rejected: limit reached"
            );
            return Err(Error::PendingCreditLimit {
                limit: config.max_pending_credits,
            });
        }

        let mut next = self.clone();
        next.pending_balance = accumulate(&self.pending_balance, incoming);
        next.pending_credit_count += 1;

        tracing::debug!(
            address = %self.address,
            denom = %self.denom,
            pending_credit_count = next.pending_credit_count,
            "pending credit accumulated"
        );
        Ok(next)
    }
}
