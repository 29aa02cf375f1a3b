//! Ledger seam for account balance state.
//!
//! The transition in [`crate::transition`] is pure; the ledger is where
//! snapshots are read and committed. Commits are compare-and-swap against the
//! snapshot the caller observed, so a transition built on outdated state is
//! never written:
//!
//! - a different counter means another application won (`StaleCounter`)
//! - same counter but different pending state means a credit landed in
//!   between (`ConcurrentCredit`)
//!
//! Both are retryable: re-read, rebuild the request, apply again.

use std::{collections::HashMap, sync::Mutex};

use ctb_common::CiphertextAlgebra;

use crate::{
    apply_pending_balance, AccountBalanceState, AccountKey, AppliedPendingBalance,
    ApplyPendingBalance, BalanceStateConfig, Error, Result,
};

/// Storage for encrypted account balances.
pub trait BalanceLedger<C: CiphertextAlgebra> {
    /// Current snapshot of `(address, denom)`.
    fn read_account_state(&self, address: &str, denom: &str) -> Result<AccountBalanceState<C>>;

    /// Replace `observed` with `next`, failing if the stored state is no longer `observed`.
    fn commit(&self, observed: &AccountBalanceState<C>, next: AccountBalanceState<C>) -> Result<()>;

    /// Fold an incoming transfer into the pending balance, creating the
    /// account on its first credit. Returns the new snapshot.
    fn credit(
        &self,
        address: &str,
        denom: &str,
        incoming: &C,
        config: &BalanceStateConfig,
    ) -> Result<AccountBalanceState<C>>;
}

/// Process-local ledger, used by tests and the CLI.
#[derive(Debug)]
pub struct InMemoryLedger<C> {
    accounts: Mutex<HashMap<AccountKey, AccountBalanceState<C>>>,
}

impl<C> Default for InMemoryLedger<C> {
    fn default() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
        }
    }
}

impl<C: CiphertextAlgebra> InMemoryLedger<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the ledger with existing snapshots.
    pub fn with_accounts(accounts: impl IntoIterator<Item = AccountBalanceState<C>>) -> Self {
        let accounts = accounts
            .into_iter()
            .map(|state| (state.key(), state))
            .collect();
        Self {
            accounts: Mutex::new(accounts),
        }
    }

    /// All stored snapshots, ordered by key.
    pub fn accounts(&self) -> Vec<AccountBalanceState<C>> {
        let accounts = self.accounts.lock().expect("ledger poisoned");
        let mut states: Vec<_> = accounts.values().cloned().collect();
        states.sort_by_key(|state| state.key());
        states
    }
}

impl<C: CiphertextAlgebra> BalanceLedger<C> for InMemoryLedger<C> {
    fn read_account_state(&self, address: &str, denom: &str) -> Result<AccountBalanceState<C>> {
        let key = AccountKey::new(address, denom);
        self.accounts
            .lock()
            .expect("ledger poisoned")
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::AccountNotFound {
                address: key.address,
                denom: key.denom,
            })
    }

    fn commit(&self, observed: &AccountBalanceState<C>, next: AccountBalanceState<C>) -> Result<()> {
        let key = observed.key();
        let mut accounts = self.accounts.lock().expect("ledger poisoned");
        let current = accounts.get(&key).ok_or_else(|| Error::AccountNotFound {
            address: key.address.clone(),
            denom: key.denom.clone(),
        })?;

        current
            .pending_balance_counter
            .confirm(observed.pending_balance_counter.value())?;

        if current != observed {
            return Err(Error::ConcurrentCredit {
                account: key.to_string(),
            });
        }

        accounts.insert(key, next);
        Ok(())
    }

    fn credit(
        &self,
        address: &str,
        denom: &str,
        incoming: &C,
        config: &BalanceStateConfig,
    ) -> Result<AccountBalanceState<C>> {
        let key = AccountKey::new(address, denom);
        let mut accounts = self.accounts.lock().expect("ledger poisoned");

        let next = match accounts.get(&key) {
            Some(current) => current.credit_pending(incoming, config)?,
            None => {
                tracing::info!(account = %key, "creating account on first credit");
                AccountBalanceState::new(address, denom).credit_pending(incoming, config)?
            }
        };

        accounts.insert(key, next.clone());
        Ok(next)
    }
}

/// Read, build, apply and commit, retrying on retryable failures.
///
/// `build_request` is called with a fresh snapshot on every attempt. Gives up
/// after `config.max_apply_attempts` and returns the last error.
pub fn apply_with_retry<C, L, F>(
    ledger: &L,
    address: &str,
    denom: &str,
    config: &BalanceStateConfig,
    mut build_request: F,
) -> Result<AppliedPendingBalance<C>>
where
    C: CiphertextAlgebra,
    L: BalanceLedger<C> + ?Sized,
    F: FnMut(&AccountBalanceState<C>) -> ApplyPendingBalance<C>,
{
    let max_attempts = config.max_apply_attempts.max(1);
    let mut attempt = 1;

    loop {
        let result = ledger
            .read_account_state(address, denom)
            .and_then(|snapshot| {
                let request = build_request(&snapshot);
                let applied = apply_pending_balance(&snapshot, &request)?;
                ledger.commit(&snapshot, applied.state_next.clone())?;
                Ok(applied)
            });

        match result {
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                tracing::info!(
                    address,
                    denom,
                    attempt,
                    max_attempts,
                    error = %err,
                    "retrying apply pending balance"
                );
                attempt += 1;
            }
            other => return other,
        }
    }
}
