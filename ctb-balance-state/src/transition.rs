//! The `ApplyPendingBalance` state transition.
//!
//! Folds the accumulated pending balance into the available balance:
//!
//! - counter check: `request.current_pending_balance_counter == account.counter`
//! - available_next = request.current_available_balance + account.pending_balance
//! - pending_next   = 0
//! - counter_next   = counter + 1
//! - decryptable_next = request.new_decryptable_available_balance (verbatim)
//!
//! The transition is a pure function of its inputs. It does not retry; a
//! `StaleCounter` failure tells the caller to re-read the account and rebuild
//! the request.
//!
//! The decryptable balance hint is not checked against the new available
//! balance here. Binding the two is the job of the zero-knowledge proof that
//! accompanies the message and is verified before the transition is
//! authorized.

use ctb_common::CiphertextAlgebra;
use serde::{Deserialize, Serialize};

use crate::{accumulator::accumulate, AccountBalanceState, AccountKey, Error, Result};

/// A request to fold an account's pending balance into its available balance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApplyPendingBalance<C> {
    pub address: String,
    pub denom: String,

    /// Owner-computed hint for the new available balance, passed through verbatim.
    pub new_decryptable_available_balance: String,

    /// Counter value the caller observed and is confirming.
    pub current_pending_balance_counter: u64,

    /// Available balance the caller is folding pending credits into.
    pub current_available_balance: C,
}

impl<C: CiphertextAlgebra> ApplyPendingBalance<C> {
    /// Build a request confirming everything observed in `snapshot`.
    pub fn for_account(
        snapshot: &AccountBalanceState<C>,
        new_decryptable_available_balance: impl Into<String>,
    ) -> Self {
        Self {
            address: snapshot.address.clone(),
            denom: snapshot.denom.clone(),
            new_decryptable_available_balance: new_decryptable_available_balance.into(),
            current_pending_balance_counter: snapshot.pending_balance_counter.value(),
            current_available_balance: snapshot.available_balance.clone(),
        }
    }

    pub fn key(&self) -> AccountKey {
        AccountKey::new(self.address.clone(), self.denom.clone())
    }
}

/// Outcome of a successful transition.
#[derive(Clone, Debug, PartialEq)]
pub struct AppliedPendingBalance<C> {
    /// The request that was applied.
    pub request: ApplyPendingBalance<C>,

    /// The account snapshot the ledger should commit.
    pub state_next: AccountBalanceState<C>,
}

/// Apply a pending balance request to an account snapshot.
///
/// Validation order:
/// 1. the confirmed counter must equal the account's counter (`StaleCounter`)
/// 2. the request must name the same account (`AccountMismatch`)
/// 3. the folded-into balance must be the account's balance (`AvailableBalanceMismatch`)
///
/// `current_available_balance` must be the account's ciphertext byte for byte;
/// a fresh encryption of the same amount is a mismatch.
///
/// On any error the caller's snapshot is untouched.
pub fn apply_pending_balance<C: CiphertextAlgebra>(
    account: &AccountBalanceState<C>,
    request: &ApplyPendingBalance<C>,
) -> Result<AppliedPendingBalance<C>> {
    if let Err(err) = account
        .pending_balance_counter
        .confirm(request.current_pending_balance_counter)
    {
        tracing::warn!(
            address = %account.address,
            denom = %account.denom,
            counter = account.pending_balance_counter.value(),
            confirmed = request.current_pending_balance_counter,
            "apply pending balance rejected: stale counter"
        );
        return Err(err);
    }

    if request.address != account.address || request.denom != account.denom {
        return Err(Error::AccountMismatch {
            request: request.key().to_string(),
            account: account.key().to_string(),
        });
    }

    if request.current_available_balance != account.available_balance {
        return Err(Error::AvailableBalanceMismatch);
    }

    let available_balance = accumulate(&request.current_available_balance, &account.pending_balance);

    let pending_balance_counter = match account.pending_balance_counter.advance() {
        Ok(next) => next,
        Err(err) => {
            tracing::error!(
                address = %account.address,
                denom = %account.denom,
                counter = account.pending_balance_counter.value(),
                "pending balance counter overflow"
            );
            return Err(err);
        }
    };

    let state_next = AccountBalanceState {
        address: account.address.clone(),
        denom: account.denom.clone(),
        available_balance,
        pending_balance: C::zero(),
        pending_balance_counter,
        pending_credit_count: 0,
        decryptable_available_balance: request.new_decryptable_available_balance.clone(),
    };

    tracing::debug!(
        address = %account.address,
        denom = %account.denom,
        folded_credits = account.pending_credit_count,
        counter = pending_balance_counter.value(),
        "pending balance applied"
    );

    Ok(AppliedPendingBalance {
        request: request.clone(),
        state_next,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PendingBalanceCounter;
    use ctb_common::{ElGamalCiphertext, ModularCiphertext};
    use ctb_test_fixtures::{fixtures, SAMPLE_DENOM};
    use proptest::prelude::*;

    fn elgamal_account(available: u64, pending: u64, counter: u64) -> AccountBalanceState<ElGamalCiphertext> {
        let fx = fixtures();
        AccountBalanceState {
            available_balance: fx.encrypt(available),
            pending_balance: fx.encrypt(pending),
            pending_balance_counter: PendingBalanceCounter::new(counter),
            pending_credit_count: 1,
            ..AccountBalanceState::new(fx.address(), SAMPLE_DENOM)
        }
    }

    fn modular_account(available: u64, pending: u64, counter: u64) -> AccountBalanceState<ModularCiphertext> {
        AccountBalanceState {
            available_balance: ModularCiphertext::encrypt(available, 11),
            pending_balance: ModularCiphertext::encrypt(pending, 29),
            pending_balance_counter: PendingBalanceCounter::new(counter),
            ..AccountBalanceState::new("she1modular", SAMPLE_DENOM)
        }
    }

    #[test]
    fn folds_pending_into_available() {
        let fx = fixtures();
        let account = elgamal_account(10, 5, 3);
        let request = ApplyPendingBalance::for_account(&account, "hint-15");
        assert_eq!(request.current_pending_balance_counter, 3);

        let applied = apply_pending_balance(&account, &request).unwrap();
        let next = &applied.state_next;

        assert_eq!(fx.decrypt(&next.available_balance), Some(15));
        assert_eq!(fx.decrypt(&next.pending_balance), Some(0));
        assert!(next.pending_balance.is_zero());
        assert_eq!(next.pending_balance_counter.value(), 4);
        assert_eq!(next.pending_credit_count, 0);
        assert_eq!(next.decryptable_available_balance, "hint-15");
        assert_eq!(applied.request, request);
    }

    #[test]
    fn stale_counter_is_rejected() {
        let account = elgamal_account(10, 5, 3);
        let mut request = ApplyPendingBalance::for_account(&account, "hint");
        request.current_pending_balance_counter = 2;
        let before = account.clone();

        let err = apply_pending_balance(&account, &request).unwrap_err();
        assert_eq!(
            err,
            Error::StaleCounter {
                expected: 3,
                actual: 2
            }
        );
        assert_eq!(account, before);
    }

    #[test]
    fn stale_counter_wins_over_other_validation() {
        let account = modular_account(1, 1, 8);
        let request = ApplyPendingBalance {
            address: "she1other".into(),
            denom: "uother".into(),
            new_decryptable_available_balance: String::new(),
            current_pending_balance_counter: 9,
            current_available_balance: ModularCiphertext::encrypt(99, 1),
        };
        assert!(matches!(
            apply_pending_balance(&account, &request),
            Err(Error::StaleCounter { expected: 8, actual: 9 })
        ));
    }

    #[test]
    fn counter_overflow_is_fatal() {
        let account = modular_account(1, 2, u64::MAX);
        let request = ApplyPendingBalance::for_account(&account, "hint");

        let err = apply_pending_balance(&account, &request).unwrap_err();
        assert_eq!(err, Error::CounterOverflow { counter: u64::MAX });
        assert!(err.is_fatal());
    }

    #[test]
    fn other_account_is_rejected() {
        let account = modular_account(1, 2, 0);
        let mut request = ApplyPendingBalance::for_account(&account, "hint");
        request.denom = "uatom".into();

        assert!(matches!(
            apply_pending_balance(&account, &request),
            Err(Error::AccountMismatch { .. })
        ));
    }

    #[test]
    fn foreign_available_balance_is_rejected() {
        let account = modular_account(1, 2, 0);
        let mut request = ApplyPendingBalance::for_account(&account, "hint");
        request.current_available_balance = ModularCiphertext::encrypt(1, 12);

        assert_eq!(
            apply_pending_balance(&account, &request).unwrap_err(),
            Error::AvailableBalanceMismatch
        );
    }

    #[test]
    fn reencrypted_available_balance_is_rejected() {
        let fx = fixtures();
        let account = elgamal_account(10, 5, 3);
        let mut request = ApplyPendingBalance::for_account(&account, "hint");
        // same plaintext, different opening
        request.current_available_balance = fx.encrypt(4) + fx.encrypt(6);
        assert_eq!(fx.decrypt(&request.current_available_balance), Some(10));
        assert_ne!(request.current_available_balance, account.available_balance);

        assert_eq!(
            apply_pending_balance(&account, &request).unwrap_err(),
            Error::AvailableBalanceMismatch
        );
    }

    #[test]
    fn applying_with_nothing_pending_still_advances() {
        let account = AccountBalanceState::<ModularCiphertext>::new("she1abc", SAMPLE_DENOM);
        let applied =
            apply_pending_balance(&account, &ApplyPendingBalance::for_account(&account, "")).unwrap();
        assert!(applied.state_next.available_balance.is_zero());
        assert_eq!(applied.state_next.pending_balance_counter.value(), 1);
    }

    proptest! {
        #[test]
        fn successful_apply_sums_and_advances(
            available in 0u64..30_000,
            pending in 0u64..30_000,
            counter in 0u64..u64::MAX,
        ) {
            let account = modular_account(available, pending, counter);
            let request = ApplyPendingBalance::for_account(&account, "hint");
            let next = apply_pending_balance(&account, &request).unwrap().state_next;

            prop_assert_eq!(next.available_balance.decrypt() as u64, available + pending);
            prop_assert_eq!(next.pending_balance, ModularCiphertext::zero());
            prop_assert_eq!(next.pending_balance_counter.value(), counter + 1);
        }

        #[test]
        fn mismatched_counter_always_stale(counter in any::<u64>(), confirmed in any::<u64>()) {
            prop_assume!(counter != confirmed);
            let account = modular_account(3, 4, counter);
            let mut request = ApplyPendingBalance::for_account(&account, "hint");
            request.current_pending_balance_counter = confirmed;

            let is_stale = matches!(
                apply_pending_balance(&account, &request),
                Err(Error::StaleCounter { .. })
            );
            prop_assert!(is_stale);
        }
    }
}
