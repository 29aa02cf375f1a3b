//! Confidential Balance State Machine
//!
//! Each `(address, denom)` holds two encrypted balances and a counter:
//! ```text
//! AccountBalanceState = {
//!     available_balance:       C    - spendable, only the owner moves it
//!     pending_balance:         C    - sum of incoming transfers not yet applied
//!     pending_balance_counter: u64  - number of applications so far
//! }
//! ```
//!
//! `C` is any additively homomorphic ciphertext ([`CiphertextAlgebra`]);
//! production uses twisted ElGamal over Ristretto. Adding ciphertexts adds
//! the amounts they hide, so incoming transfers are folded into the pending
//! balance without decrypting anything.
//!
//! # Transitions
//!
//! - credit: `pending += incoming`
//! - apply:  `available = available + pending`, `pending = 0`, `counter += 1`,
//!   guarded by the counter the owner observed
//!
//! Transitions are pure functions over snapshots. A [`BalanceLedger`] holds
//! the authoritative state and commits snapshots with compare-and-swap.
//!
//! [`CiphertextAlgebra`]: ctb_common::CiphertextAlgebra

pub mod accumulator;
pub mod config;
pub mod counter;
pub mod error;
pub mod ledger;
pub mod message;
pub mod state;
pub mod transition;

pub use accumulator::{accumulate, accumulate_all};
pub use config::BalanceStateConfig;
pub use counter::PendingBalanceCounter;
pub use error::{Error, Result};
pub use ledger::{apply_with_retry, BalanceLedger, InMemoryLedger};
pub use message::{to_message, CiphertextProto, MsgApplyPendingBalance, MsgApplyPendingBalanceProto};
pub use state::{AccountBalanceState, AccountKey};
pub use transition::{apply_pending_balance, AppliedPendingBalance, ApplyPendingBalance};
