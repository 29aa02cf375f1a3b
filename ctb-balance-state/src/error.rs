//! Error types for balance state transitions

use ctb_common::MalformedCiphertext;
use thiserror::Error;

/// Result type alias for balance state operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while crediting or applying pending balances
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A wire ciphertext failed to decode
    #[error("malformed ciphertext in `{field}`: {source}")]
    MalformedCiphertext {
        field: &'static str,
        source: MalformedCiphertext,
    },

    /// The request was built against an outdated pending balance counter
    #[error("stale pending balance counter: account is at {expected}, request confirms {actual}")]
    StaleCounter { expected: u64, actual: u64 },

    /// A credit landed between reading the account and committing the transition
    #[error("concurrent credit to {account} since the snapshot was read")]
    ConcurrentCredit { account: String },

    /// Advancing the counter would wrap
    #[error("pending balance counter overflow at {counter}")]
    CounterOverflow { counter: u64 },

    /// The request names a different account than the snapshot
    #[error("request for {request} applied to account {account}")]
    AccountMismatch { request: String, account: String },

    /// The request folds into a different available balance than the account holds
    #[error("current available balance does not match the account's available balance")]
    AvailableBalanceMismatch,

    /// The account already holds the maximum number of unapplied credits
    #[error("pending credit limit reached: {limit} unapplied credits")]
    PendingCreditLimit { limit: u32 },

    /// The ledger has no state for the account
    #[error("account not found: {address}/{denom}")]
    AccountNotFound { address: String, denom: String },

    /// Protobuf decoding error
    #[error("protobuf decode error: {0}")]
    ProtoDecode(String),
}

impl Error {
    /// Whether re-reading the account and rebuilding the request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::StaleCounter { .. } | Error::ConcurrentCredit { .. }
        )
    }

    /// Whether the error signals a protocol bug or adversarial input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::CounterOverflow { .. })
    }

    pub(crate) fn malformed(field: &'static str) -> impl FnOnce(MalformedCiphertext) -> Error {
        move |source| Error::MalformedCiphertext { field, source }
    }
}

impl From<prost::DecodeError> for Error {
    fn from(e: prost::DecodeError) -> Self {
        Error::ProtoDecode(e.to_string())
    }
}
