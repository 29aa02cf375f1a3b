//! Error types for ciphertext decoding and key handling

use std::fmt;

use thiserror::Error;

/// Which half of a two-component ciphertext an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// The Pedersen commitment `C`
    Commitment,
    /// The decryption handle `D`
    Handle,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Commitment => f.write_str("commitment"),
            Component::Handle => f.write_str("handle"),
        }
    }
}

/// A wire ciphertext that cannot be decoded.
///
/// Decoding never substitutes a default ciphertext; every failure surfaces as
/// one of these variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedCiphertext {
    /// The byte string has the wrong length
    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    /// A component does not decode to a valid group element
    #[error("{component} is not a valid group element")]
    InvalidElement { component: Component },

    /// The message carried no ciphertext at all
    #[error("ciphertext is missing")]
    Missing,
}

/// Errors from ElGamal key handling
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ElGamalError {
    /// Secret key bytes are not a canonical non-zero scalar
    #[error("invalid secret key")]
    InvalidSecretKey,

    /// Public key bytes are not a valid Ristretto point
    #[error("invalid public key")]
    InvalidPubkey,

    /// Hex input could not be parsed
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}
