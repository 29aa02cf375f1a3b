//! Shared ciphertext primitives for confidential balances.
//!
//! Balances are held as two-component homomorphic ciphertexts
//! (`commitment`, `decryption handle`). This crate provides:
//!
//! - [`CiphertextAlgebra`]: the capability the balance engine is generic over
//!   (identity, homomorphic combine, component encoding)
//! - [`ElGamalCiphertext`]: twisted ElGamal over the Ristretto group
//! - [`ModularCiphertext`]: a small deterministic algebra used to check the
//!   algebraic laws without elliptic-curve arithmetic
//! - [`codec`]: the canonical fixed-length wire form `commitment || handle`
//!
//! # Wire layout
//!
//! ```text
//! WireCiphertext = commitment (COMPONENT_LEN bytes) || handle (COMPONENT_LEN bytes)
//! ```
//!
//! For [`ElGamalCiphertext`] each component is a 32-byte compressed Ristretto
//! point, giving a 64-byte ciphertext.

pub mod address;
pub mod algebra;
pub mod codec;
pub mod elgamal;
mod error;
pub mod modular;

pub use algebra::CiphertextAlgebra;
pub use codec::{decode, encode, WireCiphertext};
pub use elgamal::{ElGamalCiphertext, ElGamalKeypair, ElGamalPubkey, ElGamalSecretKey};
pub use error::{Component, ElGamalError, MalformedCiphertext};
pub use modular::ModularCiphertext;

/// Bech32 human-readable prefix of account addresses.
pub const DEFAULT_ACCOUNT_HRP: &str = "she";

/// Byte length of an encoded Ristretto point.
pub const POINT_LEN: usize = 32;

/// Byte length of an encoded [`ElGamalCiphertext`].
pub const ELGAMAL_CIPHERTEXT_LEN: usize = 2 * POINT_LEN;
