//! The ciphertext capability the balance engine is generic over.

use std::fmt::Debug;

use crate::MalformedCiphertext;

/// A two-component additively homomorphic ciphertext.
///
/// Implementors must make [`combine`](Self::combine) associative and
/// commutative with [`zero`](Self::zero) as its identity: pending credits are
/// folded in arrival order, and the folded result may not depend on it.
pub trait CiphertextAlgebra: Clone + PartialEq + Debug {
    /// Encoded length of a single component.
    const COMPONENT_LEN: usize;

    /// Encoded length of the whole ciphertext (`commitment || handle`).
    const ENCODED_LEN: usize = 2 * Self::COMPONENT_LEN;

    /// Ciphertext of zero under zero randomness.
    fn zero() -> Self;

    /// Homomorphic addition: the result decrypts to the sum of the plaintexts.
    fn combine(&self, other: &Self) -> Self;

    /// Canonical encoding of the commitment, exactly `COMPONENT_LEN` bytes.
    fn commitment_bytes(&self) -> Vec<u8>;

    /// Canonical encoding of the decryption handle, exactly `COMPONENT_LEN` bytes.
    fn handle_bytes(&self) -> Vec<u8>;

    /// Rebuild a ciphertext from its encoded components.
    ///
    /// Callers pass slices of exactly `COMPONENT_LEN` bytes; length checks
    /// live in [`crate::codec::decode`].
    fn from_components(commitment: &[u8], handle: &[u8]) -> Result<Self, MalformedCiphertext>;

    /// Whether this is the identity ciphertext.
    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }
}
