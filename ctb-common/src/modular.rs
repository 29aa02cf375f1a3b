//! A deterministic stand-in algebra over integers modulo a small prime.
//!
//! `ModularCiphertext` behaves like an additively homomorphic ciphertext
//! (`commitment = v + r`, `handle = r`, both mod [`MODULUS`]) but is trivially
//! decryptable. It exists so the balance engine's algebraic laws can be
//! checked quickly and exhaustively; it provides no confidentiality.

use crate::{codec::component_array, CiphertextAlgebra, Component, MalformedCiphertext};

/// Largest prime below 2^16.
pub const MODULUS: u32 = 65_521;

const COMPONENT_LEN: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModularCiphertext {
    commitment: u32,
    handle: u32,
}

impl ModularCiphertext {
    /// Build from raw residues, rejecting values outside the field.
    pub fn new(commitment: u32, handle: u32) -> Option<Self> {
        (commitment < MODULUS && handle < MODULUS).then_some(Self { commitment, handle })
    }

    /// "Encrypt" `value` with `randomness`; both are reduced mod [`MODULUS`].
    pub fn encrypt(value: u64, randomness: u64) -> Self {
        let v = reduce(value);
        let r = reduce(randomness);
        Self {
            commitment: (v + r) % MODULUS,
            handle: r,
        }
    }

    /// Recover `value mod MODULUS`.
    pub fn decrypt(&self) -> u32 {
        (self.commitment + MODULUS - self.handle) % MODULUS
    }
}

impl CiphertextAlgebra for ModularCiphertext {
    const COMPONENT_LEN: usize = COMPONENT_LEN;

    fn zero() -> Self {
        Self {
            commitment: 0,
            handle: 0,
        }
    }

    fn combine(&self, other: &Self) -> Self {
        Self {
            commitment: (self.commitment + other.commitment) % MODULUS,
            handle: (self.handle + other.handle) % MODULUS,
        }
    }

    fn commitment_bytes(&self) -> Vec<u8> {
        self.commitment.to_be_bytes().to_vec()
    }

    fn handle_bytes(&self) -> Vec<u8> {
        self.handle.to_be_bytes().to_vec()
    }

    fn from_components(commitment: &[u8], handle: &[u8]) -> Result<Self, MalformedCiphertext> {
        Ok(Self {
            commitment: residue(commitment, Component::Commitment)?,
            handle: residue(handle, Component::Handle)?,
        })
    }
}

fn reduce(x: u64) -> u32 {
    (x % MODULUS as u64) as u32
}

fn residue(bytes: &[u8], component: Component) -> Result<u32, MalformedCiphertext> {
    let value = u32::from_be_bytes(component_array::<COMPONENT_LEN>(bytes)?);
    if value >= MODULUS {
        return Err(MalformedCiphertext::InvalidElement { component });
    }
    Ok(value)
}
