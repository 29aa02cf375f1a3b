//! Twisted ElGamal over the Ristretto group.
//!
//! ```text
//! P = s^-1 * H                 (public key)
//! C = v * G + r * H            (commitment)
//! D = r * P                    (decryption handle)
//! C - s * D = v * G            (decryption, followed by a bounded discrete log)
//! ```
//!
//! `G` is the Ristretto basepoint and `H` a hash-to-group Pedersen generator.
//! Adding two ciphertexts component-wise yields a ciphertext of the sum.

use std::{fmt, ops::Add};

use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_POINT as G,
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
    traits::Identity,
};
use once_cell::sync::Lazy;
use rand_core::{CryptoRng, RngCore};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha512;
use zeroize::Zeroize;

use crate::{
    codec::{self, component_array},
    CiphertextAlgebra, Component, ElGamalError, MalformedCiphertext, POINT_LEN,
};

/// Domain separator for the Pedersen `H` generator.
const PEDERSEN_H_DOMAIN: &[u8] = b"ctb/pedersen-h/v1";

/// Secondary Pedersen generator `H`, independent of `G`.
pub static PEDERSEN_H: Lazy<RistrettoPoint> =
    Lazy::new(|| RistrettoPoint::hash_from_bytes::<Sha512>(PEDERSEN_H_DOMAIN));

/// ElGamal secret scalar `s`. Zeroized on drop.
#[derive(Clone, Zeroize)]
pub struct ElGamalSecretKey(Scalar);

impl Drop for ElGamalSecretKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl ElGamalSecretKey {
    /// Sample a fresh non-zero secret key.
    pub fn new_rand<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        loop {
            let scalar = Scalar::random(rng);
            if scalar != Scalar::ZERO {
                return Self(scalar);
            }
        }
    }

    /// Derive a secret key deterministically from seed material.
    pub fn from_seed(seed: &[u8]) -> Result<Self, ElGamalError> {
        let scalar = Scalar::hash_from_bytes::<Sha512>(seed);
        if scalar == Scalar::ZERO {
            return Err(ElGamalError::InvalidSecretKey);
        }
        Ok(Self(scalar))
    }

    /// Parse a canonical little-endian scalar.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, ElGamalError> {
        let scalar: Option<Scalar> = Scalar::from_canonical_bytes(*bytes).into();
        match scalar {
            Some(s) if s != Scalar::ZERO => Ok(Self(s)),
            _ => Err(ElGamalError::InvalidSecretKey),
        }
    }

    pub fn from_hex(s: &str) -> Result<Self, ElGamalError> {
        let bytes = parse_hex_32(s)?;
        Self::from_bytes(&bytes).map_err(|_| ElGamalError::InvalidSecretKey)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// The matching public key `s^-1 * H`.
    pub fn pubkey(&self) -> ElGamalPubkey {
        ElGamalPubkey(self.0.invert() * *PEDERSEN_H)
    }

    /// Strip the randomness from a ciphertext, leaving `v * G`.
    pub fn decrypt(&self, ciphertext: &ElGamalCiphertext) -> RistrettoPoint {
        ciphertext.commitment - self.0 * ciphertext.handle
    }

    /// Decrypt to an integer by searching `0..=bound`.
    ///
    /// Returns `None` when the plaintext is larger than `bound`.
    pub fn decrypt_u64(&self, ciphertext: &ElGamalCiphertext, bound: u64) -> Option<u64> {
        let target = self.decrypt(ciphertext);
        let mut candidate = RistrettoPoint::identity();
        for value in 0..=bound {
            if candidate == target {
                return Some(value);
            }
            candidate += G;
        }
        None
    }
}

impl fmt::Debug for ElGamalSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ElGamalSecretKey(..)")
    }
}

/// ElGamal public key `P = s^-1 * H`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElGamalPubkey(RistrettoPoint);

impl ElGamalPubkey {
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, ElGamalError> {
        CompressedRistretto(*bytes)
            .decompress()
            .map(Self)
            .ok_or(ElGamalError::InvalidPubkey)
    }

    pub fn from_hex(s: &str) -> Result<Self, ElGamalError> {
        Self::from_bytes(&parse_hex_32(s)?)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.compress().to_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Encrypt `amount` under fresh randomness.
    pub fn encrypt<R: RngCore + CryptoRng>(&self, amount: u64, rng: &mut R) -> ElGamalCiphertext {
        let opening = Scalar::random(rng);
        self.encrypt_with(amount, &opening)
    }

    /// Encrypt `amount` with an explicit Pedersen opening `r`.
    pub fn encrypt_with(&self, amount: u64, opening: &Scalar) -> ElGamalCiphertext {
        ElGamalCiphertext {
            commitment: Scalar::from(amount) * G + opening * *PEDERSEN_H,
            handle: opening * self.0,
        }
    }
}

/// Secret and public key together.
#[derive(Clone, Debug)]
pub struct ElGamalKeypair {
    pub public: ElGamalPubkey,
    pub secret: ElGamalSecretKey,
}

impl ElGamalKeypair {
    pub fn new_rand<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::from_secret(ElGamalSecretKey::new_rand(rng))
    }

    pub fn from_seed(seed: &[u8]) -> Result<Self, ElGamalError> {
        ElGamalSecretKey::from_seed(seed).map(Self::from_secret)
    }

    pub fn from_secret(secret: ElGamalSecretKey) -> Self {
        Self {
            public: secret.pubkey(),
            secret,
        }
    }
}

/// A twisted ElGamal ciphertext `(C, D)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElGamalCiphertext {
    /// Pedersen commitment to the amount
    pub commitment: RistrettoPoint,
    /// Decryption handle binding the commitment's randomness to a public key
    pub handle: RistrettoPoint,
}

impl CiphertextAlgebra for ElGamalCiphertext {
    const COMPONENT_LEN: usize = POINT_LEN;

    fn zero() -> Self {
        Self {
            commitment: RistrettoPoint::identity(),
            handle: RistrettoPoint::identity(),
        }
    }

    fn combine(&self, other: &Self) -> Self {
        Self {
            commitment: self.commitment + other.commitment,
            handle: self.handle + other.handle,
        }
    }

    fn commitment_bytes(&self) -> Vec<u8> {
        self.commitment.compress().to_bytes().to_vec()
    }

    fn handle_bytes(&self) -> Vec<u8> {
        self.handle.compress().to_bytes().to_vec()
    }

    fn from_components(commitment: &[u8], handle: &[u8]) -> Result<Self, MalformedCiphertext> {
        Ok(Self {
            commitment: decompress(commitment, Component::Commitment)?,
            handle: decompress(handle, Component::Handle)?,
        })
    }
}

impl Add for ElGamalCiphertext {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.combine(&rhs)
    }
}

impl fmt::Display for ElGamalCiphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", codec::encode(self))
    }
}

/// Serialized as the hex of its wire encoding.
impl Serialize for ElGamalCiphertext {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&codec::encode(self).to_hex())
    }
}

impl<'de> Deserialize<'de> for ElGamalCiphertext {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let wire = codec::WireCiphertext::from_hex(&s).map_err(de::Error::custom)?;
        codec::decode(wire.as_bytes()).map_err(de::Error::custom)
    }
}

fn decompress(bytes: &[u8], component: Component) -> Result<RistrettoPoint, MalformedCiphertext> {
    let arr = component_array::<POINT_LEN>(bytes)?;
    CompressedRistretto(arr)
        .decompress()
        .ok_or(MalformedCiphertext::InvalidElement { component })
}

fn parse_hex_32(s: &str) -> Result<[u8; 32], ElGamalError> {
    let mut out = [0u8; 32];
    hex::decode_to_slice(s.strip_prefix("0x").unwrap_or(s), &mut out)?;
    Ok(out)
}
