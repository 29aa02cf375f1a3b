//! Canonical wire encoding for ciphertexts.
//!
//! A wire ciphertext is the fixed-length concatenation `commitment || handle`.
//! Both components are always produced and consumed together.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::{CiphertextAlgebra, MalformedCiphertext};

/// Encoded ciphertext bytes as carried in wire messages.
///
/// Construction does not validate; [`decode`] does.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct WireCiphertext(Vec<u8>);

impl WireCiphertext {
    /// Wrap raw bytes received from the wire.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Parse a hex string (with or without `0x` prefix).
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        hex::decode(stripped).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Split into `(commitment, handle)` for a ciphertext type `C`.
    pub fn split_components<C: CiphertextAlgebra>(
        &self,
    ) -> Result<(&[u8], &[u8]), MalformedCiphertext> {
        check_len(self.0.len(), C::ENCODED_LEN)?;
        Ok(self.0.split_at(C::COMPONENT_LEN))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for WireCiphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for WireCiphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WireCiphertext(0x{})", self.to_hex())
    }
}

impl AsRef<[u8]> for WireCiphertext {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Serialized as standard base64, the form JSON wire messages use for bytes.
impl Serialize for WireCiphertext {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&BASE64.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for WireCiphertext {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        BASE64
            .decode(encoded.as_bytes())
            .map(Self)
            .map_err(de::Error::custom)
    }
}

/// Encode a ciphertext into its canonical wire form.
pub fn encode<C: CiphertextAlgebra>(ciphertext: &C) -> WireCiphertext {
    let mut bytes = Vec::with_capacity(C::ENCODED_LEN);
    bytes.extend_from_slice(&ciphertext.commitment_bytes());
    bytes.extend_from_slice(&ciphertext.handle_bytes());
    debug_assert_eq!(bytes.len(), C::ENCODED_LEN);
    WireCiphertext(bytes)
}

/// Decode a ciphertext from its canonical wire form.
pub fn decode<C: CiphertextAlgebra>(bytes: &[u8]) -> Result<C, MalformedCiphertext> {
    check_len(bytes.len(), C::ENCODED_LEN)?;
    let (commitment, handle) = bytes.split_at(C::COMPONENT_LEN);
    C::from_components(commitment, handle)
}

/// Decode a ciphertext supplied as separate components.
pub fn decode_components<C: CiphertextAlgebra>(
    commitment: &[u8],
    handle: &[u8],
) -> Result<C, MalformedCiphertext> {
    check_len(commitment.len(), C::COMPONENT_LEN)?;
    check_len(handle.len(), C::COMPONENT_LEN)?;
    C::from_components(commitment, handle)
}

fn check_len(actual: usize, expected: usize) -> Result<(), MalformedCiphertext> {
    if actual != expected {
        return Err(MalformedCiphertext::Length { expected, actual });
    }
    Ok(())
}

/// Copy a component slice into a fixed array.
pub(crate) fn component_array<const N: usize>(bytes: &[u8]) -> Result<[u8; N], MalformedCiphertext> {
    <[u8; N]>::try_from(bytes).map_err(|_| MalformedCiphertext::Length {
        expected: N,
        actual: bytes.len(),
    })
}
