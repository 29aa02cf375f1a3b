//! Mapping between `ApplyPendingBalance` requests and wire messages.
//!
//! The adapter is purely structural: `address`, `denom`,
//! `new_decryptable_available_balance` and `current_pending_balance_counter`
//! are copied verbatim and the ciphertext goes through the codec.
//!
//! Two wire forms are supported:
//! - [`MsgApplyPendingBalance`]: JSON-friendly, ciphertext as `commitment || handle`
//!   (base64 in JSON)
//! - [`MsgApplyPendingBalanceProto`]: protobuf, ciphertext as a nested
//!   [`CiphertextProto`] with separate `c` (commitment) and `d` (handle) fields

use ctb_common::{
    codec::{self, WireCiphertext},
    CiphertextAlgebra, MalformedCiphertext,
};
use prost::Message;
use serde::{Deserialize, Serialize};

use crate::{AppliedPendingBalance, ApplyPendingBalance, Error, Result};

const CIPHERTEXT_FIELD: &str = "current_available_balance";

/// Wire form of an `ApplyPendingBalance` request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgApplyPendingBalance {
    pub address: String,
    pub denom: String,
    pub new_decryptable_available_balance: String,
    pub current_pending_balance_counter: u64,
    pub current_available_balance: WireCiphertext,
}

/// Map a request to its wire message.
pub fn to_message<C: CiphertextAlgebra>(request: &ApplyPendingBalance<C>) -> MsgApplyPendingBalance {
    MsgApplyPendingBalance {
        address: request.address.clone(),
        denom: request.denom.clone(),
        new_decryptable_available_balance: request.new_decryptable_available_balance.clone(),
        current_pending_balance_counter: request.current_pending_balance_counter,
        current_available_balance: codec::encode(&request.current_available_balance),
    }
}

impl<C: CiphertextAlgebra> AppliedPendingBalance<C> {
    /// The wire message for the applied request.
    pub fn message(&self) -> MsgApplyPendingBalance {
        to_message(&self.request)
    }
}

impl<C: CiphertextAlgebra> TryFrom<&MsgApplyPendingBalance> for ApplyPendingBalance<C> {
    type Error = Error;

    fn try_from(msg: &MsgApplyPendingBalance) -> Result<Self> {
        let current_available_balance = codec::decode(msg.current_available_balance.as_bytes())
            .map_err(Error::malformed(CIPHERTEXT_FIELD))?;

        Ok(Self {
            address: msg.address.clone(),
            denom: msg.denom.clone(),
            new_decryptable_available_balance: msg.new_decryptable_available_balance.clone(),
            current_pending_balance_counter: msg.current_pending_balance_counter,
            current_available_balance,
        })
    }
}

/// Protobuf ciphertext: commitment and handle as separate byte fields.
#[derive(Clone, PartialEq, Message)]
pub struct CiphertextProto {
    /// Commitment `C`
    #[prost(bytes = "vec", tag = "1")]
    pub c: Vec<u8>,
    /// Decryption handle `D`
    #[prost(bytes = "vec", tag = "2")]
    pub d: Vec<u8>,
}

/// Protobuf form of [`MsgApplyPendingBalance`].
#[derive(Clone, PartialEq, Message)]
pub struct MsgApplyPendingBalanceProto {
    #[prost(string, tag = "1")]
    pub address: String,
    #[prost(string, tag = "2")]
    pub denom: String,
    #[prost(string, tag = "3")]
    pub new_decryptable_available_balance: String,
    #[prost(uint64, tag = "4")]
    pub current_pending_balance_counter: u64,
    #[prost(message, optional, tag = "5")]
    pub current_available_balance: Option<CiphertextProto>,
}

impl CiphertextProto {
    pub fn from_ciphertext<C: CiphertextAlgebra>(ciphertext: &C) -> Self {
        Self {
            c: ciphertext.commitment_bytes(),
            d: ciphertext.handle_bytes(),
        }
    }

    pub fn to_ciphertext<C: CiphertextAlgebra>(&self) -> std::result::Result<C, MalformedCiphertext> {
        codec::decode_components(&self.c, &self.d)
    }
}

impl<C: CiphertextAlgebra> From<&ApplyPendingBalance<C>> for MsgApplyPendingBalanceProto {
    fn from(request: &ApplyPendingBalance<C>) -> Self {
        Self {
            address: request.address.clone(),
            denom: request.denom.clone(),
            new_decryptable_available_balance: request.new_decryptable_available_balance.clone(),
            current_pending_balance_counter: request.current_pending_balance_counter,
            current_available_balance: Some(CiphertextProto::from_ciphertext(
                &request.current_available_balance,
            )),
        }
    }
}

impl<C: CiphertextAlgebra> TryFrom<&MsgApplyPendingBalanceProto> for ApplyPendingBalance<C> {
    type Error = Error;

    fn try_from(msg: &MsgApplyPendingBalanceProto) -> Result<Self> {
        let current_available_balance = msg
            .current_available_balance
            .as_ref()
            .ok_or(MalformedCiphertext::Missing)
            .and_then(CiphertextProto::to_ciphertext)
            .map_err(Error::malformed(CIPHERTEXT_FIELD))?;

        Ok(Self {
            address: msg.address.clone(),
            denom: msg.denom.clone(),
            new_decryptable_available_balance: msg.new_decryptable_available_balance.clone(),
            current_pending_balance_counter: msg.current_pending_balance_counter,
            current_available_balance,
        })
    }
}

impl<C: CiphertextAlgebra> ApplyPendingBalance<C> {
    /// Protobuf-encode this request.
    pub fn encode_proto(&self) -> Vec<u8> {
        MsgApplyPendingBalanceProto::from(self).encode_to_vec()
    }

    /// Decode a protobuf-encoded request.
    pub fn decode_proto(bytes: &[u8]) -> Result<Self> {
        let msg = MsgApplyPendingBalanceProto::decode(bytes)?;
        Self::try_from(&msg)
    }
}
