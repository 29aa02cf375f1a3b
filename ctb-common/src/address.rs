//! Bech32 account address helpers.
//!
//! The balance engine treats addresses as opaque strings. These helpers are
//! for callers that build requests and want to reject obviously wrong input
//! before it reaches the ledger.

use bech32::{Bech32, Hrp};

/// Whether `address` is bech32 with human-readable prefix `hrp`.
pub fn is_valid_account_address(address: &str, hrp: &str) -> bool {
    match bech32::decode(address) {
        Ok((decoded_hrp, data)) => decoded_hrp.as_str() == hrp && !data.is_empty(),
        Err(_) => false,
    }
}

/// Encode a raw account id (e.g. a 20-byte key hash) under `hrp`.
pub fn encode_account_address(hrp: &str, account_id: &[u8]) -> Option<String> {
    let hrp = Hrp::parse(hrp).ok()?;
    bech32::encode::<Bech32>(hrp, account_id).ok()
}

/// Short display form `she....xxxxx`; invalid addresses are returned unchanged.
pub fn truncate_address(address: &str, hrp: &str) -> String {
    if !is_valid_account_address(address, hrp) {
        return address.to_string();
    }
    format!("{}....{}", &address[..hrp.len()], &address[address.len() - 5..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_ACCOUNT_HRP;

    fn sample_address() -> String {
        encode_account_address(DEFAULT_ACCOUNT_HRP, &[7u8; 20]).unwrap()
    }

    #[test]
    fn encoded_address_validates() {
        let address = sample_address();
        assert!(address.starts_with("she1"));
        assert!(is_valid_account_address(&address, DEFAULT_ACCOUNT_HRP));
    }

    #[test]
    fn wrong_prefix_is_invalid() {
        let address = encode_account_address("cosmos", &[7u8; 20]).unwrap();
        assert!(!is_valid_account_address(&address, DEFAULT_ACCOUNT_HRP));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(!is_valid_account_address("she1notbech32", DEFAULT_ACCOUNT_HRP));
        assert!(!is_valid_account_address("", DEFAULT_ACCOUNT_HRP));
    }

    #[test]
    fn truncation() {
        let address = sample_address();
        let short = truncate_address(&address, DEFAULT_ACCOUNT_HRP);
        assert!(short.starts_with("she...."));
        assert!(short.ends_with(&address[address.len() - 5..]));
        assert_eq!(truncate_address("nope", DEFAULT_ACCOUNT_HRP), "nope");
    }
}
