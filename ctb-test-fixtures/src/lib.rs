use anyhow::{anyhow, Context, Result};
use ctb_common::{
    address::encode_account_address, ElGamalCiphertext, ElGamalKeypair, DEFAULT_ACCOUNT_HRP,
};
use once_cell::sync::OnceCell;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

const KEYPAIR_SEED: u64 = 0x5eed_0001;
const OPENING_DOMAIN: u64 = 0x0be7_1a00_0000_0000;

/// Upper bound of the discrete-log search used by [`TestFixtures::decrypt`].
pub const DECRYPT_BOUND: u64 = 1 << 16;

/// Denomination used throughout the tests.
pub const SAMPLE_DENOM: &str = "usei";

static FIXTURES: OnceCell<TestFixtures> = OnceCell::new();

/// Deterministic key material and ciphertexts reused across tests.
pub struct TestFixtures {
    keypair: ElGamalKeypair,
    address: String,
}

impl TestFixtures {
    /// Bech32 address derived from the fixture pubkey.
    pub fn address(&self) -> String {
        self.address.clone()
    }

    /// Encrypt `amount` under the fixture key.
    ///
    /// The opening is derived from the amount, so equal amounts give equal
    /// ciphertexts and different amounts use independent randomness.
    pub fn encrypt(&self, amount: u64) -> ElGamalCiphertext {
        let mut rng = ChaCha20Rng::seed_from_u64(OPENING_DOMAIN ^ amount);
        self.keypair.public.encrypt(amount, &mut rng)
    }

    /// Decrypt with the fixture key, searching amounts below [`DECRYPT_BOUND`].
    pub fn decrypt(&self, ciphertext: &ElGamalCiphertext) -> Option<u64> {
        self.keypair.secret.decrypt_u64(ciphertext, DECRYPT_BOUND)
    }
}

/// Lazily build and return the shared fixtures.
pub fn fixtures() -> &'static TestFixtures {
    FIXTURES.get_or_init(|| build_fixtures().expect("failed to build ctb test fixtures"))
}

fn build_fixtures() -> Result<TestFixtures> {
    let mut rng = ChaCha20Rng::seed_from_u64(KEYPAIR_SEED);
    let keypair = ElGamalKeypair::new_rand(&mut rng);

    let digest = Sha256::digest(keypair.public.to_bytes());
    let address = encode_account_address(DEFAULT_ACCOUNT_HRP, &digest[..20])
        .ok_or_else(|| anyhow!("encode fixture address"))?;

    // sanity check the key before any test relies on it
    let probe = keypair.public.encrypt(42, &mut rng);
    let decrypted = keypair
        .secret
        .decrypt_u64(&probe, DECRYPT_BOUND)
        .context("fixture keypair failed to decrypt its own ciphertext")?;
    if decrypted != 42 {
        return Err(anyhow!("fixture keypair decrypted 42 as {decrypted}"));
    }

    Ok(TestFixtures { keypair, address })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctb_common::address::is_valid_account_address;

    #[test]
    fn fixtures_are_stable() {
        let fx = fixtures();
        assert_eq!(fx.encrypt(7), fx.encrypt(7));
        assert_ne!(fx.encrypt(7), fx.encrypt(8));
        assert_eq!(fx.decrypt(&fx.encrypt(7)), Some(7));
        assert!(is_valid_account_address(&fx.address(), DEFAULT_ACCOUNT_HRP));
    }
}
