//! Shared fixtures for unit tests. Key generation is slow in debug builds, so
//! the test key pairs are generated once per test binary.

use crate::*;
use std::sync::OnceLock;

static TEST_KEYS: OnceLock<(RsaPublicKey, RsaPrivateKey)> = OnceLock::new();
static OTHER_TEST_KEYS: OnceLock<(RsaPublicKey, RsaPrivateKey)> = OnceLock::new();

fn generate() -> (RsaPublicKey, RsaPrivateKey) {
    RsaKeysGenerator::default().generate_keys().unwrap()
}

pub fn test_keys() -> (RsaPublicKey, RsaPrivateKey) {
    TEST_KEYS.get_or_init(generate).clone()
}

pub fn other_test_keys() -> (RsaPublicKey, RsaPrivateKey) {
    OTHER_TEST_KEYS.get_or_init(generate).clone()
}

/// Hands out the cached test key pair, and fresh blinding factors
#[derive(Debug, Default, Clone, Copy)]
pub struct CachedKeysGenerator;

impl KeysGenerator for CachedKeysGenerator {
    fn generate_keys(&self) -> Result<(RsaPublicKey, RsaPrivateKey), Error> {
        Ok(test_keys())
    }

    fn generate_blinding_factor(
        &self,
        public_key: &RsaPublicKey,
    ) -> Result<BlindingFactor, Error> {
        RsaKeysGenerator::default().generate_blinding_factor(public_key)
    }
}

/// Always spares the batch at a fixed index
#[derive(Debug, Clone, Copy)]
pub struct FixedRandomProvider(pub usize);

impl RandomProvider for FixedRandomProvider {
    fn next_index(&mut self, _len: usize) -> usize {
        self.0
    }
}
