//! Masked-signature cryptography.
//!
//! The commission signs ballots it cannot read: a voter multiplies the ballot by
//! `r^e mod n` (masking), the commission signs the masked value with its private
//! exponent, and the voter divides the result by `r` (demasking) to obtain an
//! ordinary RSA signature over the original ballot.
//!
//! This is textbook RSA without padding, as the protocol requires the algebraic
//! structure. It is meant for simulation only.

use crate::*;
use num_bigint_dig::{BigInt, BigUint, ModInverse, Sign, ToBigUint};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub use rsa::{RsaPrivateKey, RsaPublicKey};

const BLINDING_FACTOR_ATTEMPTS: usize = 64;

/// A voter's secret multiplier, used to mask ballots and demask signatures.
///
/// The bytes are wiped when the factor is dropped.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct BlindingFactor(#[serde(with = "hex_serde")] Vec<u8>);

impl BlindingFactor {
    /// Copy the factor so it can be opened to the commission in a batch collection
    pub(crate) fn disclose(&self) -> BlindingFactor {
        BlindingFactor(self.0.clone())
    }

    fn as_integer(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }
}

impl fmt::Debug for BlindingFactor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BlindingFactor(..)")
    }
}

/// The asymmetric operations both protocol parties rely on
pub trait CryptoService {
    /// Mask `data` under `public_key` with the given blinding factor
    fn mask(
        &self,
        data: &[u8],
        public_key: &RsaPublicKey,
        blinding_factor: &BlindingFactor,
    ) -> Result<Vec<u8>, Error>;

    /// Remove the blinding factor from a signature over masked data
    fn demask_signature(
        &self,
        data: &[u8],
        public_key: &RsaPublicKey,
        blinding_factor: &BlindingFactor,
    ) -> Result<Vec<u8>, Error>;

    /// Sign a message representative directly with the private key
    fn sign_hash(&self, hash: &[u8], private_key: &RsaPrivateKey) -> Result<Vec<u8>, Error>;

    /// Apply the public key to a signature, recovering the signed message
    fn recover(&self, signature: &[u8], public_key: &RsaPublicKey) -> Result<Vec<u8>, Error>;

    /// Check that `signature` is a valid signature over `data`
    fn verify(&self, data: &[u8], signature: &[u8], public_key: &RsaPublicKey) -> bool;

    fn encrypt(&self, data: &[u8], public_key: &RsaPublicKey) -> Result<Vec<u8>, Error>;

    fn decrypt(&self, data: &[u8], private_key: &RsaPrivateKey) -> Result<Vec<u8>, Error>;
}

/// Key pair and blinding factor generation
pub trait KeysGenerator {
    fn generate_keys(&self) -> Result<(RsaPublicKey, RsaPrivateKey), Error>;

    fn generate_blinding_factor(&self, public_key: &RsaPublicKey)
        -> Result<BlindingFactor, Error>;
}

/// Textbook RSA blind signatures, with RSA-KEM hybrid encryption
#[derive(Debug, Default, Clone, Copy)]
pub struct RsaBlindService;

impl CryptoService for RsaBlindService {
    fn mask(
        &self,
        data: &[u8],
        public_key: &RsaPublicKey,
        blinding_factor: &BlindingFactor,
    ) -> Result<Vec<u8>, Error> {
        let n = public_key.n();
        let message = message_to_integer(data, n)?;
        let factor = blinding_factor.as_integer();
        let masked = (message * factor.modpow(public_key.e(), n)) % n;
        Ok(masked.to_bytes_be())
    }

    fn demask_signature(
        &self,
        data: &[u8],
        public_key: &RsaPublicKey,
        blinding_factor: &BlindingFactor,
    ) -> Result<Vec<u8>, Error> {
        let n = public_key.n();
        let signature = to_integer(data, n)?;
        let inverse = inverse_mod(&blinding_factor.as_integer(), n)
            .ok_or(Error::NonInvertibleBlindingFactor)?;
        Ok(((signature * inverse) % n).to_bytes_be())
    }

    fn sign_hash(&self, hash: &[u8], private_key: &RsaPrivateKey) -> Result<Vec<u8>, Error> {
        let n = private_key.n();
        let representative = to_integer(hash, n)?;
        Ok(representative.modpow(private_key.d(), n).to_bytes_be())
    }

    fn recover(&self, signature: &[u8], public_key: &RsaPublicKey) -> Result<Vec<u8>, Error> {
        let n = public_key.n();
        let signature = to_integer(signature, n)?;
        Ok(signature.modpow(public_key.e(), n).to_bytes_be())
    }

    fn verify(&self, data: &[u8], signature: &[u8], public_key: &RsaPublicKey) -> bool {
        let n = public_key.n();
        let message = match message_to_integer(data, n) {
            Ok(message) => message,
            Err(_) => return false,
        };
        let signature = match to_integer(signature, n) {
            Ok(signature) => signature,
            Err(_) => return false,
        };
        signature.modpow(public_key.e(), n) == message
    }

    fn encrypt(&self, data: &[u8], public_key: &RsaPublicKey) -> Result<Vec<u8>, Error> {
        rsa_kem::encrypt(public_key, data)
    }

    fn decrypt(&self, data: &[u8], private_key: &RsaPrivateKey) -> Result<Vec<u8>, Error> {
        rsa_kem::decrypt(private_key, data)
    }
}

/// Generates RSA key pairs of a fixed size from the OS random source
#[derive(Debug, Clone, Copy)]
pub struct RsaKeysGenerator {
    key_size: usize,
}

impl RsaKeysGenerator {
    pub fn new(key_size: usize) -> Self {
        RsaKeysGenerator { key_size }
    }
}

impl Default for RsaKeysGenerator {
    fn default() -> Self {
        RsaKeysGenerator::new(DEFAULT_KEY_SIZE)
    }
}

impl KeysGenerator for RsaKeysGenerator {
    fn generate_keys(&self) -> Result<(RsaPublicKey, RsaPrivateKey), Error> {
        let private_key = RsaPrivateKey::new(&mut OsRng, self.key_size)?;
        let public_key = RsaPublicKey::from(&private_key);
        Ok((public_key, private_key))
    }

    fn generate_blinding_factor(
        &self,
        public_key: &RsaPublicKey,
    ) -> Result<BlindingFactor, Error> {
        let n = public_key.n();
        let mut bytes = vec![0u8; public_key.size()];

        for _ in 0..BLINDING_FACTOR_ATTEMPTS {
            OsRng.fill_bytes(&mut bytes);
            let candidate = BigUint::from_bytes_be(&bytes) % n;
            if candidate <= BigUint::from(1u32) {
                continue;
            }
            if inverse_mod(&candidate, n).is_some() {
                bytes.zeroize();
                return Ok(BlindingFactor(candidate.to_bytes_be()));
            }
        }

        bytes.zeroize();
        Err(Error::BlindingFactorGeneration)
    }
}

/// Interpret a serialized message as an integer.
///
/// Leading zero bytes would not survive the round trip back to bytes, so they are rejected.
fn message_to_integer(data: &[u8], n: &BigUint) -> Result<BigUint, Error> {
    match data.first() {
        None | Some(0) => Err(Error::MessageOutOfRange),
        Some(_) => to_integer(data, n),
    }
}

fn to_integer(data: &[u8], n: &BigUint) -> Result<BigUint, Error> {
    let value = BigUint::from_bytes_be(data);
    if &value >= n {
        return Err(Error::MessageOutOfRange);
    }
    Ok(value)
}

pub(crate) fn inverse_mod(value: &BigUint, modulus: &BigUint) -> Option<BigUint> {
    let inverse = value.clone().mod_inverse(modulus)?;
    let modulus = BigInt::from_biguint(Sign::Plus, modulus.clone());
    ((inverse % &modulus + &modulus) % &modulus).to_biguint()
}
