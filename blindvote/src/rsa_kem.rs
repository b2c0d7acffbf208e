//! RSA-KEM: hybrid public-key encryption over an RSA key pair.
//!
//! A serialized signed ballot is larger than one RSA block, so it is sealed with
//! AES-256-GCM under a key derived from a random integer that is itself
//! encrypted with the recipient's RSA public key.
//!   - The encapsulated integer `z` is uniform in `[2, n)` and is sent as `z^e mod n`,
//!     left-padded to the modulus length.
//!   - The AES key is `HKDF-SHA256(z)`.
//!
//! Ciphertext layout: `encapsulated key || nonce || AES-GCM ciphertext`.

use crate::Error;
use aes_gcm::aead::{generic_array::GenericArray, Aead, NewAead};
use aes_gcm::Aes256Gcm;
use hkdf::Hkdf;
use num_bigint_dig::BigUint;
use rand::rngs::OsRng;
use rand::{thread_rng, Rng, RngCore};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroize;

const AES_IV_LENGTH: usize = 12;
const AES_TAG_LENGTH: usize = 16;
const KDF_INFO: &[u8] = b"blindvote rsa-kem";

type AesKey = [u8; 32];

/// Encrypt a message so that only the holder of the matching private key can read it.
pub fn encrypt(receiver_pub: &RsaPublicKey, msg: &[u8]) -> Result<Vec<u8>, Error> {
    let (encapsulated, aes_key) = encapsulate(receiver_pub)?;
    let encrypted = aes_encrypt(&aes_key, msg)?;

    let mut cipher_text = Vec::with_capacity(encapsulated.len() + encrypted.len());
    cipher_text.extend(encapsulated);
    cipher_text.extend(encrypted);

    Ok(cipher_text)
}

/// Decrypt an RSA-KEM ciphertext with the receiver's private key.
pub fn decrypt(receiver_sec: &RsaPrivateKey, msg: &[u8]) -> Result<Vec<u8>, Error> {
    let key_length = receiver_sec.size();
    if msg.len() < key_length + AES_IV_LENGTH + AES_TAG_LENGTH {
        return Err(Error::TruncatedCiphertext);
    }

    let (encapsulated, encrypted) = msg.split_at(key_length);
    let aes_key = decapsulate(receiver_sec, encapsulated)?;

    aes_decrypt(&aes_key, encrypted)
}

fn hkdf_sha256(master: &[u8]) -> Result<AesKey, Error> {
    let h = Hkdf::<Sha256>::new(None, master);
    let mut out = [0u8; 32];
    h.expand(KDF_INFO, &mut out)
        .map_err(|_| Error::KeyDerivation)?;
    Ok(out)
}

fn encapsulate(peer_pk: &RsaPublicKey) -> Result<(Vec<u8>, AesKey), Error> {
    let n = peer_pk.n();
    let key_length = peer_pk.size();
    let two = BigUint::from(2u32);

    let mut bytes = vec![0u8; key_length];
    let secret = loop {
        OsRng.fill_bytes(&mut bytes);
        let candidate = BigUint::from_bytes_be(&bytes) % n;
        if candidate >= two {
            break candidate;
        }
    };
    bytes.zeroize();

    let encapsulated = left_pad(secret.modpow(peer_pk.e(), n).to_bytes_be(), key_length);
    let mut master = left_pad(secret.to_bytes_be(), key_length);
    let aes_key = hkdf_sha256(&master);
    master.zeroize();

    Ok((encapsulated, aes_key?))
}

fn decapsulate(sk: &RsaPrivateKey, encapsulated: &[u8]) -> Result<AesKey, Error> {
    let n = sk.n();
    let value = BigUint::from_bytes_be(encapsulated);
    if &value >= n {
        return Err(Error::MessageOutOfRange);
    }

    let secret = value.modpow(sk.d(), n);
    let mut master = left_pad(secret.to_bytes_be(), sk.size());
    let aes_key = hkdf_sha256(&master);
    master.zeroize();

    aes_key
}

fn left_pad(bytes: Vec<u8>, length: usize) -> Vec<u8> {
    if bytes.len() >= length {
        return bytes;
    }
    let mut padded = vec![0u8; length - bytes.len()];
    padded.extend(bytes);
    padded
}

fn aes_encrypt(key: &AesKey, msg: &[u8]) -> Result<Vec<u8>, Error> {
    let aead = Aes256Gcm::new(GenericArray::from_slice(key));

    let mut nonce = [0u8; AES_IV_LENGTH];
    thread_rng().fill(&mut nonce);
    let nonce = GenericArray::from_slice(&nonce);

    let ciphertext = aead.encrypt(nonce, msg).map_err(|_| Error::AeadError)?;

    let mut output = Vec::with_capacity(AES_IV_LENGTH + ciphertext.len());
    output.extend(nonce);
    output.extend(ciphertext);

    Ok(output)
}

fn aes_decrypt(key: &AesKey, ciphertext: &[u8]) -> Result<Vec<u8>, Error> {
    if ciphertext.len() < AES_IV_LENGTH + AES_TAG_LENGTH {
        return Err(Error::TruncatedCiphertext);
    }

    let aead = Aes256Gcm::new(GenericArray::from_slice(key));

    let nonce = GenericArray::from_slice(&ciphertext[..AES_IV_LENGTH]);
    let encrypted = &ciphertext[AES_IV_LENGTH..];

    aead.decrypt(nonce, encrypted).map_err(|_| Error::AeadError)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::testing::{other_test_keys, test_keys};

    #[test]
    fn test_encapsulation() {
        let (public_key, private_key) = test_keys();

        let (encapsulated, key) = encapsulate(&public_key).unwrap();
        assert_eq!(encapsulated.len(), public_key.size());
        assert_eq!(key, decapsulate(&private_key, &encapsulated).unwrap());
    }

    #[test]
    fn test_aes() {
        let mut key = [0u8; 32];
        thread_rng().fill(&mut key);

        let plaintext = b"a signed ballot";
        let encrypted = aes_encrypt(&key, plaintext).unwrap();
        let decrypted = aes_decrypt(&key, &encrypted).unwrap();

        assert_eq!(plaintext, decrypted.as_slice());
        assert!(aes_decrypt(&key, &encrypted[..10]).is_err());
    }

    #[test]
    fn test_rsa_kem() {
        let (public_key, private_key) = test_keys();

        let plaintext = b"a signed ballot";

        let encrypted = encrypt(&public_key, plaintext).unwrap();
        let decrypted = decrypt(&private_key, &encrypted).unwrap();

        assert_eq!(plaintext, decrypted.as_slice());

        // Test that it fails when using a bad private key
        let (_, bad_private_key) = other_test_keys();
        assert!(decrypt(&bad_private_key, &encrypted).is_err());

        // Test that it fails on truncated input
        assert!(matches!(
            decrypt(&private_key, &[4, 6, 8, 0]),
            Err(Error::TruncatedCiphertext)
        ));
    }

    #[test]
    fn test_left_pad() {
        assert_eq!(left_pad(vec![1, 2], 4), vec![0, 0, 1, 2]);
        assert_eq!(left_pad(vec![1, 2, 3], 2), vec![1, 2, 3]);
    }
}
