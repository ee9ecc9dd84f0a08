//! Record sealing for the file backend.
//!
//! AES-256-GCM under a per-record key derived from the master key with
//! HKDF-SHA256 and a random salt. The nonce is prepended to the ciphertext.
//! Callers pass associated data that pins a record to its namespace and key,
//! so a record copied to another location fails to open.

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

const NONCE_SIZE: usize = 12;
const SALT_SIZE: usize = 32;
pub const KEY_SIZE: usize = 32;

const HKDF_INFO: &[u8] = b"vaultkv-record-v1";

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("encryption failed: {0}")]
    Seal(String),

    #[error("decryption failed: {0}")]
    Open(String),
}

/// Ciphertext plus the salt needed to re-derive its key.
#[derive(Debug, Clone)]
pub struct Sealed {
    /// `nonce || ciphertext || tag`
    pub ciphertext: Vec<u8>,
    pub salt: Vec<u8>,
}

fn derive_key(master_key: &[u8], salt: &[u8]) -> Zeroizing<[u8; KEY_SIZE]> {
    let hk = Hkdf::<Sha256>::new(Some(salt), master_key);
    let mut okm = Zeroizing::new([0u8; KEY_SIZE]);
    // expand cannot fail when output length <= 255 * hash-length
    hk.expand(HKDF_INFO, &mut okm[..])
        .expect("HKDF expand should not fail for 32-byte output");
    okm
}

/// Associated data binding a record to `(namespace, key)`.
pub fn record_aad(namespace: &str, key: &str) -> Vec<u8> {
    let mut aad = Vec::with_capacity(namespace.len() + key.len() + 1);
    aad.extend_from_slice(namespace.as_bytes());
    aad.push(0);
    aad.extend_from_slice(key.as_bytes());
    aad
}

pub fn seal(master_key: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Sealed, CryptoError> {
    let mut salt = vec![0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let key = derive_key(master_key, &salt);
    let cipher =
        Aes256Gcm::new_from_slice(&key[..]).map_err(|e| CryptoError::Seal(e.to_string()))?;

    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| CryptoError::Seal(e.to_string()))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);

    Ok(Sealed {
        ciphertext: out,
        salt,
    })
}

pub fn open(master_key: &[u8], sealed: &Sealed, aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if sealed.ciphertext.len() < NONCE_SIZE {
        return Err(CryptoError::Open("ciphertext too short".to_string()));
    }

    let (nonce_bytes, ciphertext) = sealed.ciphertext.split_at(NONCE_SIZE);

    let key = derive_key(master_key, &sealed.salt);
    let cipher =
        Aes256Gcm::new_from_slice(&key[..]).map_err(|e| CryptoError::Open(e.to_string()))?;

    cipher
        .decrypt(
            Nonce::from_slice(nonce_bytes),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|e| CryptoError::Open(e.to_string()))
}

/// Generate a new random 256-bit master key.
pub fn generate_master_key() -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(vec![0u8; KEY_SIZE]);
    rand::thread_rng().fill_bytes(&mut key[..]);
    key
}
