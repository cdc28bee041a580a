use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::Argon2;
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::VaultError;

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
pub const KEY_LEN: usize = 32;
const TAG_LEN: usize = 16;

/// Smallest well-formed blob: salt + nonce + tag over an empty plaintext.
const MIN_BLOB_LEN: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

/// Argon2id over the passphrase and a per-blob salt. Deliberately slow.
fn derive_key(passphrase: &[u8], salt: &[u8]) -> Result<[u8; KEY_LEN], VaultError> {
    let mut key = [0u8; KEY_LEN];
    Argon2::default()
        .hash_password_into(passphrase, salt, &mut key)
        .map_err(|_| VaultError::KeyDerivation)?;
    Ok(key)
}

/// Encrypt `plaintext` under a key derived from `passphrase` and a fresh
/// random salt. Blob layout: salt || nonce || ciphertext+tag.
pub fn seal(passphrase: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let mut key = derive_key(passphrase, &salt)?;
    let cipher = Aes256Gcm::new((&key).into());
    key.zeroize();

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|_| VaultError::Encryption)?;

    let mut blob = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Authenticated decryption. Either returns the exact original bytes or
/// fails: a wrong passphrase or tampered blob breaks the GCM tag and yields
/// `Auth`, never partial plaintext.
pub fn open(passphrase: &[u8], blob: &[u8]) -> Result<Vec<u8>, VaultError> {
    if blob.len() < MIN_BLOB_LEN {
        return Err(VaultError::Corruption("ciphertext blob truncated".into()));
    }
    let (salt, rest) = blob.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let mut key = derive_key(passphrase, salt)?;
    let cipher = Aes256Gcm::new((&key).into());
    key.zeroize();

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| VaultError::Auth)
}
