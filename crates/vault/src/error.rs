use crate::ledger::LedgerError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The only error class that aborts vault operations system-wide.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("passphrase must not be empty")]
    EmptyPassphrase,

    #[error("key derivation failed")]
    KeyDerivation,

    #[error("encryption failed")]
    Encryption,

    #[error("authentication failed: wrong passphrase or tampered ciphertext")]
    Auth,

    #[error("vault entry corrupted: {0}")]
    Corruption(String),

    #[error("no vault entry for id {0}")]
    NotFound(String),

    #[error("file not found or not readable: {0}")]
    MissingSource(PathBuf),
}
