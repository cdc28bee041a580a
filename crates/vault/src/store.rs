use crate::crypto;
use crate::error::VaultError;
use crate::ledger::{Ledger, LedgerError, LedgerStats, VaultEntry};
use chrono::Utc;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub type VaultStatus = LedgerStats;

/// Encrypted-at-rest storage plus its ledger.
///
/// Layout under the vault root: `ledger.db` and `blobs/<uuid>.enc`. A blob
/// exists on disk if and only if a non-tombstoned ledger entry references
/// it; `encrypt` maintains that by writing the blob to a temp file, fsyncing,
/// renaming into place and only then committing the ledger row.
pub struct Vault {
    blob_dir: PathBuf,
    ledger: Ledger,
    write_lock: Mutex<()>,
}

impl Vault {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, VaultError> {
        let root = root.as_ref();
        let blob_dir = root.join("blobs");
        fs::create_dir_all(&blob_dir)?;
        let ledger = Ledger::open(root.join("ledger.db"))?;

        Ok(Self {
            blob_dir,
            ledger,
            write_lock: Mutex::new(()),
        })
    }

    /// Move a file into the vault.
    ///
    /// The plaintext original is deleted only after the ledger row commits;
    /// any failure before that leaves the original untouched and discards
    /// the partially written blob.
    pub fn encrypt(
        &self,
        source: &Path,
        passphrase: &[u8],
        owner: &str,
        policy: &str,
    ) -> Result<VaultEntry, VaultError> {
        if passphrase.is_empty() {
            return Err(VaultError::EmptyPassphrase);
        }
        if !source.is_file() {
            return Err(VaultError::MissingSource(source.to_path_buf()));
        }

        let plaintext = fs::read(source)?;
        let content_hash = hex::encode(Sha256::digest(&plaintext));
        let size_bytes = plaintext.len() as u64;
        let blob = crypto::seal(passphrase, &plaintext)?;

        // Encrypts commit one at a time; reads do not take this lock.
        let _guard = self.write_lock.lock();

        let entry = loop {
            let uuid = Uuid::new_v4().to_string();
            if self.ledger.contains(&uuid)? {
                tracing::warn!(%uuid, "uuid collision, regenerating");
                continue;
            }

            let blob_path = self.blob_dir.join(format!("{uuid}.enc"));
            self.write_blob(&blob_path, &blob)?;

            let entry = VaultEntry {
                uuid,
                original_path: source.to_path_buf(),
                ciphertext_path: blob_path.clone(),
                owner: owner.to_string(),
                policy: policy.to_string(),
                content_hash: content_hash.clone(),
                size_bytes,
                created_at: Utc::now(),
                deleted_at: None,
            };

            match self.ledger.insert(&entry) {
                Ok(()) => break entry,
                Err(LedgerError::DuplicateId(id)) => {
                    // Lost the id race after all: discard the blob and retry.
                    tracing::warn!(uuid = %id, "uuid collision at insert, retrying");
                    let _ = fs::remove_file(&blob_path);
                }
                Err(e) => {
                    let _ = fs::remove_file(&blob_path);
                    return Err(e.into());
                }
            }
        };

        // The ledger row is durable; only now does the plaintext go away.
        if let Err(e) = fs::remove_file(source) {
            tracing::warn!(
                path = %source.display(),
                error = %e,
                "vaulted file could not be removed from its original location"
            );
        }

        tracing::info!(uuid = %entry.uuid, path = %source.display(), "file moved to vault");
        Ok(entry)
    }

    /// Retrieve and verify the plaintext for one entry.
    pub fn decrypt(&self, uuid: &str, passphrase: &[u8]) -> Result<Vec<u8>, VaultError> {
        self.decrypt_entry(uuid, passphrase)
            .map(|(_, plaintext)| plaintext)
    }

    /// Decrypt an entry into `out_dir`, named after the original file.
    pub fn decrypt_to(
        &self,
        uuid: &str,
        passphrase: &[u8],
        out_dir: &Path,
    ) -> Result<PathBuf, VaultError> {
        let (entry, plaintext) = self.decrypt_entry(uuid, passphrase)?;

        fs::create_dir_all(out_dir)?;
        let name = entry
            .original_path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from(uuid));
        let out_path = out_dir.join(name);
        fs::write(&out_path, &plaintext)?;

        tracing::info!(uuid = %uuid, path = %out_path.display(), "entry decrypted");
        Ok(out_path)
    }

    fn decrypt_entry(
        &self,
        uuid: &str,
        passphrase: &[u8],
    ) -> Result<(VaultEntry, Vec<u8>), VaultError> {
        if passphrase.is_empty() {
            return Err(VaultError::EmptyPassphrase);
        }

        let entry = self
            .ledger
            .get(uuid)?
            .filter(|e| e.deleted_at.is_none())
            .ok_or_else(|| VaultError::NotFound(uuid.to_string()))?;

        let blob = fs::read(&entry.ciphertext_path)
            .map_err(|e| VaultError::Corruption(format!("ciphertext blob unreadable: {e}")))?;

        let plaintext = crypto::open(passphrase, &blob)?;

        // The tag already authenticates the ciphertext; this catches damage
        // to the stored hash or a blob swapped between entries.
        let hash = hex::encode(Sha256::digest(&plaintext));
        if hash != entry.content_hash {
            return Err(VaultError::Corruption(
                "content hash mismatch after decryption".into(),
            ));
        }

        Ok((entry, plaintext))
    }

    /// Read-only snapshot of the ledger: entry count, aggregate size,
    /// per-owner counts.
    pub fn status(&self) -> Result<VaultStatus, VaultError> {
        Ok(self.ledger.stats()?)
    }

    /// All live entries, oldest first.
    pub fn entries(&self) -> Result<Vec<VaultEntry>, VaultError> {
        Ok(self.ledger.entries()?)
    }

    /// Tombstone an entry and remove its ciphertext blob.
    pub fn purge(&self, uuid: &str) -> Result<(), VaultError> {
        let _guard = self.write_lock.lock();

        let entry = self
            .ledger
            .get(uuid)?
            .ok_or_else(|| VaultError::NotFound(uuid.to_string()))?;

        // Tombstone before unlinking so a crash in between leaves an
        // unreferenced blob rather than a live entry pointing at nothing.
        if entry.deleted_at.is_none() {
            self.ledger.tombstone(uuid, Utc::now())?;
        }

        match fs::remove_file(&entry.ciphertext_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        tracing::info!(uuid = %uuid, "entry purged");
        Ok(())
    }

    fn write_blob(&self, final_path: &Path, blob: &[u8]) -> Result<(), VaultError> {
        let tmp_path = final_path.with_extension("enc.tmp");

        let mut tmp = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&tmp_path)?;
        if let Err(e) = tmp.write_all(blob).and_then(|_| tmp.sync_all()) {
            drop(tmp);
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        drop(tmp);

        if let Err(e) = fs::rename(&tmp_path, final_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }
}
