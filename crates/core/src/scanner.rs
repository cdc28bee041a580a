use crate::classifier::classify;
use crate::types::{FileRecord, ScanWarning};
use async_recursion::async_recursion;
use chrono::Utc;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan root is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("scanner task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result of a full directory walk.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub records: Vec<FileRecord>,
    pub warnings: Vec<ScanWarning>,
}

/// Walk `root` and collect one `FileRecord` per readable file.
///
/// Restartable by re-invoking with the same root; unreadable entries become
/// warnings instead of aborting the walk.
pub async fn scan(root: &Path) -> Result<ScanOutcome, ScanError> {
    let (tx, mut rx) = mpsc::channel(64);
    let walker = tokio::spawn(walk(root.to_path_buf(), tx));

    let mut records = Vec::new();
    while let Some(record) = rx.recv().await {
        records.push(record);
    }

    let warnings = walker.await??;
    Ok(ScanOutcome { records, warnings })
}

/// Streaming walk: records are sent into `tx` as they are discovered, so a
/// consumer can start work before the walk finishes. Returns the warnings
/// gathered along the way. Stops early if the receiver is dropped.
pub async fn walk(
    root: PathBuf,
    tx: mpsc::Sender<FileRecord>,
) -> Result<Vec<ScanWarning>, ScanError> {
    let meta = tokio::fs::metadata(&root).await?;
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory(root));
    }

    let mut warnings = Vec::new();
    let mut visited = HashSet::new();
    if let Some(id) = dir_identity(&meta) {
        visited.insert(id);
    }

    walk_dir(&root, &tx, &mut visited, &mut warnings).await;
    Ok(warnings)
}

#[async_recursion]
async fn walk_dir(
    dir: &Path,
    tx: &mpsc::Sender<FileRecord>,
    visited: &mut HashSet<(u64, u64)>,
    warnings: &mut Vec<ScanWarning>,
) {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warnings.push(ScanWarning {
                path: dir.to_path_buf(),
                message: format!("directory not readable: {e}"),
            });
            return;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warnings.push(ScanWarning {
                    path: dir.to_path_buf(),
                    message: format!("error while listing directory: {e}"),
                });
                break;
            }
        };

        let path = entry.path();

        // Follows symlinks; a broken link surfaces here as an error.
        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) => {
                warnings.push(ScanWarning {
                    path,
                    message: format!("entry not readable: {e}"),
                });
                continue;
            }
        };

        if meta.is_dir() {
            if !should_descend(&path, &meta, visited).await {
                tracing::debug!(path = %path.display(), "skipping already-visited directory");
                continue;
            }
            walk_dir(&path, tx, visited, warnings).await;
        } else if meta.is_file() {
            // A record is only produced for files we can actually open.
            if let Err(e) = tokio::fs::File::open(&path).await {
                warnings.push(ScanWarning {
                    path,
                    message: format!("file not readable: {e}"),
                });
                continue;
            }

            let record = FileRecord {
                modality: classify(&path),
                size_bytes: meta.len(),
                discovered_at: Utc::now(),
                path,
            };
            if tx.send(record).await.is_err() {
                // Receiver gone: the consumer stopped early.
                return;
            }
        }
    }
}

#[cfg(unix)]
fn dir_identity(meta: &std::fs::Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn dir_identity(_meta: &std::fs::Metadata) -> Option<(u64, u64)> {
    None
}

/// Symlink loops terminate here: a directory is entered at most once, keyed
/// by its (device, inode) pair. Without that identity, symlinked directories
/// are not followed at all.
async fn should_descend(
    path: &Path,
    meta: &std::fs::Metadata,
    visited: &mut HashSet<(u64, u64)>,
) -> bool {
    match dir_identity(meta) {
        Some(id) => visited.insert(id),
        None => !matches!(
            tokio::fs::symlink_metadata(path).await,
            Ok(m) if m.file_type().is_symlink()
        ),
    }
}
