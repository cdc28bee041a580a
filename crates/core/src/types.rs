use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Content category of a file, used to select a detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
    Audio,
    Other,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Image => "image",
            Modality::Audio => "audio",
            Modality::Other => "other",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One readable file discovered by a scan. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub modality: Modality,
    pub size_bytes: u64,
    pub discovered_at: DateTime<Utc>,
}

/// How the detector invocation for a file ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorStatus {
    Ok,
    TimedOut,
    Failed,
}

/// Sensitivity judgment for one file. Exactly one per FileRecord per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub record: FileRecord,
    pub sensitive: bool,
    pub confidence: f32,
    pub rationale: String,
    pub summary: String,
    pub detector_modality: Modality,
    pub status: DetectorStatus,
}

/// A path the scanner could not read. Warnings never abort a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub message: String,
}

/// A file that was moved into the vault during a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultAction {
    pub path: PathBuf,
    pub entry_id: String,
}
