use crate::types::{FileRecord, Modality};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncReadExt;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("analysis error: {0}")]
    Analysis(String),
}

/// Lazy handle to a file's contents, handed to detectors so they decide how
/// much of the file to pull in.
pub struct ContentReader {
    path: PathBuf,
}

impl ContentReader {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file.
    pub async fn bytes(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }

    /// Read at most `max` bytes from the start of the file.
    pub async fn bytes_capped(&self, max: usize) -> std::io::Result<Vec<u8>> {
        let file = tokio::fs::File::open(&self.path).await?;
        let mut buf = Vec::new();
        file.take(max as u64).read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Read at most `max` bytes and decode them lossily as UTF-8.
    pub async fn text_lossy(&self, max: usize) -> std::io::Result<String> {
        let buf = self.bytes_capped(max).await?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// What a detector concluded about one file. The orchestrator folds this
/// into a `Verdict` together with the invocation status.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub sensitive: bool,
    pub confidence: f32,
    pub rationale: String,
    pub summary: String,
}

/// Contract every modality-specific analyzer satisfies.
///
/// Implementations must be safe to invoke from multiple workers at once:
/// either no shared mutable state across calls, or internal synchronization.
#[async_trait]
pub trait Detector: Send + Sync {
    fn name(&self) -> &str;

    /// The single modality this detector handles.
    fn modality(&self) -> Modality;

    async fn detect(
        &self,
        record: &FileRecord,
        content: &ContentReader,
    ) -> Result<Analysis, DetectorError>;
}

/// Capability map from modality to its registered detector, resolved once at
/// startup. A modality has zero or one detector; absence is a first-class
/// state the orchestrator handles with a fallback verdict.
pub struct DetectorRegistry {
    detectors: HashMap<Modality, Arc<dyn Detector>>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self {
            detectors: HashMap::new(),
        }
    }

    /// Register a detector under its own modality, replacing any previous one.
    pub fn register(&mut self, detector: Arc<dyn Detector>) {
        self.detectors.insert(detector.modality(), detector);
    }

    pub fn get(&self, modality: Modality) -> Option<Arc<dyn Detector>> {
        self.detectors.get(&modality).cloned()
    }

    /// Modalities that currently have a detector.
    pub fn modalities(&self) -> Vec<Modality> {
        self.detectors.keys().copied().collect()
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullDetector(Modality);

    #[async_trait]
    impl Detector for NullDetector {
        fn name(&self) -> &str {
            "null"
        }

        fn modality(&self) -> Modality {
            self.0
        }

        async fn detect(
            &self,
            _record: &FileRecord,
            _content: &ContentReader,
        ) -> Result<Analysis, DetectorError> {
            Ok(Analysis {
                sensitive: false,
                confidence: 1.0,
                rationale: "null detector".into(),
                summary: String::new(),
            })
        }
    }

    #[test]
    fn test_registry_resolves_by_modality() {
        let mut registry = DetectorRegistry::new();
        registry.register(Arc::new(NullDetector(Modality::Text)));

        assert!(registry.get(Modality::Text).is_some());
        assert!(registry.get(Modality::Image).is_none());
        assert_eq!(registry.modalities(), vec![Modality::Text]);
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut registry = DetectorRegistry::new();
        registry.register(Arc::new(NullDetector(Modality::Audio)));
        registry.register(Arc::new(NullDetector(Modality::Audio)));
        assert_eq!(registry.modalities().len(), 1);
    }

    #[tokio::test]
    async fn test_content_reader_caps_reads() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("big.txt");
        std::fs::write(&path, "abcdefghij").unwrap();

        let reader = ContentReader::new(path);
        assert_eq!(reader.bytes_capped(4).await.unwrap(), b"abcd");
        assert_eq!(reader.text_lossy(1024).await.unwrap(), "abcdefghij");
    }
}
