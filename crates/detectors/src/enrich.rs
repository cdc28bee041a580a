use async_trait::async_trait;
use shroud_core::DetectorError;

/// Optional summarization backend (typically a local LLM runtime).
///
/// Detectors treat this as best-effort enrichment of the verdict's summary
/// text; a failing summarizer falls back to a plain excerpt and never
/// affects the sensitivity judgment itself.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String, DetectorError>;
}
