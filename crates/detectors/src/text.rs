use crate::enrich::Summarizer;
use async_trait::async_trait;
use regex::Regex;
use shroud_core::{Analysis, ContentReader, Detector, DetectorError, FileRecord, Modality};
use std::sync::{Arc, LazyLock};

const MAX_TEXT_BYTES: usize = 1024 * 1024;
const EXCERPT_CHARS: usize = 240;

macro_rules! pii_regex {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($pattern).ok());
    };
}

pii_regex!(RE_EMAIL, r"[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}");
pii_regex!(
    RE_PHONE,
    r"(?:^|\s)(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}(?:\s|$)"
);
pii_regex!(RE_SSN, r"\b\d{3}-\d{2}-\d{4}\b");
pii_regex!(
    RE_CREDIT_CARD,
    r"\b(?:4\d{3}|5[1-5]\d{2}|3[47]\d{2}|6(?:011|5\d{2}))[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{3,4}\b"
);
pii_regex!(
    RE_IBAN,
    r"\b[A-Z]{2}\d{2}[A-Z0-9]{4}\d{7}(?:[A-Z0-9]?\d{0,16})\b"
);

static PII_PATTERNS: &[(&str, &LazyLock<Option<Regex>>)] = &[
    ("email address", &RE_EMAIL),
    ("phone number", &RE_PHONE),
    ("social security number", &RE_SSN),
    ("payment card number", &RE_CREDIT_CARD),
    ("IBAN", &RE_IBAN),
];

const SECRET_KEYWORDS: &[&str] = &[
    "password",
    "passphrase",
    "api_key",
    "api key",
    "private key",
    "secret",
    "confidential",
];

/// Regex and keyword heuristics over text content.
///
/// One possible implementation of the detector contract, not ground truth:
/// confidence reflects that a pattern hit is strong evidence while a bare
/// keyword is weaker. An optional summarizer enriches the summary text.
pub struct TextDetector {
    summarizer: Option<Arc<dyn Summarizer>>,
}

impl TextDetector {
    pub fn new() -> Self {
        Self { summarizer: None }
    }

    pub fn with_summarizer(summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            summarizer: Some(summarizer),
        }
    }

    async fn summary_for(&self, text: &str) -> String {
        if let Some(summarizer) = &self.summarizer {
            match summarizer.summarize(text).await {
                Ok(summary) => return summary,
                Err(e) => {
                    tracing::debug!(error = %e, "summarizer unavailable, using excerpt");
                }
            }
        }
        excerpt(text)
    }
}

impl Default for TextDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Detector for TextDetector {
    fn name(&self) -> &str {
        "text-heuristic"
    }

    fn modality(&self) -> Modality {
        Modality::Text
    }

    async fn detect(
        &self,
        _record: &FileRecord,
        content: &ContentReader,
    ) -> Result<Analysis, DetectorError> {
        let text = content.text_lossy(MAX_TEXT_BYTES).await?;

        let mut pattern_hits: Vec<&str> = Vec::new();
        for &(label, pattern) in PII_PATTERNS {
            if let Some(re) = pattern.as_ref() {
                if re.is_match(&text) {
                    pattern_hits.push(label);
                }
            }
        }

        let lower = text.to_lowercase();
        let keyword_hits: Vec<&str> = SECRET_KEYWORDS
            .iter()
            .copied()
            .filter(|kw| lower.contains(kw))
            .collect();

        let sensitive = !pattern_hits.is_empty() || !keyword_hits.is_empty();
        let (confidence, rationale) = if !pattern_hits.is_empty() {
            (0.85, format!("found {}", pattern_hits.join(", ")))
        } else if !keyword_hits.is_empty() {
            (0.6, format!("secret markers: {}", keyword_hits.join(", ")))
        } else {
            (
                0.7,
                "no personally identifiable information or secret markers found".to_string(),
            )
        };

        Ok(Analysis {
            sensitive,
            confidence,
            rationale,
            summary: self.summary_for(&text).await,
        })
    }
}

/// Whitespace-collapsed excerpt of the first `EXCERPT_CHARS` characters.
fn excerpt(text: &str) -> String {
    let collapsed: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= EXCERPT_CHARS {
        collapsed
    } else {
        let cut: String = collapsed.chars().take(EXCERPT_CHARS).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::fs;
    use std::path::Path;

    fn record(path: &Path) -> FileRecord {
        FileRecord {
            path: path.to_path_buf(),
            modality: Modality::Text,
            size_bytes: fs::metadata(path).map(|m| m.len()).unwrap_or(0),
            discovered_at: Utc::now(),
        }
    }

    async fn analyze(content: &str) -> Analysis {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("input.txt");
        fs::write(&path, content).unwrap();

        let detector = TextDetector::new();
        let reader = ContentReader::new(path.clone());
        detector.detect(&record(&path), &reader).await.unwrap()
    }

    #[tokio::test]
    async fn test_email_is_sensitive() {
        let analysis = analyze("please contact alice@example.com for details").await;
        assert!(analysis.sensitive);
        assert!(analysis.rationale.contains("email address"));
        assert!(analysis.confidence > 0.8);
    }

    #[tokio::test]
    async fn test_ssn_is_sensitive() {
        let analysis = analyze("employee ssn 123-45-6789 on file").await;
        assert!(analysis.sensitive);
        assert!(analysis.rationale.contains("social security number"));
    }

    #[tokio::test]
    async fn test_keyword_only_lowers_confidence() {
        let analysis = analyze("remember to rotate the password next week").await;
        assert!(analysis.sensitive);
        assert!(analysis.confidence < 0.85);
        assert!(analysis.rationale.contains("password"));
    }

    #[tokio::test]
    async fn test_clean_text_is_safe() {
        let analysis = analyze("the quarterly figures look fine").await;
        assert!(!analysis.sensitive);
    }

    #[tokio::test]
    async fn test_summary_is_excerpt_without_summarizer() {
        let analysis = analyze("  spaced    out\n\ncontent here  ").await;
        assert_eq!(analysis.summary, "spaced out content here");
    }

    #[test]
    fn test_excerpt_truncates_long_text() {
        let long = "word ".repeat(200);
        let summary = excerpt(&long);
        assert!(summary.ends_with("..."));
        assert!(summary.chars().count() <= EXCERPT_CHARS + 3);
    }
}
