use async_trait::async_trait;
use shroud_core::{Analysis, ContentReader, Detector, DetectorError, FileRecord, Modality};

/// Filename hints that suggest a scanned document rather than an ordinary
/// photo.
const FLAGGED_NAME_HINTS: &[&str] = &[
    "passport",
    "id_card",
    "idcard",
    "license",
    "licence",
    "ssn",
    "statement",
    "insurance",
    "medical",
    "contract",
];

/// Filename-based heuristic for images.
///
/// Confidence is kept low on purpose: without decoding pixels this can only
/// guess from the name. A vision-model detector slots in behind the same
/// contract when available.
pub struct ImageDetector;

#[async_trait]
impl Detector for ImageDetector {
    fn name(&self) -> &str {
        "image-heuristic"
    }

    fn modality(&self) -> Modality {
        Modality::Image
    }

    async fn detect(
        &self,
        record: &FileRecord,
        _content: &ContentReader,
    ) -> Result<Analysis, DetectorError> {
        let name = record
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let hits: Vec<&str> = FLAGGED_NAME_HINTS
            .iter()
            .copied()
            .filter(|hint| name.contains(hint))
            .collect();

        let extension = record
            .path
            .extension()
            .map(|e| e.to_string_lossy().to_uppercase())
            .unwrap_or_else(|| "image".into());
        let summary = format!("{extension} image, {}", human_size(record.size_bytes));

        if hits.is_empty() {
            Ok(Analysis {
                sensitive: false,
                confidence: 0.5,
                rationale: "filename carries no document markers".to_string(),
                summary,
            })
        } else {
            Ok(Analysis {
                sensitive: true,
                confidence: 0.4,
                rationale: format!("filename suggests an identity or financial document ({})", hits.join(", ")),
                summary,
            })
        }
    }
}

fn human_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}
