use async_trait::async_trait;
use shroud_core::{Analysis, ContentReader, Detector, DetectorError, FileRecord, Modality};

/// Duration estimate assumes a 128 kbps stream.
const ASSUMED_BITRATE_BITS_PER_SEC: u64 = 128_000;

/// Filename hints that suggest recorded speech worth protecting.
const FLAGGED_NAME_HINTS: &[&str] = &[
    "meeting",
    "call",
    "interview",
    "voicemail",
    "dictation",
    "deposition",
];

/// Filename and size heuristics for audio.
///
/// No decoding happens here; the duration is an estimate from file size, and
/// a transcription-backed detector replaces this behind the same contract.
pub struct AudioDetector;

#[async_trait]
impl Detector for AudioDetector {
    fn name(&self) -> &str {
        "audio-heuristic"
    }

    fn modality(&self) -> Modality {
        Modality::Audio
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

        let est_secs = record.size_bytes * 8 / ASSUMED_BITRATE_BITS_PER_SEC;
        let extension = record
            .path
            .extension()
            .map(|e| e.to_string_lossy().to_uppercase())
            .unwrap_or_else(|| "audio".into());
        let summary = format!(
            "{extension} audio, estimated duration {}",
            format_duration(est_secs)
        );

        if hits.is_empty() {
            Ok(Analysis {
                sensitive: false,
                confidence: 0.5,
                rationale: "filename carries no recording markers".to_string(),
                summary,
            })
        } else {
            Ok(Analysis {
                sensitive: true,
                confidence: 0.35,
                rationale: format!("filename suggests recorded speech ({})", hits.join(", ")),
                summary,
            })
        }
    }
}

fn format_duration(total_secs: u64) -> String {
    let mins = total_secs / 60;
    let secs = total_secs % 60;
    if mins > 0 {
        format!("{mins}m{secs:02}s")
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::PathBuf;

    fn record(name: &str, size: u64) -> FileRecord {
        FileRecord {
            path: PathBuf::from(name),
            modality: Modality::Audio,
            size_bytes: size,
            discovered_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_meeting_recording_flagged() {
        let record = record("board_meeting_2024.mp3", 4 * 1024 * 1024);
        let reader = ContentReader::new(record.path.clone());
        let analysis = AudioDetector.detect(&record, &reader).await.unwrap();

        assert!(analysis.sensitive);
        assert!(analysis.rationale.contains("meeting"));
        assert!(analysis.summary.contains("MP3 audio"));
    }

    #[tokio::test]
    async fn test_music_track_not_flagged() {
        let record = record("track01.flac", 30 * 1024 * 1024);
        let reader = ContentReader::new(record.path.clone());
        let analysis = AudioDetector.detect(&record, &reader).await.unwrap();

        assert!(!analysis.sensitive);
    }

    #[tokio::test]
    async fn test_duration_estimate_in_summary() {
        // 960_000 bytes at 128 kbps is 60 seconds
        let record = record("clip.mp3", 960_000);
        let reader = ContentReader::new(record.path.clone());
        let analysis = AudioDetector.detect(&record, &reader).await.unwrap();

        assert!(analysis.summary.contains("1m00s"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(125), "2m05s");
    }
}
