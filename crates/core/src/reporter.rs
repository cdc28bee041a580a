use crate::types::{DetectorStatus, Modality, ScanWarning, VaultAction, Verdict};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Aggregate view over one batch. Derived, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_files: usize,
    pub by_modality: BTreeMap<Modality, usize>,
    pub sensitive_files: usize,
    pub safe_files: usize,
    pub detector_failures: usize,
    pub vaulted_files: usize,
    pub scan_warnings: usize,
    pub recommendations: Vec<String>,
}

/// One line of the scan report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub path: PathBuf,
    pub modality: Modality,
    pub sensitive: bool,
    pub confidence: f32,
    pub rationale: String,
    pub status: DetectorStatus,
}

/// Full report handed to callers: per-file entries plus the summary block.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub entries: Vec<ReportEntry>,
    pub warnings: Vec<ScanWarning>,
    pub vault_actions: Vec<VaultAction>,
    pub summary: Summary,
}

/// Pure aggregation over verdicts and vault actions.
pub fn summarize(
    verdicts: &[Verdict],
    vault_actions: &[VaultAction],
    warnings: &[ScanWarning],
) -> Summary {
    let mut by_modality: BTreeMap<Modality, usize> = BTreeMap::new();
    let mut sensitive_files = 0;
    let mut detector_failures = 0;

    for verdict in verdicts {
        *by_modality.entry(verdict.record.modality).or_default() += 1;
        if verdict.sensitive {
            sensitive_files += 1;
        }
        if verdict.status != DetectorStatus::Ok {
            detector_failures += 1;
        }
    }

    let mut recommendations = Vec::new();
    if sensitive_files > 0 {
        recommendations.push(format!(
            "{sensitive_files} sensitive file(s) require passphrase-gated access"
        ));
    }
    if detector_failures > 0 {
        recommendations.push(format!(
            "{detector_failures} file(s) could not be fully analyzed; review them manually"
        ));
    }
    if !warnings.is_empty() {
        recommendations.push(format!(
            "{} path(s) could not be read; adjust permissions and re-scan to cover them",
            warnings.len()
        ));
    }
    if recommendations.is_empty() {
        recommendations.push("no action required".to_string());
    }

    Summary {
        total_files: verdicts.len(),
        by_modality,
        sensitive_files,
        safe_files: verdicts.len() - sensitive_files,
        detector_failures,
        vaulted_files: vault_actions.len(),
        scan_warnings: warnings.len(),
        recommendations,
    }
}

/// Build the full per-file report plus summary.
pub fn build_report(
    verdicts: &[Verdict],
    vault_actions: &[VaultAction],
    warnings: &[ScanWarning],
) -> ScanReport {
    let entries = verdicts
        .iter()
        .map(|verdict| ReportEntry {
            path: verdict.record.path.clone(),
            modality: verdict.record.modality,
            sensitive: verdict.sensitive,
            confidence: verdict.confidence,
            rationale: verdict.rationale.clone(),
            status: verdict.status,
        })
        .collect();

    ScanReport {
        entries,
        warnings: warnings.to_vec(),
        vault_actions: vault_actions.to_vec(),
        summary: summarize(verdicts, vault_actions, warnings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileRecord;
    use chrono::Utc;

    fn verdict(name: &str, modality: Modality, sensitive: bool, status: DetectorStatus) -> Verdict {
        Verdict {
            record: FileRecord {
                path: PathBuf::from(name),
                modality,
                size_bytes: 10,
                discovered_at: Utc::now(),
            },
            sensitive,
            confidence: 0.8,
            rationale: "test".into(),
            summary: String::new(),
            detector_modality: modality,
            status,
        }
    }

    #[test]
    fn test_summary_counts() {
        let verdicts = vec![
            verdict("a.txt", Modality::Text, true, DetectorStatus::Ok),
            verdict("b.txt", Modality::Text, false, DetectorStatus::Ok),
            verdict("c.png", Modality::Image, false, DetectorStatus::Ok),
            verdict("d.mp3", Modality::Audio, true, DetectorStatus::TimedOut),
        ];
        let actions = vec![VaultAction {
            path: PathBuf::from("a.txt"),
            entry_id: "uuid-1".into(),
        }];

        let summary = summarize(&verdicts, &actions, &[]);

        assert_eq!(summary.total_files, 4);
        assert_eq!(summary.sensitive_files, 2);
        assert_eq!(summary.safe_files, 2);
        assert_eq!(summary.detector_failures, 1);
        assert_eq!(summary.vaulted_files, 1);
        assert_eq!(summary.by_modality[&Modality::Text], 2);
        assert_eq!(summary.by_modality[&Modality::Image], 1);
    }

    #[test]
    fn test_sensitive_files_drive_recommendation() {
        let verdicts = vec![verdict("a.txt", Modality::Text, true, DetectorStatus::Ok)];
        let summary = summarize(&verdicts, &[], &[]);
        assert!(summary.recommendations[0].contains("passphrase-gated access"));
    }

    #[test]
    fn test_clean_batch_needs_no_action() {
        let verdicts = vec![verdict("a.txt", Modality::Text, false, DetectorStatus::Ok)];
        let summary = summarize(&verdicts, &[], &[]);
        assert_eq!(summary.recommendations, vec!["no action required"]);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let verdicts = vec![verdict("a.txt", Modality::Text, true, DetectorStatus::Ok)];
        let report = build_report(&verdicts, &[], &[]);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"sensitive\":true"));
        assert!(json.contains("\"text\""));
    }
}
