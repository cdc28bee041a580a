use crate::detector::{ContentReader, Detector, DetectorRegistry};
use crate::scanner::{self, ScanError};
use crate::types::{DetectorStatus, FileRecord, ScanWarning, Verdict};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

#[derive(Debug, Error)]
pub enum OrchestrateError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Tuning knobs for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum detector invocations in flight at once.
    pub concurrency: usize,
    /// Per-file ceiling on a single detector call.
    pub detector_timeout: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            detector_timeout: Duration::from_secs(30),
        }
    }
}

/// Batch-level cancellation. Cancelling stops new dispatches; detections
/// already in flight run to completion or their timeout, and their verdicts
/// are kept.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub verdicts: Vec<Verdict>,
    pub warnings: Vec<ScanWarning>,
}

/// Runs Scanner → Classifier → Detector dispatch under bounded concurrency.
///
/// Every scanned file yields exactly one verdict; a crashing or hanging
/// detector is contained to its own file. Verdicts are returned in scan
/// order regardless of completion order.
pub struct Orchestrator {
    registry: Arc<DetectorRegistry>,
    opts: BatchOptions,
}

impl Orchestrator {
    pub fn new(registry: Arc<DetectorRegistry>, opts: BatchOptions) -> Self {
        Self { registry, opts }
    }

    pub async fn process_directory(&self, root: &Path) -> Result<BatchOutcome, OrchestrateError> {
        self.process_directory_with_cancel(root, CancelToken::new())
            .await
    }

    pub async fn process_directory_with_cancel(
        &self,
        root: &Path,
        cancel: CancelToken,
    ) -> Result<BatchOutcome, OrchestrateError> {
        let (tx, mut rx) = mpsc::channel::<FileRecord>(256);
        let walker = tokio::spawn(scanner::walk(root.to_path_buf(), tx));

        let semaphore = Arc::new(Semaphore::new(self.opts.concurrency.max(1)));
        let mut tasks: JoinSet<(usize, Verdict)> = JoinSet::new();
        let mut dispatched = 0usize;

        while let Some(record) = rx.recv().await {
            if cancel.is_cancelled() {
                tracing::info!("batch cancelled, stopping dispatch");
                break;
            }

            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let detector = self.registry.get(record.modality);
            let timeout = self.opts.detector_timeout;
            let seq = dispatched;
            dispatched += 1;

            tasks.spawn(async move {
                let _permit = permit;
                (seq, run_detector(detector, record, timeout).await)
            });
        }
        // Dropping the receiver tells the walker to stop early on cancel.
        drop(rx);

        let warnings = walker.await??;

        let mut indexed = Vec::with_capacity(dispatched);
        while let Some(joined) = tasks.join_next().await {
            indexed.push(joined?);
        }
        indexed.sort_by_key(|(seq, _)| *seq);

        tracing::info!(
            files = dispatched,
            warnings = warnings.len(),
            "batch complete"
        );

        Ok(BatchOutcome {
            verdicts: indexed.into_iter().map(|(_, verdict)| verdict).collect(),
            warnings,
        })
    }
}

/// Produce the single verdict for one file.
///
/// Timeouts, errors and panics all collapse into a conservative
/// `sensitive=true` verdict: an unanalyzed file is quarantined rather than
/// silently treated as safe. A missing detector is the one exception: that
/// is an expected configuration, not a failure.
async fn run_detector(
    detector: Option<Arc<dyn Detector>>,
    record: FileRecord,
    timeout: Duration,
) -> Verdict {
    let modality = record.modality;

    let Some(detector) = detector else {
        return Verdict {
            record,
            sensitive: false,
            confidence: 0.0,
            rationale: format!("no detector registered for {modality} files"),
            summary: String::new(),
            detector_modality: modality,
            status: DetectorStatus::Failed,
        };
    };

    let name = detector.name().to_string();
    let task_record = record.clone();
    // Inner spawn so a panicking detector surfaces as a JoinError instead of
    // tearing down the batch.
    let guarded = tokio::spawn(async move {
        let content = ContentReader::new(task_record.path.clone());
        detector.detect(&task_record, &content).await
    });
    let abort = guarded.abort_handle();

    match tokio::time::timeout(timeout, guarded).await {
        Err(_elapsed) => {
            abort.abort();
            tracing::warn!(
                detector = %name,
                path = %record.path.display(),
                "detector timed out"
            );
            conservative(
                record,
                DetectorStatus::TimedOut,
                format!(
                    "detector '{name}' did not finish within {}s; treating file as sensitive until analyzed",
                    timeout.as_secs()
                ),
            )
        }
        Ok(Err(join_err)) => {
            tracing::error!(
                detector = %name,
                path = %record.path.display(),
                error = %join_err,
                "detector crashed"
            );
            conservative(
                record,
                DetectorStatus::Failed,
                format!("detector '{name}' crashed; treating file as sensitive until analyzed"),
            )
        }
        Ok(Ok(Err(e))) => {
            tracing::warn!(
                detector = %name,
                path = %record.path.display(),
                error = %e,
                "detector failed"
            );
            conservative(
                record,
                DetectorStatus::Failed,
                format!("detector '{name}' failed ({e}); treating file as sensitive until analyzed"),
            )
        }
        Ok(Ok(Ok(analysis))) => Verdict {
            record,
            sensitive: analysis.sensitive,
            confidence: analysis.confidence.clamp(0.0, 1.0),
            rationale: analysis.rationale,
            summary: analysis.summary,
            detector_modality: modality,
            status: DetectorStatus::Ok,
        },
    }
}

fn conservative(record: FileRecord, status: DetectorStatus, rationale: String) -> Verdict {
    let modality = record.modality;
    Verdict {
        record,
        sensitive: true,
        confidence: 0.0,
        rationale,
        summary: String::new(),
        detector_modality: modality,
        status,
    }
}
