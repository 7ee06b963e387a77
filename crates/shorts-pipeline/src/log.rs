//! Append-only pipeline log.
//!
//! Entries are returned to the caller with the result or the failure, and
//! mirrored to `tracing` with the run id attached.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{error, info, warn, Span};

use shorts_models::{PipelineLogEntry, PipelineStep};

/// Shared, cloneable handle to a run's log.
#[derive(Debug, Clone)]
pub struct PipelineLog {
    run_id: String,
    entries: Arc<Mutex<Vec<PipelineLogEntry>>>,
}

impl PipelineLog {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Record stage progress.
    pub fn info(&self, step: PipelineStep, message: impl Into<String>) {
        let message = message.into();
        info!(run_id = %self.run_id, step = %step, "{}", message);
        self.append(step, message);
    }

    /// Record a failure the pipeline absorbed.
    pub fn warn(&self, step: PipelineStep, message: impl Into<String>) {
        let message = message.into();
        warn!(run_id = %self.run_id, step = %step, "{}", message);
        self.append(step, message);
    }

    /// Record a failure that ended the run.
    pub fn error(&self, step: PipelineStep, message: impl Into<String>) {
        let message = message.into();
        error!(run_id = %self.run_id, step = %step, "{}", message);
        self.append(step, message);
    }

    /// Copy of all entries so far.
    pub fn snapshot(&self) -> Vec<PipelineLogEntry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Tracing span for this run.
    pub fn span(&self) -> Span {
        tracing::info_span!("pipeline", run_id = %self.run_id)
    }

    fn append(&self, step: PipelineStep, message: String) {
        let mut entries = self.lock();
        // Clock steps backwards must not reorder the log
        let now = Utc::now();
        let timestamp = entries.last().map_or(now, |last| last.timestamp.max(now));
        entries.push(PipelineLogEntry {
            step,
            message,
            timestamp,
        });
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PipelineLogEntry>> {
        // Entries are only ever pushed, so a poisoned guard is still consistent
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_order_and_timestamps() {
        let log = PipelineLog::new("run-1");
        log.info(PipelineStep::Planning, "planning");
        log.warn(PipelineStep::Thumbnail, "placeholder");
        log.error(PipelineStep::Failed, "boom");

        let entries = log.snapshot();
        let steps: Vec<_> = entries.iter().map(|e| e.step).collect();
        assert_eq!(steps, vec![PipelineStep::Planning, PipelineStep::Thumbnail, PipelineStep::Failed]);
        assert!(entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let log = PipelineLog::new("run-2");
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let log = log.clone();
                tokio::spawn(async move { log.info(PipelineStep::Generating, format!("beat {i}")) })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(log.len(), 8);
        let entries = log.snapshot();
        assert!(entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}
