//! Fire-and-forget delivery to the remote collector services.

use chrono::{DateTime, Utc};
use serde::Serialize;
use threadpool::ThreadPool;
use tracing::{debug, warn};

use crate::batch::Batch;
use crate::Result;

/// Link-quality metadata attached to every telemetry submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryMeta {
    /// Absolute frequency the frame was received on, Hz.
    pub frequency: i64,
    /// Received signal strength, dBm.
    pub signal_strength: i16,
    /// Reception timestamp.
    pub received: DateTime<Utc>,
}

/// Remote collector accepting telemetry text.
pub trait UploadSink: Send + Sync {
    /// Submit one telemetry sentence with its link-quality metadata.
    /// Best-effort; a returned error is logged and dropped by the caller.
    fn submit_telemetry(&self, text: &str, meta: &TelemetryMeta) -> Result<()>;
}

/// Remote collector accepting batched image chunks.
pub trait BatchSink: Send + Sync {
    /// Submit one batch of image chunks, in receive order. Best-effort.
    fn submit_batch(&self, chunks: Batch) -> Result<()>;
}

/// Dispatches units of delivery work onto a bounded pool of background
/// workers so the receive loop never waits on the network.
///
/// Failures inside a unit of work are logged with the unit's label and
/// dropped; they never reach the submitting thread and are never retried.
pub struct AsyncUploader {
    pool: ThreadPool,
}

impl AsyncUploader {
    #[must_use]
    pub fn new(workers: usize) -> Self {
        AsyncUploader {
            pool: ThreadPool::with_name("uploader".into(), workers),
        }
    }

    /// Enqueue a unit of delivery work and return immediately.
    pub fn submit<F>(&self, label: &'static str, job: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.pool.execute(move || match job() {
            Ok(()) => debug!(label, "delivered"),
            Err(err) => warn!(label, %err, "delivery failed"),
        });
    }

    /// Block until all queued work has run. Used on shutdown.
    pub fn join(&self) {
        self.pool.join();
    }
}
