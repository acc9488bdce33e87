//! Bounded accumulation of image chunks between collector submissions.

use std::sync::Mutex;

/// Chunk count that triggers an automatic flush on append.
pub const FLUSH_THRESHOLD: usize = 10;

/// Ordered group of image chunks handed off for submission as one unit.
pub type Batch = Vec<Vec<u8>>;

/// Accumulates image chunks and hands full batches back to the caller.
///
/// Append and flush are serialized by an internal lock. A returned batch
/// transfers exclusive ownership of its chunks, so nothing mutable is
/// shared with whatever thread ends up delivering it.
pub struct ImageBatcher {
    threshold: usize,
    batch: Mutex<Batch>,
}

impl ImageBatcher {
    /// # Panics
    /// If `threshold` is 0.
    #[must_use]
    pub fn new(threshold: usize) -> Self {
        assert!(threshold > 0, "flush threshold must be non-zero");
        ImageBatcher {
            threshold,
            batch: Mutex::new(Vec::new()),
        }
    }

    /// Add a chunk to the live batch. Returns the accumulated chunks, in
    /// append order, exactly when the batch reaches the flush threshold.
    pub fn append(&self, chunk: Vec<u8>) -> Option<Batch> {
        let mut batch = self.batch.lock().expect("batcher lock poisoned");
        batch.push(chunk);
        if batch.len() >= self.threshold {
            Some(std::mem::take(&mut *batch))
        } else {
            None
        }
    }

    /// Swap the live batch for an empty one and return the prior contents,
    /// or `None` if nothing is pending.
    pub fn flush(&self) -> Option<Batch> {
        let mut batch = self.batch.lock().expect("batcher lock poisoned");
        if batch.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut *batch))
        }
    }
}

impl Default for ImageBatcher {
    fn default() -> Self {
        ImageBatcher::new(FLUSH_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(i: u8) -> Vec<u8> {
        vec![i; 4]
    }

    #[test]
    fn append_flushes_exactly_at_threshold() {
        let batcher = ImageBatcher::default();

        for i in 0..FLUSH_THRESHOLD - 1 {
            assert!(batcher.append(chunk(i as u8)).is_none());
        }
        let batch = batcher
            .append(chunk(9))
            .expect("tenth append should flush");

        assert_eq!(batch.len(), FLUSH_THRESHOLD);
        for (i, c) in batch.iter().enumerate() {
            assert_eq!(c, &chunk(i as u8), "chunks must keep append order");
        }

        // the flush emptied the live batch
        assert!(batcher.flush().is_none());
    }

    #[test]
    fn explicit_flush_returns_partial_batch() {
        let batcher = ImageBatcher::default();
        for i in 0..9 {
            assert!(batcher.append(chunk(i)).is_none());
        }

        let batch = batcher.flush().expect("pending chunks");
        assert_eq!(batch.len(), 9);
        assert!(batcher.flush().is_none());
    }

    #[test]
    fn flush_on_empty_batcher_is_a_noop() {
        let batcher = ImageBatcher::default();
        assert!(batcher.flush().is_none());
    }

    #[test]
    fn accumulation_restarts_after_auto_flush() {
        let batcher = ImageBatcher::new(2);

        assert!(batcher.append(chunk(0)).is_none());
        assert!(batcher.append(chunk(1)).is_some());
        assert!(batcher.append(chunk(2)).is_none());
        assert_eq!(batcher.flush(), Some(vec![chunk(2)]));
    }
}
