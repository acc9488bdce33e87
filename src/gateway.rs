//! The receive loop: poll, correct, classify, route.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{Receiver, RecvTimeoutError};
use tracing::{debug, info, trace, warn};
use typed_builder::TypedBuilder;

use crate::batch::{Batch, ImageBatcher, FLUSH_THRESHOLD};
use crate::fec::{BlockCodec, DecodedBlock, ReedSolomonCodec, MIN_MESSAGE_LEN};
use crate::packet::{classify, ChunkInfo, ClassifiedPacket};
use crate::radio::{Frame, RadioSession};
use crate::uploader::{AsyncUploader, BatchSink, TelemetryMeta, UploadSink};
use crate::Result;

/// Trailing hardware check sequence on every received payload.
pub const CHECK_LEN: usize = 2;
/// Pause between radio drain cycles.
pub const POLL_IDLE: Duration = Duration::from_millis(25);

/// Immutable gateway configuration, constructed once before the receive
/// loop starts.
#[derive(Debug, Clone, TypedBuilder)]
pub struct GatewayConfig {
    /// Receiver center frequency, Hz. Added to each frame's measured
    /// offset to report the absolute receive frequency.
    pub center_frequency_hz: i64,
    /// Number of background upload workers. Must be non-zero.
    #[builder(default = 2)]
    pub upload_workers: usize,
    /// Pause between radio drain cycles.
    #[builder(default = POLL_IDLE)]
    pub poll_idle: Duration,
}

/// Drives frames from a [`RadioSession`] through correction and
/// classification and routes the results to the collector sinks.
///
/// The loop itself is single-threaded; in-order processing is what makes
/// autotune feedback and the failure streak meaningful. Only delivery runs
/// in the background, on the uploader's worker pool.
pub struct Gateway<R> {
    config: GatewayConfig,
    radio: R,
    codec: Box<dyn BlockCodec>,
    telemetry: Arc<dyn UploadSink>,
    images: Arc<dyn BatchSink>,
    batcher: ImageBatcher,
    uploader: AsyncUploader,
    streak: u64,
}

impl<R> Gateway<R>
where
    R: RadioSession,
{
    #[must_use]
    pub fn new(
        config: GatewayConfig,
        radio: R,
        telemetry: Arc<dyn UploadSink>,
        images: Arc<dyn BatchSink>,
    ) -> Self {
        let uploader = AsyncUploader::new(config.upload_workers);
        Gateway {
            config,
            radio,
            codec: Box::new(ReedSolomonCodec),
            telemetry,
            images,
            batcher: ImageBatcher::new(FLUSH_THRESHOLD),
            uploader,
            streak: 0,
        }
    }

    /// Replace the default RS(255,223) codec.
    #[must_use]
    pub fn with_codec(mut self, codec: Box<dyn BlockCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Consecutive unrecoverable-block count, for operator diagnostics.
    #[must_use]
    pub fn failure_streak(&self) -> u64 {
        self.streak
    }

    /// Run the receive loop until `stop` is signalled or the radio faults.
    ///
    /// Each cycle drains the radio until no frames remain, then idles for
    /// the configured interval. Draining faster than real time keeps the
    /// modem's receive buffer from overflowing. On stop, any pending image
    /// batch is flushed and outstanding deliveries are given a chance to
    /// finish.
    ///
    /// # Errors
    /// [`crate::Error::Radio`] (or whatever the session reports) if
    /// polling fails. Radio faults are the one condition that ends the
    /// loop on its own.
    pub fn run(&mut self, stop: Receiver<()>) -> Result<()> {
        info!(
            center_frequency_hz = self.config.center_frequency_hz,
            "gateway receive loop starting"
        );
        loop {
            loop {
                let frames = self.radio.poll()?;
                if frames.is_empty() {
                    break;
                }
                for frame in frames {
                    self.handle_frame(frame);
                }
            }

            match stop.recv_timeout(self.config.poll_idle) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
        }

        if let Some(batch) = self.batcher.flush() {
            self.submit_batch(batch);
        }
        self.uploader.join();
        info!("gateway receive loop stopped");
        Ok(())
    }

    fn handle_frame(&mut self, frame: Frame) {
        if frame.payload.len() < CHECK_LEN + MIN_MESSAGE_LEN {
            trace!(
                len = frame.payload.len(),
                "frame too short for block decode, dropping"
            );
            return;
        }
        let message = &frame.payload[..frame.payload.len() - CHECK_LEN];

        match self.codec.decode(message) {
            Ok(DecodedBlock::Corrected {
                payload,
                error_count,
            }) => {
                self.streak = 0;
                info!(
                    len = message.len(),
                    rssi_dbm = frame.signal_strength,
                    offset_hz = frame.frequency_offset,
                    corrected = error_count,
                    "decoded frame"
                );
                self.radio.autotune(frame.frequency_offset);
                self.route(payload, &frame);
            }
            Ok(DecodedBlock::Unrecoverable) => {
                self.streak += 1;
                warn!(
                    len = message.len(),
                    rssi_dbm = frame.signal_strength,
                    offset_hz = frame.frequency_offset,
                    streak = self.streak,
                    "block not recoverable"
                );
            }
            Err(err) => {
                // lengths are pre-filtered, so this is a pipeline
                // misconfiguration rather than a bad frame
                warn!(%err, len = message.len(), "codec rejected frame");
            }
        }
    }

    fn route(&mut self, corrected: Vec<u8>, frame: &Frame) {
        match classify(corrected) {
            ClassifiedPacket::ImageChunk(chunk) => {
                if let Some(chunk_info) = ChunkInfo::decode(&chunk) {
                    info!(
                        image = chunk_info.image_id,
                        packet = chunk_info.packet_id,
                        sequences = chunk_info.sequences,
                        blocks = chunk_info.original_blocks,
                        total = chunk_info.total_packets(),
                        "image chunk"
                    );
                }
                if let Some(batch) = self.batcher.append(chunk) {
                    self.submit_batch(batch);
                }
            }
            ClassifiedPacket::Telemetry(text) => {
                // keep image batches roughly contiguous in time: anything
                // pending goes out before an unrelated telemetry upload
                if let Some(batch) = self.batcher.flush() {
                    self.submit_batch(batch);
                }

                let meta = TelemetryMeta {
                    frequency: self.config.center_frequency_hz
                        + i64::from(frame.frequency_offset),
                    signal_strength: frame.signal_strength,
                    received: frame.received,
                };
                info!(frequency_hz = meta.frequency, "telemetry: {text}");

                let sink = Arc::clone(&self.telemetry);
                self.uploader
                    .submit("telemetry", move || sink.submit_telemetry(&text, &meta));
            }
            ClassifiedPacket::Ignored(reason) => {
                debug!(reason, "packet ignored");
            }
        }
    }

    fn submit_batch(&self, batch: Batch) {
        debug!(chunks = batch.len(), "submitting image batch");
        let sink = Arc::clone(&self.images);
        self.uploader
            .submit("image batch", move || sink.submit_batch(batch));
    }
}
