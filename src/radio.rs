//! Interface to the modem driver.

use chrono::{DateTime, Utc};

use crate::Result;

/// One received unit from the modem, with link-quality metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Raw received bytes, trailing hardware check sequence included.
    pub payload: Vec<u8>,
    /// Received signal strength, dBm.
    pub signal_strength: i16,
    /// Measured offset from the configured center frequency, Hz.
    pub frequency_offset: i32,
    /// Reception timestamp, stamped when the frame was pulled from the
    /// modem.
    pub received: DateTime<Utc>,
}

impl Frame {
    #[must_use]
    pub fn new(payload: Vec<u8>, signal_strength: i16, frequency_offset: i32) -> Self {
        Frame {
            payload,
            signal_strength,
            frequency_offset,
            received: Utc::now(),
        }
    }
}

/// A configured receive session on the radio hardware.
///
/// The register-level modem driver lives outside this crate; the receive
/// loop only needs to drain buffered frames and feed measured frequency
/// offsets back for oscillator tracking.
pub trait RadioSession: Send {
    /// Drain and return all frames currently buffered by the modem. An
    /// empty `Vec` means nothing is waiting.
    ///
    /// # Errors
    /// Any error is treated as a radio fault and is fatal to the receive
    /// loop.
    fn poll(&mut self) -> Result<Vec<Frame>>;

    /// Adjust the local frequency reference by the offset measured on a
    /// successfully decoded frame.
    fn autotune(&mut self, offset_hz: i32);
}
