//! Forward error correction for received downlink messages.
//!
//! The transmitter sends RS(255,223) code blocks, shortening them by
//! omitting leading zero data bytes. The receiver therefore pads each
//! message back up to the nominal block size with leading zeros before
//! running the decoder, then returns only the bytes that were actually
//! received.

use rs2::{correct_message, RSState};
use tracing::trace;

use crate::{Error, Result};

/// Nominal FEC block length in bytes, check symbols included.
pub const BLOCK_LEN: usize = 255;
/// Reed-Solomon check symbol footprint at the tail of every block.
pub const PARITY_LEN: usize = 32;
/// Smallest message that still carries a full set of check symbols.
pub const MIN_MESSAGE_LEN: usize = PARITY_LEN;

/// Disposition of one received message after error correction.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedBlock {
    /// The block checked out, possibly after correction. The payload has
    /// the same length as the codec input and `error_count` is the number
    /// of byte errors corrected (0 means no corruption was detected).
    Corrected {
        payload: Vec<u8>,
        error_count: usize,
    },
    /// More errors than the code can uniquely resolve.
    Unrecoverable,
}

/// Seam between the receive loop and the error-correction primitive.
pub trait BlockCodec: Send + Sync {
    /// Correct a single received message.
    ///
    /// # Errors
    /// [`Error::Codec`] if the message length is outside
    /// `MIN_MESSAGE_LEN..=BLOCK_LEN`. Callers are expected to pre-filter,
    /// so hitting this indicates a misconfigured pipeline rather than a
    /// bad frame.
    fn decode(&self, message: &[u8]) -> Result<DecodedBlock>;
}

/// RS(255,255-32) decode assuming left zero padding up to the nominal
/// block size.
#[derive(Clone, Debug, Default)]
pub struct ReedSolomonCodec;

impl ReedSolomonCodec {
    fn can_decode(message: &[u8]) -> bool {
        (MIN_MESSAGE_LEN..=BLOCK_LEN).contains(&message.len())
    }
}

impl BlockCodec for ReedSolomonCodec {
    fn decode(&self, message: &[u8]) -> Result<DecodedBlock> {
        if !Self::can_decode(message) {
            return Err(Error::Codec(format!(
                "message len={} outside decodable range {MIN_MESSAGE_LEN}..={BLOCK_LEN}",
                message.len(),
            )));
        }

        let pad = BLOCK_LEN - message.len();
        let mut block = [0u8; BLOCK_LEN];
        block[pad..].copy_from_slice(message);

        let zult = correct_message(&block);
        match zult.state {
            RSState::Uncorrectable(reason) => {
                trace!(%reason, "block not recoverable");
                Ok(DecodedBlock::Unrecoverable)
            }
            state => {
                let corrected = zult.message.expect("checked rs message has no data");
                let error_count = match state {
                    RSState::Corrected(num) => usize::try_from(num).unwrap_or_default(),
                    _ => 0,
                };
                Ok(DecodedBlock::Corrected {
                    payload: corrected[pad..].to_vec(),
                    error_count,
                })
            }
        }
    }
}
