//! Classification of corrected downlink payloads.
//!
//! A corrected block is either a full-size coded image chunk, recognized by
//! its leading type byte, or plain ASCII telemetry with the Reed-Solomon
//! check symbols still attached at the tail.

use crate::fec::{BLOCK_LEN, PARITY_LEN};

/// Leading type byte of an image chunk carrying its own per-packet FEC.
pub const IMAGE_MARKER_FEC: u8 = 0x66;
/// Leading type byte of an image chunk without per-packet FEC.
pub const IMAGE_MARKER_NOFEC: u8 = 0x68;

/// A corrected payload sorted into its downstream handling path.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedPacket {
    /// Printable telemetry text, check symbols stripped.
    Telemetry(String),
    /// Full image-transfer block, header included, for downstream
    /// reassembly.
    ImageChunk(Vec<u8>),
    /// Not deliverable; carries the reason for diagnostics.
    Ignored(&'static str),
}

/// Sort a corrected payload into telemetry, image chunk, or ignored.
///
/// Image chunks must be exactly one nominal block long and start with a
/// recognized type marker. Anything else is treated as telemetry text with
/// the trailing check symbols stripped; bytes that do not decode as ASCII
/// are ignored.
#[must_use]
pub fn classify(corrected: Vec<u8>) -> ClassifiedPacket {
    if corrected.len() == BLOCK_LEN
        && matches!(corrected[0], IMAGE_MARKER_FEC | IMAGE_MARKER_NOFEC)
    {
        return ClassifiedPacket::ImageChunk(corrected);
    }

    let text_len = corrected.len().saturating_sub(PARITY_LEN);
    match std::str::from_utf8(&corrected[..text_len]) {
        Ok(text) if text.is_ascii() => ClassifiedPacket::Telemetry(text.to_owned()),
        _ => ClassifiedPacket::Ignored("not valid ascii text"),
    }
}

/// Header fields of an image chunk without per-packet FEC, used only for
/// operator-facing diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkInfo {
    pub image_id: u8,
    pub packet_id: u16,
    pub sequences: u8,
    pub original_blocks: u8,
}

impl ChunkInfo {
    /// Decode header fields from a chunk, or `None` if the chunk is not
    /// the no-FEC variant or is too short to carry the header.
    #[must_use]
    pub fn decode(chunk: &[u8]) -> Option<Self> {
        if chunk.len() < 10 || chunk[0] != IMAGE_MARKER_NOFEC {
            return None;
        }
        Some(ChunkInfo {
            image_id: chunk[5],
            packet_id: u16::from_be_bytes([chunk[6], chunk[7]]),
            sequences: chunk[8],
            original_blocks: chunk[9],
        })
    }

    /// Expected transfer size for the image, chunk header overhead
    /// included.
    #[must_use]
    pub fn total_packets(&self) -> u32 {
        u32::from(self.sequences) * u32::from(self.original_blocks) * 3 / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_chunk(marker: u8) -> Vec<u8> {
        let mut chunk = vec![0u8; BLOCK_LEN];
        chunk[0] = marker;
        chunk
    }

    #[test]
    fn full_block_with_marker_is_image_chunk() {
        for marker in [IMAGE_MARKER_FEC, IMAGE_MARKER_NOFEC] {
            let chunk = image_chunk(marker);
            assert_eq!(
                classify(chunk.clone()),
                ClassifiedPacket::ImageChunk(chunk),
                "marker {marker:#x}"
            );
        }
    }

    #[test]
    fn full_block_without_marker_is_not_image_chunk() {
        let mut block = vec![b'$'; BLOCK_LEN];
        block[0] = 0x42;
        assert!(matches!(
            classify(block),
            ClassifiedPacket::Telemetry(_)
        ));
    }

    #[test]
    fn short_block_with_marker_is_not_image_chunk() {
        let mut block = vec![b'a'; BLOCK_LEN - 1];
        block[0] = IMAGE_MARKER_FEC;
        // marker byte only counts on exactly full blocks
        assert!(matches!(classify(block), ClassifiedPacket::Telemetry(_)));
    }

    #[test]
    fn telemetry_text_strips_check_symbols() {
        let text = "$$PAYLOAD,123,51.5,-2.6,8000*AB";
        let mut payload = text.as_bytes().to_vec();
        payload.extend_from_slice(&[0u8; PARITY_LEN]);

        let zult = classify(payload);

        assert_eq!(zult, ClassifiedPacket::Telemetry(text.to_owned()));
    }

    #[test]
    fn non_ascii_payload_is_ignored() {
        let mut payload = vec![0xffu8; 64];
        payload.extend_from_slice(&[0u8; PARITY_LEN]);

        assert_eq!(
            classify(payload),
            ClassifiedPacket::Ignored("not valid ascii text")
        );
    }

    #[test]
    fn payload_shorter_than_check_region_is_empty_telemetry() {
        let payload = vec![b'x'; PARITY_LEN - 1];
        assert_eq!(classify(payload), ClassifiedPacket::Telemetry(String::new()));
    }

    #[test]
    fn classify_is_idempotent() {
        let chunk = image_chunk(IMAGE_MARKER_NOFEC);
        assert_eq!(classify(chunk.clone()), classify(chunk));

        let mut payload = b"hello".to_vec();
        payload.extend_from_slice(&[0u8; PARITY_LEN]);
        assert_eq!(classify(payload.clone()), classify(payload));
    }

    #[test]
    fn chunk_info_decodes_header_fields() {
        let mut chunk = image_chunk(IMAGE_MARKER_NOFEC);
        chunk[5] = 3; // image id
        chunk[6] = 0x01; // packet id hi
        chunk[7] = 0x2c; // packet id lo
        chunk[8] = 4; // sequences
        chunk[9] = 6; // original blocks

        let info = ChunkInfo::decode(&chunk).unwrap();

        assert_eq!(
            info,
            ChunkInfo {
                image_id: 3,
                packet_id: 300,
                sequences: 4,
                original_blocks: 6,
            }
        );
        assert_eq!(info.total_packets(), 36);
    }

    #[test]
    fn chunk_info_requires_nofec_marker() {
        assert!(ChunkInfo::decode(&image_chunk(IMAGE_MARKER_FEC)).is_none());
        assert!(ChunkInfo::decode(&[IMAGE_MARKER_NOFEC; 9]).is_none());
    }
}
