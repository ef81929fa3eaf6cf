use bytes::{Buf, BufMut, BytesMut};
use tracing::trace;

use crate::error::{FrameError, Result};
use crate::packet::{Packet, PacketType, MAX_PARAMS, TEXT_CAPACITY};

/// Magic bytes: "RV" (0x52 0x56).
pub const MAGIC: [u8; 2] = [0x52, 0x56];

/// Offset of the checksum byte within a frame.
const CHECKSUM_OFFSET: usize = 2;

/// Fixed size of every frame on the wire.
///
/// Layout: magic (2) + checksum (1) + type (1) + code (1)
/// + params (16 × 4, LE) + text (32, zero-padded).
pub const FRAME_SIZE: usize = 2 + 1 + 1 + 1 + MAX_PARAMS * 4 + TEXT_CAPACITY;

const INITIAL_BUFFER_CAPACITY: usize = 4 * FRAME_SIZE;

/// Encode a packet as one frame appended to `dst`.
///
/// Always writes exactly [`FRAME_SIZE`] bytes for a structurally valid
/// packet; fails with `FieldTooLarge` if `text` exceeds its reserved
/// capacity. The checksum is computed last, over every frame byte except
/// the checksum field itself.
pub fn encode_packet(packet: &Packet, dst: &mut BytesMut) -> Result<()> {
    if packet.text.len() > TEXT_CAPACITY {
        return Err(FrameError::FieldTooLarge {
            field: "text",
            len: packet.text.len(),
            max: TEXT_CAPACITY,
        });
    }

    let start = dst.len();
    dst.reserve(FRAME_SIZE);
    dst.put_slice(&MAGIC);
    dst.put_u8(0); // checksum, patched below
    dst.put_u8(packet.packet_type as u8);
    dst.put_u8(packet.code);
    for param in packet.params {
        dst.put_i32_le(param);
    }
    dst.put_slice(packet.text.as_bytes());
    dst.put_bytes(0, TEXT_CAPACITY - packet.text.len());

    let sum = checksum(&dst[start..start + FRAME_SIZE]);
    dst[start + CHECKSUM_OFFSET] = sum;
    Ok(())
}

/// XOR of every frame byte except the checksum field.
fn checksum(frame: &[u8]) -> u8 {
    let mut sum = 0u8;
    for (i, byte) in frame.iter().enumerate() {
        if i != CHECKSUM_OFFSET {
            sum ^= byte;
        }
    }
    sum
}

/// Incremental frame decoder.
///
/// Owns the reassembly buffer: chunks of any size (down to a single byte)
/// are appended with [`feed`], and [`poll`] attempts to produce one packet
/// from whatever is buffered. After a framing error the buffer is
/// realigned — a `BadMagic` scans forward for the next possible marker, a
/// `BadChecksum` drops exactly the corrupt frame — so the next well-formed
/// frame still decodes.
///
/// [`feed`]: FrameDecoder::feed
/// [`poll`]: FrameDecoder::poll
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Append a chunk of raw stream bytes.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Attempt to decode one packet from the buffered bytes.
    ///
    /// Returns `Ok(None)` while the buffer holds less than a verifiable
    /// unit (marker, then full frame). A marker mismatch is reported as
    /// soon as the marker bytes are in — it does not wait for a full
    /// frame. On success exactly one frame is consumed; trailing bytes
    /// stay buffered for the next call.
    pub fn poll(&mut self) -> Result<Option<Packet>> {
        if self.buf.len() < MAGIC.len() {
            return Ok(None);
        }

        if self.buf[..MAGIC.len()] != MAGIC {
            self.resync();
            return Err(FrameError::BadMagic);
        }

        if self.buf.len() < FRAME_SIZE {
            return Ok(None);
        }

        let found = self.buf[CHECKSUM_OFFSET];
        let computed = checksum(&self.buf[..FRAME_SIZE]);
        if found != computed {
            // Drop the corrupt frame, keep anything after it.
            self.buf.advance(FRAME_SIZE);
            return Err(FrameError::BadChecksum { computed, found });
        }

        let frame = self.buf.split_to(FRAME_SIZE);
        decode_fields(&frame).map(Some)
    }

    /// Feed a chunk and attempt one decode: the one-outcome-per-read shape
    /// used by the receiver loop's first pass.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<Option<Packet>> {
        self.feed(chunk);
        self.poll()
    }

    /// Number of bytes currently awaiting a full frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Discard all buffered bytes.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Realign after a marker mismatch: drop bytes up to the next position
    /// that could start a marker. A full marker match qualifies, and so
    /// does a marker prefix touching the end of the buffer — a marker
    /// split across reads must not be thrown away.
    fn resync(&mut self) {
        let candidate = (1..self.buf.len()).find(|&i| {
            self.buf[i] == MAGIC[0] && (i + 1 == self.buf.len() || self.buf[i + 1] == MAGIC[1])
        });
        match candidate {
            Some(i) => {
                trace!(dropped = i, "resynchronized to next marker candidate");
                self.buf.advance(i);
            }
            None => {
                trace!(dropped = self.buf.len(), "no marker candidate, buffer cleared");
                self.buf.clear();
            }
        }
    }
}

fn decode_fields(frame: &[u8]) -> Result<Packet> {
    debug_assert_eq!(frame.len(), FRAME_SIZE);

    let raw_type = frame[3];
    let packet_type =
        PacketType::from_u8(raw_type).ok_or(FrameError::UnknownPacketType(raw_type))?;
    let code = frame[4];

    let mut params = [0i32; MAX_PARAMS];
    let mut offset = 5;
    for param in &mut params {
        let bytes: [u8; 4] = frame[offset..offset + 4]
            .try_into()
            .expect("param field is 4 bytes");
        *param = i32::from_le_bytes(bytes);
        offset += 4;
    }

    let raw_text = &frame[offset..offset + TEXT_CAPACITY];
    let end = raw_text.iter().position(|&b| b == 0).unwrap_or(TEXT_CAPACITY);
    // The text field is diagnostic, not data: invalid UTF-8 from the
    // controller becomes U+FFFD rather than failing the frame.
    let text = String::from_utf8_lossy(&raw_text[..end]).into_owned();

    Ok(Packet {
        packet_type,
        code,
        params,
        text,
    })
}
