/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The buffered bytes do not start with the magic marker.
    #[error("invalid frame magic (expected 0x5256 \"RV\")")]
    BadMagic,

    /// A full frame arrived but its checksum does not match.
    #[error("bad frame checksum (computed {computed:#04x}, found {found:#04x})")]
    BadChecksum { computed: u8, found: u8 },

    /// A checksum-valid frame carried an unknown packet-type byte.
    #[error("unknown packet type {0:#04x}")]
    UnknownPacketType(u8),

    /// A packet field exceeds its reserved capacity in the frame.
    #[error("{field} too large ({len} bytes, max {max})")]
    FieldTooLarge {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

pub type Result<T> = std::result::Result<T, FrameError>;
