//! Fixed-size packet framing for the roverlink serial protocol.
//!
//! Every message on the wire is one frame of exactly [`FRAME_SIZE`] bytes:
//! - A 2-byte magic marker ("RV") for stream synchronization
//! - A 1-byte XOR checksum over the rest of the frame
//! - The serialized packet: type, code, 16 little-endian `i32` params,
//!   and a 32-byte zero-padded text field
//!
//! [`FrameDecoder`] reassembles frames from arbitrarily sized read chunks
//! and realigns the stream after a corrupted marker or checksum.
//!
//! [`FRAME_SIZE`]: codec::FRAME_SIZE

pub mod codec;
pub mod error;
pub mod packet;

pub use codec::{encode_packet, FrameDecoder, FRAME_SIZE, MAGIC};
pub use error::{FrameError, Result};
pub use packet::{
    CommandCode, ErrorCode, Packet, PacketType, ResponseCode, MAX_PARAMS, TEXT_CAPACITY,
};
