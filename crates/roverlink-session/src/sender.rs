use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use roverlink_frame::{encode_packet, Packet, FRAME_SIZE};
use tracing::trace;

use crate::error::{Result, SessionError};

/// Writes complete frames to the transport.
///
/// Each send is fire-and-forget: the frame is written in full and
/// flushed, and the sender never waits for a response. Short writes are
/// retried until the frame is out; a zero-length write means the
/// transport is gone.
pub struct Sender<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> Sender<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(FRAME_SIZE),
        }
    }

    /// Encode and write one packet as a full frame.
    pub fn send(&mut self, packet: &Packet) -> Result<()> {
        self.buf.clear();
        encode_packet(packet, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(SessionError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(SessionError::Io(err)),
            }
        }
        self.flush()?;

        trace!(packet_type = ?packet.packet_type, code = packet.code, "frame sent");
        Ok(())
    }

    /// Send the session-opening hello.
    pub fn send_hello(&mut self) -> Result<()> {
        self.send(&Packet::hello())
    }

    fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(SessionError::Io(err)),
            }
        }
    }

    /// Consume the sender and return the inner transport.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
