use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use roverlink_frame::FrameDecoder;
use tracing::{debug, warn};

use crate::dispatch::dispatch;
use crate::error::{Result, SessionError};
use crate::event::Event;

const READ_CHUNK_SIZE: usize = 256;

/// Consecutive transport read failures tolerated before the loop gives up.
/// `Interrupted` reads retry without counting; the serial read timeout
/// already paces the loop, so no extra backoff is applied.
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 5;

/// The background receive loop.
///
/// Repeatedly reads from the transport, reassembles frames through the
/// owned [`FrameDecoder`], and hands each dispatched [`Event`] to the
/// handler synchronously. Framing errors are non-fatal diagnostics: the
/// decoder resynchronizes and the loop keeps going. The shutdown flag is
/// observed before every blocking read, so the loop stops within one read
/// timeout of cancellation.
pub struct Receiver<T> {
    inner: T,
    decoder: FrameDecoder,
    shutdown: Arc<AtomicBool>,
    /// Bytes read since the last fully decoded frame, for diagnostics.
    pending_bytes: usize,
}

impl<T: Read> Receiver<T> {
    pub fn new(inner: T, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            inner,
            decoder: FrameDecoder::new(),
            shutdown,
            pending_bytes: 0,
        }
    }

    /// Run until the shutdown flag is raised or the transport fails hard.
    pub fn run<H: FnMut(Event)>(mut self, mut handler: H) -> Result<()> {
        let mut consecutive_errors = 0u32;
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        while !self.shutdown.load(Ordering::SeqCst) {
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => {
                    consecutive_errors = 0;
                    n
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    consecutive_errors += 1;
                    warn!(
                        error = %err,
                        attempt = consecutive_errors,
                        "transport read failed"
                    );
                    if consecutive_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                        return Err(SessionError::Io(err));
                    }
                    continue;
                }
            };

            if read == 0 {
                // Read timeout elapsed with nothing on the wire.
                continue;
            }

            self.pending_bytes += read;
            self.decoder.feed(&chunk[..read]);
            self.drain(&mut handler);
        }

        debug!("receiver loop stopped");
        Ok(())
    }

    /// Decode everything currently buffered. One read can complete more
    /// than one frame; a framing error realigns the buffer and decoding
    /// continues behind it.
    fn drain<H: FnMut(Event)>(&mut self, handler: &mut H) {
        loop {
            match self.decoder.poll() {
                Ok(Some(packet)) => {
                    self.pending_bytes = 0;
                    if let Some(event) = dispatch(&packet) {
                        handler(event);
                    }
                }
                Ok(None) => return,
                Err(err) => {
                    warn!(
                        error = %err,
                        buffered = self.decoder.buffered(),
                        pending = self.pending_bytes,
                        "framing error, resynchronizing"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use bytes::BytesMut;
    use roverlink_frame::{encode_packet, Packet, PacketType, ResponseCode};

    use super::*;
    use crate::event::DiagnosticCategory;

    fn response(code: ResponseCode) -> Packet {
        Packet::new(PacketType::Response, code as u8)
    }

    fn wire(packets: &[Packet]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for packet in packets {
            encode_packet(packet, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    /// Yields one byte per read, then zero-length reads forever.
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    fn collect_events(bytes: Vec<u8>, expected: usize) -> Vec<Event> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let receiver = Receiver::new(ByteByByteReader { bytes, pos: 0 }, shutdown.clone());

        let mut events = Vec::new();
        receiver
            .run(|event| {
                events.push(event);
                if events.len() >= expected {
                    shutdown.store(true, Ordering::SeqCst);
                }
            })
            .unwrap();
        events
    }

    #[test]
    fn delivers_events_from_single_byte_reads() {
        let events = collect_events(wire(&[response(ResponseCode::Ok)]), 1);
        assert_eq!(events, vec![Event::Success]);
    }

    #[test]
    fn continues_after_bad_checksum() {
        let mut bytes = wire(&[response(ResponseCode::TooClose)]);
        bytes[2] ^= 0xA5; // corrupt the first frame's checksum
        bytes.extend_from_slice(&wire(&[response(ResponseCode::Ok)]));

        let events = collect_events(bytes, 1);
        assert_eq!(events, vec![Event::Success]);
    }

    #[test]
    fn continues_after_garbage_prefix() {
        let mut bytes = vec![0x00, 0x7F, 0x3C];
        bytes.extend_from_slice(&wire(&[response(ResponseCode::TooClose)]));

        let events = collect_events(bytes, 1);
        assert_eq!(events, vec![Event::TooClose]);
    }

    #[test]
    fn inbound_commands_produce_no_events() {
        let mut bytes = wire(&[Packet::new(PacketType::Command, 0)]);
        bytes.extend_from_slice(&wire(&[Packet::new(PacketType::Error, 1)]));

        let events = collect_events(bytes, 1);
        assert_eq!(
            events,
            vec![Event::ErrorDiagnostic {
                category: DiagnosticCategory::RemoteBadChecksum
            }]
        );
    }

    #[test]
    fn multiple_frames_in_one_read_all_dispatch() {
        struct AllAtOnce(Option<Vec<u8>>);
        impl Read for AllAtOnce {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                match self.0.take() {
                    Some(bytes) => {
                        buf[..bytes.len()].copy_from_slice(&bytes);
                        Ok(bytes.len())
                    }
                    None => Ok(0),
                }
            }
        }

        let bytes = wire(&[response(ResponseCode::Ok), response(ResponseCode::TooClose)]);
        assert!(bytes.len() <= READ_CHUNK_SIZE);

        let shutdown = Arc::new(AtomicBool::new(false));
        let receiver = Receiver::new(AllAtOnce(Some(bytes)), shutdown.clone());

        let mut events = Vec::new();
        receiver
            .run(|event| {
                events.push(event);
                if events.len() == 2 {
                    shutdown.store(true, Ordering::SeqCst);
                }
            })
            .unwrap();

        assert_eq!(events, vec![Event::Success, Event::TooClose]);
    }

    #[test]
    fn shutdown_is_checked_before_reading() {
        struct PanicReader;
        impl Read for PanicReader {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                panic!("read after shutdown");
            }
        }

        let shutdown = Arc::new(AtomicBool::new(true));
        let receiver = Receiver::new(PanicReader, shutdown);
        receiver.run(|_| panic!("no events expected")).unwrap();
    }

    #[test]
    fn interrupted_reads_retry_without_counting() {
        struct InterruptedThenData {
            interruptions: u32,
            bytes: Vec<u8>,
            pos: usize,
        }
        impl Read for InterruptedThenData {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.interruptions > 0 {
                    self.interruptions -= 1;
                    return Err(io::Error::from(ErrorKind::Interrupted));
                }
                if self.pos >= self.bytes.len() {
                    return Ok(0);
                }
                let n = (self.bytes.len() - self.pos).min(buf.len());
                buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
                self.pos += n;
                Ok(n)
            }
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let reader = InterruptedThenData {
            interruptions: 20,
            bytes: wire(&[response(ResponseCode::Ok)]),
            pos: 0,
        };
        let receiver = Receiver::new(reader, shutdown.clone());

        let mut events = Vec::new();
        receiver
            .run(|event| {
                events.push(event);
                shutdown.store(true, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(events, vec![Event::Success]);
    }

    #[test]
    fn persistent_read_errors_stop_the_loop() {
        struct BrokenReader {
            attempts: u32,
        }
        impl Read for BrokenReader {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                self.attempts += 1;
                Err(io::Error::other("device unplugged"))
            }
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let receiver = Receiver::new(BrokenReader { attempts: 0 }, shutdown);
        let err = receiver.run(|_| panic!("no events expected")).unwrap_err();
        assert!(matches!(err, SessionError::Io(_)));
    }

    #[test]
    fn transient_read_errors_are_forgiven() {
        struct FlakyReader {
            failures_left: u32,
            bytes: Vec<u8>,
            pos: usize,
        }
        impl Read for FlakyReader {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.failures_left > 0 {
                    self.failures_left -= 1;
                    return Err(io::Error::other("glitch"));
                }
                if self.pos >= self.bytes.len() {
                    return Ok(0);
                }
                let n = (self.bytes.len() - self.pos).min(buf.len());
                buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
                self.pos += n;
                Ok(n)
            }
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let reader = FlakyReader {
            failures_left: MAX_CONSECUTIVE_READ_ERRORS - 1,
            bytes: wire(&[response(ResponseCode::Ok)]),
            pos: 0,
        };
        let receiver = Receiver::new(reader, shutdown.clone());

        let mut events = Vec::new();
        receiver
            .run(|event| {
                events.push(event);
                shutdown.store(true, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(events, vec![Event::Success]);
    }
}
