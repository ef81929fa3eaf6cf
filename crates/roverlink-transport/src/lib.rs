//! Serial transport for the roverlink host console.
//!
//! The robot hangs off a USB serial adapter (`/dev/ttyACM*` on the Pi).
//! This crate owns opening and configuring that device; everything above
//! it only sees a [`SerialStream`] implementing `Read + Write`.
//!
//! Reads are paced by the termios `VTIME` timeout: a read returning zero
//! bytes means "nothing arrived in this window", never end-of-stream.

pub mod config;
pub mod error;

#[cfg(unix)]
pub mod serial;

pub use config::{DataBits, Parity, SerialConfig, StopBits};
pub use error::{Result, TransportError};

#[cfg(unix)]
pub use serial::SerialStream;
