//! Session layer for the roverlink host console.
//!
//! Two tasks share the full-duplex serial link for the lifetime of a
//! session: a foreground sender driven by user intents, and a background
//! [`Receiver`] that reassembles inbound frames and routes each decoded
//! packet to a dispatch [`Event`]. Sends are fire-and-forget; neither
//! direction ever waits on the other.

pub mod command;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod receiver;
pub mod sender;

pub use command::{parse_intent, Intent};
pub use dispatch::{dispatch, scale};
pub use error::{Result, SessionError};
pub use event::{DiagnosticCategory, Event};
pub use receiver::Receiver;
pub use sender::Sender;
