/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Frame-level encode/decode error.
    #[error("frame error: {0}")]
    Frame(#[from] roverlink_frame::FrameError),

    /// I/O error on the underlying transport.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport accepted no more bytes mid-frame.
    #[error("transport closed (frame partially written)")]
    ConnectionClosed,

    /// Input did not match the command grammar.
    #[error("bad command: {0}")]
    BadCommand(String),

    /// A command parameter is outside its accepted range.
    #[error("{name} {value} out of range ({min}..={max})")]
    ParameterOutOfRange {
        name: &'static str,
        value: i32,
        min: i32,
        max: i32,
    },
}

pub type Result<T> = std::result::Result<T, SessionError>;
