use serde::Serialize;

/// Diagnostic category for inbound `Error` packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCategory {
    /// The robot received a frame with a bad magic marker.
    RemoteBadMagic,
    /// The robot received a frame with a bad checksum.
    RemoteBadChecksum,
    /// The robot received a command it does not implement.
    RemoteBadCommand,
    /// The robot received a response it did not expect.
    RemoteBadResponse,
    /// An error code this console does not recognize.
    Unrecognized,
}

/// A dispatch event: the presentation-facing result of one decoded packet.
///
/// Events are plain data; rendering (colors, gauges, tables) belongs to
/// whoever consumes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// The robot acknowledged a command.
    Success,
    /// A status report carrying the full parameter vector.
    Telemetry { params: Vec<i32> },
    /// Color sensor reading, already mapped to 0–255 RGB.
    ColorDetected { r: i32, g: i32, b: i32 },
    /// The robot stopped itself because an obstacle is too close.
    TooClose,
    /// IR range reading in millimeters.
    DistanceDetected { mm: i32 },
    /// The robot reported an error.
    ErrorDiagnostic { category: DiagnosticCategory },
    /// Free-text message from the robot, verbatim.
    TextMessage { text: String },
}
