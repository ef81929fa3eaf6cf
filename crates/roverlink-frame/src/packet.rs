/// Number of `i32` parameter slots in every packet.
pub const MAX_PARAMS: usize = 16;

/// Capacity of the fixed-width text field, in bytes.
pub const TEXT_CAPACITY: usize = 32;

/// Packet kind, as carried in the frame's type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    Command = 0,
    Response = 1,
    Error = 2,
    Message = 3,
    Hello = 4,
}

impl PacketType {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Command),
            1 => Some(Self::Response),
            2 => Some(Self::Error),
            3 => Some(Self::Message),
            4 => Some(Self::Hello),
            _ => None,
        }
    }
}

/// Action id carried in the code byte of outgoing `Command` packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandCode {
    Forward = 0,
    Reverse = 1,
    TurnLeft = 2,
    TurnRight = 3,
    Stop = 4,
    GetStats = 5,
    ClearStats = 6,
    GetColor = 7,
    GetIr = 8,
}

/// Response id carried in the code byte of inbound `Response` packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResponseCode {
    Ok = 0,
    Status = 1,
    TooClose = 2,
    Color = 3,
    IrDistance = 4,
}

impl ResponseCode {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Ok),
            1 => Some(Self::Status),
            2 => Some(Self::TooClose),
            3 => Some(Self::Color),
            4 => Some(Self::IrDistance),
            _ => None,
        }
    }
}

/// Error id carried in the code byte of inbound `Error` packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    BadPacket = 0,
    BadChecksum = 1,
    BadCommand = 2,
    BadResponse = 3,
}

impl ErrorCode {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::BadPacket),
            1 => Some(Self::BadChecksum),
            2 => Some(Self::BadCommand),
            3 => Some(Self::BadResponse),
            _ => None,
        }
    }
}

/// A typed in-memory message.
///
/// `params` is always fully zero-initialized; a packet never carries stale
/// slots from an earlier message. `text` is empty except for `Message`
/// packets, and is bounded by [`TEXT_CAPACITY`] on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub packet_type: PacketType,
    /// Meaning depends on `packet_type`: action id for `Command`, response
    /// id for `Response`, error id for `Error`; unused otherwise.
    pub code: u8,
    pub params: [i32; MAX_PARAMS],
    pub text: String,
}

impl Packet {
    /// A fresh packet with zeroed params and no text.
    pub fn new(packet_type: PacketType, code: u8) -> Self {
        Self {
            packet_type,
            code,
            params: [0; MAX_PARAMS],
            text: String::new(),
        }
    }

    /// The session-opening handshake packet.
    pub fn hello() -> Self {
        Self::new(PacketType::Hello, 0)
    }

    /// A free-text message packet.
    pub fn message(text: impl Into<String>) -> Self {
        let mut packet = Self::new(PacketType::Message, 0);
        packet.text = text.into();
        packet
    }
}
