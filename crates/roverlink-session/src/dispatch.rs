use roverlink_frame::{ErrorCode, Packet, PacketType, ResponseCode};

use crate::event::{DiagnosticCategory, Event};

/// Raw color-sensor pulse width at full saturation.
const COLOR_RAW_LOW: i32 = 8;
/// Raw color-sensor pulse width at zero saturation.
const COLOR_RAW_HIGH: i32 = 80;

/// Route a decoded packet to its dispatch event.
///
/// Returns `None` for packets this endpoint does not consume: `Command`
/// packets (only we originate commands) and inbound `Hello`s.
pub fn dispatch(packet: &Packet) -> Option<Event> {
    match packet.packet_type {
        PacketType::Command | PacketType::Hello => None,
        PacketType::Response => Some(dispatch_response(packet)),
        PacketType::Error => Some(Event::ErrorDiagnostic {
            category: categorize_error(packet.code),
        }),
        PacketType::Message => Some(Event::TextMessage {
            text: packet.text.clone(),
        }),
    }
}

fn dispatch_response(packet: &Packet) -> Event {
    match ResponseCode::from_u8(packet.code) {
        Some(ResponseCode::Ok) => Event::Success,
        Some(ResponseCode::Status) => Event::Telemetry {
            params: packet.params.to_vec(),
        },
        Some(ResponseCode::Color) => Event::ColorDetected {
            r: scale(packet.params[0], COLOR_RAW_LOW, COLOR_RAW_HIGH, 255, 0),
            g: scale(packet.params[1], COLOR_RAW_LOW, COLOR_RAW_HIGH, 255, 0),
            b: scale(packet.params[2], COLOR_RAW_LOW, COLOR_RAW_HIGH, 255, 0),
        },
        Some(ResponseCode::TooClose) => Event::TooClose,
        Some(ResponseCode::IrDistance) => Event::DistanceDetected {
            mm: packet.params[0],
        },
        None => Event::ErrorDiagnostic {
            category: DiagnosticCategory::Unrecognized,
        },
    }
}

fn categorize_error(code: u8) -> DiagnosticCategory {
    match ErrorCode::from_u8(code) {
        Some(ErrorCode::BadPacket) => DiagnosticCategory::RemoteBadMagic,
        Some(ErrorCode::BadChecksum) => DiagnosticCategory::RemoteBadChecksum,
        Some(ErrorCode::BadCommand) => DiagnosticCategory::RemoteBadCommand,
        Some(ErrorCode::BadResponse) => DiagnosticCategory::RemoteBadResponse,
        None => DiagnosticCategory::Unrecognized,
    }
}

/// Linear mapping with truncating integer division, matching the robot's
/// own `map()` arithmetic exactly.
pub fn scale(value: i32, from_low: i32, from_high: i32, to_low: i32, to_high: i32) -> i32 {
    (value - from_low) * (to_high - to_low) / (from_high - from_low) + to_low
}

#[cfg(test)]
mod tests {
    use roverlink_frame::MAX_PARAMS;

    use super::*;

    #[test]
    fn scale_matches_reference_points() {
        assert_eq!(scale(8, 8, 80, 255, 0), 255);
        assert_eq!(scale(80, 8, 80, 255, 0), 0);
        // Truncation toward zero: (44-8)*(0-255)/72 is -127, not -128.
        assert_eq!(scale(44, 8, 80, 255, 0), 128);
    }

    #[test]
    fn inbound_commands_and_hellos_are_ignored() {
        assert_eq!(dispatch(&Packet::new(PacketType::Command, 0)), None);
        assert_eq!(dispatch(&Packet::hello()), None);
    }

    #[test]
    fn ok_response_is_success() {
        let packet = Packet::new(PacketType::Response, ResponseCode::Ok as u8);
        assert_eq!(dispatch(&packet), Some(Event::Success));
    }

    #[test]
    fn status_response_carries_full_params() {
        let mut packet = Packet::new(PacketType::Response, ResponseCode::Status as u8);
        for (i, param) in packet.params.iter_mut().enumerate() {
            *param = i as i32 * 11;
        }
        let event = dispatch(&packet).unwrap();
        match event {
            Event::Telemetry { params } => {
                assert_eq!(params.len(), MAX_PARAMS);
                assert_eq!(params[12], 132);
            }
            other => panic!("expected telemetry, got {other:?}"),
        }
    }

    #[test]
    fn color_response_maps_first_three_params() {
        let mut packet = Packet::new(PacketType::Response, ResponseCode::Color as u8);
        packet.params[0] = 8;
        packet.params[1] = 80;
        packet.params[2] = 44;
        assert_eq!(
            dispatch(&packet),
            Some(Event::ColorDetected { r: 255, g: 0, b: 128 })
        );
    }

    #[test]
    fn distance_response_reports_millimeters() {
        let mut packet = Packet::new(PacketType::Response, ResponseCode::IrDistance as u8);
        packet.params[0] = 183;
        assert_eq!(dispatch(&packet), Some(Event::DistanceDetected { mm: 183 }));
    }

    #[test]
    fn too_close_response() {
        let packet = Packet::new(PacketType::Response, ResponseCode::TooClose as u8);
        assert_eq!(dispatch(&packet), Some(Event::TooClose));
    }

    #[test]
    fn error_codes_map_to_categories() {
        let cases = [
            (0, DiagnosticCategory::RemoteBadMagic),
            (1, DiagnosticCategory::RemoteBadChecksum),
            (2, DiagnosticCategory::RemoteBadCommand),
            (3, DiagnosticCategory::RemoteBadResponse),
            (99, DiagnosticCategory::Unrecognized),
        ];
        for (code, category) in cases {
            let packet = Packet::new(PacketType::Error, code);
            assert_eq!(
                dispatch(&packet),
                Some(Event::ErrorDiagnostic { category }),
                "code {code}"
            );
        }
    }

    #[test]
    fn unknown_response_code_is_diagnostic_not_fatal() {
        let packet = Packet::new(PacketType::Response, 42);
        assert_eq!(
            dispatch(&packet),
            Some(Event::ErrorDiagnostic {
                category: DiagnosticCategory::Unrecognized
            })
        );
    }

    #[test]
    fn message_text_passes_through_verbatim() {
        let packet = Packet::message("battery low");
        assert_eq!(
            dispatch(&packet),
            Some(Event::TextMessage {
                text: "battery low".to_string()
            })
        );
    }
}
