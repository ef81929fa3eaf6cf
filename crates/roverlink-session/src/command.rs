use roverlink_frame::{CommandCode, Packet, PacketType};

use crate::error::{Result, SessionError};

const POWER_MAX: i32 = 100;

/// A user intent, validated and ready for encoding.
///
/// Drive intents carry a distance (cm) or angle (degrees) plus a motor
/// power percentage. `Quit` is local-only and never produces a wire
/// packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Forward { amount: i32, power: i32 },
    Reverse { amount: i32, power: i32 },
    TurnLeft { amount: i32, power: i32 },
    TurnRight { amount: i32, power: i32 },
    Stop,
    ClearStats,
    GetStats,
    GetColor,
    GetIr,
    Quit,
}

impl Intent {
    /// Build the outgoing `Command` packet, or `None` for `Quit`.
    pub fn into_packet(self) -> Option<Packet> {
        let (code, params) = match self {
            Intent::Forward { amount, power } => (CommandCode::Forward, Some((amount, power))),
            Intent::Reverse { amount, power } => (CommandCode::Reverse, Some((amount, power))),
            Intent::TurnLeft { amount, power } => (CommandCode::TurnLeft, Some((amount, power))),
            Intent::TurnRight { amount, power } => (CommandCode::TurnRight, Some((amount, power))),
            Intent::Stop => (CommandCode::Stop, None),
            Intent::ClearStats => (CommandCode::ClearStats, None),
            Intent::GetStats => (CommandCode::GetStats, None),
            Intent::GetColor => (CommandCode::GetColor, None),
            Intent::GetIr => (CommandCode::GetIr, None),
            Intent::Quit => return None,
        };

        let mut packet = Packet::new(PacketType::Command, code as u8);
        if let Some((amount, power)) = params {
            packet.params[0] = amount;
            packet.params[1] = power;
        }
        if code == CommandCode::ClearStats {
            packet.params[0] = 0;
        }
        Some(packet)
    }
}

/// Parse one line of console input against the command grammar.
///
/// Grammar: a single command letter (case-insensitive), where the drive
/// letters `f`/`b`/`l`/`r` take exactly two integers (amount, power) and
/// `s`/`c`/`g`/`d`/`u`/`q` take none. Anything else is rejected here,
/// before the codec is ever touched.
pub fn parse_intent(line: &str) -> Result<Intent> {
    let mut tokens = line.split_whitespace();
    let head = tokens
        .next()
        .ok_or_else(|| SessionError::BadCommand("empty input".to_string()))?;

    let mut chars = head.chars();
    let letter = chars
        .next()
        .map(|c| c.to_ascii_lowercase())
        .filter(|_| chars.next().is_none())
        .ok_or_else(|| SessionError::BadCommand(format!("not a command letter: {head:?}")))?;

    let intent = match letter {
        'f' | 'b' | 'l' | 'r' => {
            let amount = parse_param(tokens.next(), "amount")?;
            let power = parse_param(tokens.next(), "power")?;
            check_range(amount, "amount", 0, i32::MAX)?;
            check_range(power, "power", 0, POWER_MAX)?;
            match letter {
                'f' => Intent::Forward { amount, power },
                'b' => Intent::Reverse { amount, power },
                'l' => Intent::TurnLeft { amount, power },
                _ => Intent::TurnRight { amount, power },
            }
        }
        's' => Intent::Stop,
        'c' => Intent::ClearStats,
        'g' => Intent::GetStats,
        'd' => Intent::GetColor,
        'u' => Intent::GetIr,
        'q' => Intent::Quit,
        other => {
            return Err(SessionError::BadCommand(format!(
                "unknown command letter {other:?}"
            )))
        }
    };

    if let Some(extra) = tokens.next() {
        return Err(SessionError::BadCommand(format!(
            "unexpected trailing input {extra:?}"
        )));
    }
    Ok(intent)
}

fn parse_param(token: Option<&str>, name: &'static str) -> Result<i32> {
    let token = token.ok_or_else(|| SessionError::BadCommand(format!("missing {name}")))?;
    token
        .parse::<i32>()
        .map_err(|_| SessionError::BadCommand(format!("{name} is not an integer: {token:?}")))
}

fn check_range(value: i32, name: &'static str, min: i32, max: i32) -> Result<()> {
    if value < min || value > max {
        return Err(SessionError::ParameterOutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use roverlink_frame::MAX_PARAMS;

    use super::*;

    #[test]
    fn forward_writes_two_params_rest_zero() {
        let packet = Intent::Forward {
            amount: 50,
            power: 75,
        }
        .into_packet()
        .unwrap();

        assert_eq!(packet.packet_type, PacketType::Command);
        assert_eq!(packet.code, CommandCode::Forward as u8);
        assert_eq!(packet.params[0], 50);
        assert_eq!(packet.params[1], 75);
        assert_eq!(&packet.params[2..], &[0; MAX_PARAMS - 2]);
    }

    #[test]
    fn clear_stats_writes_zero_param() {
        let packet = Intent::ClearStats.into_packet().unwrap();
        assert_eq!(packet.code, CommandCode::ClearStats as u8);
        assert_eq!(packet.params, [0; MAX_PARAMS]);
    }

    #[test]
    fn query_intents_have_no_params() {
        for intent in [Intent::Stop, Intent::GetStats, Intent::GetColor, Intent::GetIr] {
            let packet = intent.into_packet().unwrap();
            assert_eq!(packet.packet_type, PacketType::Command);
            assert_eq!(packet.params, [0; MAX_PARAMS]);
        }
    }

    #[test]
    fn quit_produces_no_packet() {
        assert_eq!(Intent::Quit.into_packet(), None);
    }

    #[test]
    fn parses_drive_commands() {
        assert_eq!(
            parse_intent("f 50 75").unwrap(),
            Intent::Forward {
                amount: 50,
                power: 75
            }
        );
        assert_eq!(
            parse_intent("L 90 60").unwrap(),
            Intent::TurnLeft {
                amount: 90,
                power: 60
            }
        );
    }

    #[test]
    fn parses_bare_commands_case_insensitively() {
        assert_eq!(parse_intent("s").unwrap(), Intent::Stop);
        assert_eq!(parse_intent("G").unwrap(), Intent::GetStats);
        assert_eq!(parse_intent("  q  ").unwrap(), Intent::Quit);
    }

    #[test]
    fn rejects_malformed_input() {
        for line in ["", "x", "forward", "f", "f 50", "f 50 abc", "f 50 75 9", "s 1"] {
            assert!(
                matches!(parse_intent(line), Err(SessionError::BadCommand(_))),
                "line {line:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_out_of_range_params() {
        assert!(matches!(
            parse_intent("f 50 101"),
            Err(SessionError::ParameterOutOfRange { name: "power", .. })
        ));
        assert!(matches!(
            parse_intent("b -5 75"),
            Err(SessionError::ParameterOutOfRange { name: "amount", .. })
        ));
    }
}
