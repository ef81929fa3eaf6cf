mod console;
mod exit;
mod logging;
mod presenter;

use clap::{Parser, ValueEnum};
use roverlink_transport::{DataBits, Parity, StopBits};

use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::presenter::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "roverlink", version, about = "Serial console for the roverlink robot")]
pub struct Cli {
    /// Serial device, e.g. /dev/ttyACM0.
    pub device: std::path::PathBuf,

    /// Baud rate.
    #[arg(long, default_value_t = 9600)]
    pub baud: u32,

    /// Data bits per character.
    #[arg(long, value_enum, default_value = "8")]
    pub data_bits: DataBitsArg,

    /// Parity mode.
    #[arg(long, value_enum, default_value = "none")]
    pub parity: ParityArg,

    /// Stop bits.
    #[arg(long, value_enum, default_value = "1")]
    pub stop_bits: StopBitsArg,

    /// Seconds to wait after open for the microcontroller to reboot.
    #[arg(long, default_value_t = 2)]
    pub settle: u64,

    /// Console output style.
    #[arg(long, value_enum, default_value = "fancy")]
    pub format: OutputFormat,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum DataBitsArg {
    #[value(name = "7")]
    Seven,
    #[value(name = "8")]
    Eight,
}

impl From<DataBitsArg> for DataBits {
    fn from(arg: DataBitsArg) -> Self {
        match arg {
            DataBitsArg::Seven => DataBits::Seven,
            DataBitsArg::Eight => DataBits::Eight,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum ParityArg {
    None,
    Even,
    Odd,
}

impl From<ParityArg> for Parity {
    fn from(arg: ParityArg) -> Self {
        match arg {
            ParityArg::None => Parity::None,
            ParityArg::Even => Parity::Even,
            ParityArg::Odd => Parity::Odd,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum StopBitsArg {
    #[value(name = "1")]
    One,
    #[value(name = "2")]
    Two,
}

impl From<StopBitsArg> for StopBits {
    fn from(arg: StopBitsArg) -> Self {
        match arg {
            StopBitsArg::One => StopBits::One,
            StopBitsArg::Two => StopBits::Two,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    match console::run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_device_with_defaults() {
        let cli = Cli::try_parse_from(["roverlink", "/dev/ttyACM0"]).expect("args should parse");
        assert_eq!(cli.device.to_str(), Some("/dev/ttyACM0"));
        assert_eq!(cli.baud, 9600);
        assert_eq!(cli.settle, 2);
        assert!(matches!(cli.parity, ParityArg::None));
        assert!(matches!(cli.format, OutputFormat::Fancy));
    }

    #[test]
    fn parses_full_serial_geometry() {
        let cli = Cli::try_parse_from([
            "roverlink",
            "/dev/ttyUSB1",
            "--baud",
            "115200",
            "--data-bits",
            "7",
            "--parity",
            "even",
            "--stop-bits",
            "2",
            "--format",
            "json",
        ])
        .expect("args should parse");

        assert_eq!(cli.baud, 115200);
        assert!(matches!(cli.data_bits, DataBitsArg::Seven));
        assert!(matches!(cli.parity, ParityArg::Even));
        assert!(matches!(cli.stop_bits, StopBitsArg::Two));
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn rejects_missing_device() {
        assert!(Cli::try_parse_from(["roverlink"]).is_err());
    }

    #[test]
    fn rejects_unknown_parity() {
        assert!(Cli::try_parse_from(["roverlink", "/dev/ttyACM0", "--parity", "mark"]).is_err());
    }
}
