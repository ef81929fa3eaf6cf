use clap::ValueEnum;
use comfy_table::{presets, ContentArrangement, Table};
use roverlink_session::{DiagnosticCategory, Event};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Plain text, no ANSI sequences.
    Plain,
    /// Colors, swatches and gauges.
    Fancy,
    /// One JSON event per line.
    Json,
}

/// Presentation boundary: one core session, pluggable rendering.
pub trait Present: Send + Sync {
    fn event(&self, event: &Event);
    fn controls(&self);
    fn notice(&self, text: &str);
}

pub fn presenter_for(format: OutputFormat) -> std::sync::Arc<dyn Present> {
    match format {
        OutputFormat::Plain => std::sync::Arc::new(PlainPresenter),
        OutputFormat::Fancy => std::sync::Arc::new(FancyPresenter),
        OutputFormat::Json => std::sync::Arc::new(JsonPresenter),
    }
}

/// Row labels for the status report, in firmware parameter order.
const TELEMETRY_LABELS: [&str; 13] = [
    "Left Forward Ticks",
    "Right Forward Ticks",
    "Left Reverse Ticks",
    "Right Reverse Ticks",
    "Left Forward Ticks Turns",
    "Right Forward Ticks Turns",
    "Left Reverse Ticks Turns",
    "Right Reverse Ticks Turns",
    "Forward Distance",
    "Reverse Distance",
    "Target Ticks",
    "Delta Ticks",
    "Delta Dist",
];

const MENU: &str = "\
> Controls
   F      [S]top Robot    [D]etect Color
 L   R    [G]et Stats     [U]ltrasonic Measurement
   B      [C]lear Stats   [Q]uit
Drive commands take two integers: f 50 75 (amount, power%)";

fn telemetry_table(params: &[i32], preset: &str) -> Table {
    let mut table = Table::new();
    table
        .load_preset(preset)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["FIELD", "VALUE"]);
    for (label, value) in TELEMETRY_LABELS.iter().zip(params) {
        table.add_row(vec![label.to_string(), value.to_string()]);
    }
    table
}

fn diagnostic_text(category: DiagnosticCategory) -> &'static str {
    match category {
        DiagnosticCategory::RemoteBadMagic => "robot received a bad magic number",
        DiagnosticCategory::RemoteBadChecksum => "robot received a bad checksum",
        DiagnosticCategory::RemoteBadCommand => "robot received an unknown command",
        DiagnosticCategory::RemoteBadResponse => "robot received an unexpected response",
        DiagnosticCategory::Unrecognized => "robot reported an unrecognized error",
    }
}

/// Twenty-cell bar, one cell per centimeter, marker at the reading.
fn distance_gauge(mm: i32) -> String {
    let cm = (mm / 10).max(0);
    let mut bar = String::new();
    for i in 0..20 {
        if i < cm {
            bar.push('─');
        } else if i == cm {
            bar.push('┤');
        } else {
            bar.push(' ');
        }
    }
    if cm >= 20 {
        bar.push('⋯');
    }
    format!("{bar}\n0    5   10   15   20 cm")
}

struct PlainPresenter;

impl Present for PlainPresenter {
    fn event(&self, event: &Event) {
        match event {
            Event::Success => println!("command ok"),
            Event::Telemetry { params } => {
                println!("status report");
                println!("{}", telemetry_table(params, presets::ASCII_MARKDOWN));
            }
            Event::ColorDetected { r, g, b } => println!("detected color: {r},{g},{b}"),
            Event::TooClose => println!("notice: stopped, obstacle too close"),
            Event::DistanceDetected { mm } => {
                println!("detected distance: {}.{} cm", mm / 10, (mm % 10).abs())
            }
            Event::ErrorDiagnostic { category } => println!("error: {}", diagnostic_text(*category)),
            Event::TextMessage { text } => println!("message from robot: {text}"),
        }
    }

    fn controls(&self) {
        println!("\n{MENU}");
    }

    fn notice(&self, text: &str) {
        println!("{text}");
    }
}

struct FancyPresenter;

impl Present for FancyPresenter {
    fn event(&self, event: &Event) {
        match event {
            Event::Success => println!("\x1b[32m✔︎ \x1b[m\x1b[2mCommand OK\x1b[m"),
            Event::Telemetry { params } => {
                println!("\x1b[1m\x1b[36m🛜 Status Report\x1b[m");
                println!("{}", telemetry_table(params, presets::UTF8_FULL));
            }
            Event::ColorDetected { r, g, b } => {
                println!("\x1b[1m\x1b[32m🎨 Detected Color:\x1b[m");
                println!(" \x1b[38;2;{r};{g};{b}m██████\x1b[m {r:3},{g:3},{b:3}");
            }
            Event::TooClose => {
                println!("\x1b[1m\x1b[33m⚠️ Notice\x1b[m");
                println!("Stopped because the robot is getting too close!");
            }
            Event::DistanceDetected { mm } => {
                println!("{}", distance_gauge(*mm));
                println!(
                    "\x1b[1m\x1b[31m📏 Detected distance:\x1b[m {}.{} cm",
                    mm / 10,
                    (mm % 10).abs()
                );
            }
            Event::ErrorDiagnostic { category } => {
                println!("\x1b[31m✘ {}\x1b[m", diagnostic_text(*category));
            }
            Event::TextMessage { text } => {
                println!("\x1b[1m💬 Message from robot:\x1b[m {text}");
            }
        }
    }

    fn controls(&self) {
        println!("\n\x1b[1m\x1b[33m{MENU}\x1b[m");
    }

    fn notice(&self, text: &str) {
        println!("\x1b[35m{text}\x1b[m");
    }
}

struct JsonPresenter;

impl Present for JsonPresenter {
    fn event(&self, event: &Event) {
        println!(
            "{}",
            serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn controls(&self) {
        // Machine-readable mode: no menu chatter.
    }

    fn notice(&self, text: &str) {
        println!("{}", serde_json::json!({ "event": "notice", "text": text }));
    }
}
