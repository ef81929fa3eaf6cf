use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use roverlink_session::{parse_intent, Intent, Receiver, Sender, SessionError};
use roverlink_transport::{SerialConfig, SerialStream};
use tracing::{info, warn};

use crate::exit::{session_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::presenter::presenter_for;
use crate::Cli;

pub fn run(cli: Cli) -> CliResult<i32> {
    let config = SerialConfig {
        baud_rate: cli.baud,
        data_bits: cli.data_bits.into(),
        parity: cli.parity.into(),
        stop_bits: cli.stop_bits.into(),
        ..SerialConfig::default()
    };

    // No transport, no session: open failure is fatal, no retry.
    let stream = SerialStream::open(&cli.device, &config)
        .map_err(|err| transport_error("open failed", err))?;

    if cli.settle > 0 {
        info!(seconds = cli.settle, "waiting for the controller to reboot");
        thread::sleep(Duration::from_secs(cli.settle));
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    install_ctrlc_handler(shutdown.clone())?;

    let reader = stream
        .try_clone()
        .map_err(|err| transport_error("clone failed", err))?;
    let presenter = presenter_for(cli.format);

    let receiver_thread = {
        let presenter = presenter.clone();
        let shutdown = shutdown.clone();
        thread::spawn(move || {
            Receiver::new(reader, shutdown).run(move |event| presenter.event(&event))
        })
    };

    let mut sender = Sender::new(stream);
    sender
        .send_hello()
        .map_err(|err| session_error("hello failed", err))?;

    let mut fatal: Option<CliError> = None;
    let stdin = std::io::stdin();
    let mut line = String::new();

    while !shutdown.load(Ordering::SeqCst) {
        presenter.controls();

        line.clear();
        let read = match stdin.lock().read_line(&mut line) {
            Ok(n) => n,
            Err(err) => {
                fatal = Some(CliError::new(INTERNAL, format!("stdin read failed: {err}")));
                break;
            }
        };
        if read == 0 {
            // EOF ends the session like an explicit quit.
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let intent = match parse_intent(&line) {
            Ok(intent) => intent,
            Err(err) => {
                presenter.notice(&err.to_string());
                continue;
            }
        };
        if intent == Intent::Quit {
            break;
        }

        let packet = match intent.into_packet() {
            Some(packet) => packet,
            None => continue,
        };
        if let Err(err) = sender.send(&packet) {
            warn!(error = %err, "send failed");
            presenter.notice(&format!("send failed: {err}"));
            if matches!(err, SessionError::ConnectionClosed) {
                fatal = Some(session_error("send failed", err));
                break;
            }
        }
    }

    info!("closing connection");
    shutdown.store(true, Ordering::SeqCst);

    let receiver_result = receiver_thread
        .join()
        .map_err(|_| CliError::new(INTERNAL, "receiver thread panicked"))?;

    if let Some(err) = fatal {
        return Err(err);
    }
    receiver_result.map_err(|err| session_error("receiver failed", err))?;
    Ok(SUCCESS)
}

fn install_ctrlc_handler(shutdown: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        shutdown.store(true, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
