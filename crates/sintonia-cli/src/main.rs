//! Sintonia CLI - scan the FM band, or play a raw-IQ capture.
//!
//! With a tunable front-end the tool walks the broadcast band and prints
//! one `frequency<TAB>name` line per station found. With
//! `-d driver=file,path=capture.iq` it demodulates the capture instead and
//! writes the 44.1 kHz stereo PCM to stdout (`s16le` interleaved, ready
//! for `aplay` or `ffplay`).

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use sintonia_radio::{Event, Receiver, SCAN_BEGIN, SCAN_END, SCAN_SKIP};
use thiserror::Error;

#[derive(Parser)]
#[command(name = "sintonia", about = "FM band scanner", disable_version_flag = true)]
struct Cli {
    /// Device arguments, e.g. "driver=rtlsdr" or "driver=file,path=capture.iq"
    #[arg(short = 'd', long = "device")]
    device: Option<String>,

    /// Suppress all log output
    #[arg(short, long)]
    quiet: bool,

    /// Log level: 0 = error, 1 = warn, 2 = info, 3 = debug, 4 = trace
    #[arg(short = 'l', long = "log-level")]
    log_level: Option<u8>,

    /// Print the version and exit
    #[arg(short = 'v', long = "version")]
    version: bool,
}

/// A `key=value,key=value` device argument string, parsed.
#[derive(Debug, Default)]
struct DeviceArgs {
    driver: String,
    path: Option<String>,
}

#[derive(Debug, Error)]
enum DeviceArgsError {
    #[error("malformed device argument '{0}' (expected key=value)")]
    Malformed(String),
    #[error("device arguments name no driver")]
    NoDriver,
    #[error("driver=file needs a path argument")]
    NoPath,
    #[error("no binding available for driver '{0}'")]
    NoBinding(String),
}

fn parse_device_args(args: &str) -> Result<DeviceArgs, DeviceArgsError> {
    let mut parsed = DeviceArgs::default();
    for part in args.split(',').filter(|p| !p.is_empty()) {
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| DeviceArgsError::Malformed(part.to_string()))?;
        match key {
            "driver" => parsed.driver = value.to_string(),
            "path" => parsed.path = Some(value.to_string()),
            _ => tracing::debug!(key, value, "ignoring device argument"),
        }
    }
    if parsed.driver.is_empty() {
        return Err(DeviceArgsError::NoDriver);
    }
    Ok(parsed)
}

fn open_radio(args: &DeviceArgs) -> anyhow::Result<(Receiver, bool)> {
    if args.driver == "file" {
        let path = args.path.as_ref().ok_or(DeviceArgsError::NoPath)?;
        let radio = Receiver::open_iq(path.as_ref())?;
        return Ok((radio, true));
    }
    // Hardware bindings (SoapySDR and friends) live out of tree; a driver
    // we cannot construct here is an open failure, same as a missing
    // device.
    Err(DeviceArgsError::NoBinding(args.driver.clone()).into())
}

fn init_logging(cli: &Cli) {
    use tracing_subscriber::EnvFilter;

    let filter = if cli.quiet {
        EnvFilter::new("off")
    } else {
        match cli.log_level {
            Some(0) => EnvFilter::new("error"),
            Some(1) | None => EnvFilter::new("warn"),
            Some(2) => EnvFilter::new("info"),
            Some(3) => EnvFilter::new("debug"),
            Some(_) => EnvFilter::new("trace"),
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_scan(radio: &Receiver, running: &AtomicBool) -> anyhow::Result<()> {
    let mut freq = SCAN_BEGIN;
    while running.load(Ordering::SeqCst) && freq <= SCAN_END {
        match radio.scan(freq, SCAN_END, SCAN_SKIP)? {
            Some(hit) => {
                println!("{:.0}\t{}", hit.frequency, hit.name.as_deref().unwrap_or(""));
                freq = hit.frequency + SCAN_SKIP;
            }
            None => break,
        }
    }
    Ok(())
}

fn run_playback(radio: &Receiver, running: &AtomicBool) -> anyhow::Result<()> {
    radio.set_event_callback(Some(Box::new(|event| {
        if let Event::Audio { samples, .. } = event {
            let mut out = std::io::stdout().lock();
            for s in *samples {
                let _ = out.write_all(&s.to_le_bytes());
            }
        }
    })))?;
    radio.start()?;
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(std::time::Duration::from_millis(100));
    }
    radio.stop()?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        eprintln!("sintonia {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::FAILURE;
    }

    init_logging(&cli);

    let args = match parse_device_args(cli.device.as_deref().unwrap_or("")) {
        Ok(args) => args,
        Err(err) => {
            tracing::error!(%err, "bad device arguments");
            return ExitCode::FAILURE;
        }
    };

    let (mut radio, playback) = match open_radio(&args) {
        Ok(opened) => opened,
        Err(err) => {
            tracing::error!(%err, "open device failed");
            return ExitCode::FAILURE;
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        if let Err(err) = ctrlc::set_handler(move || running.store(false, Ordering::SeqCst)) {
            tracing::warn!(%err, "could not install signal handler");
        }
    }

    let result = if playback {
        run_playback(&radio, &running)
    } else {
        run_scan(&radio, &running)
    };
    radio.close();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "receiver failed");
            ExitCode::FAILURE
        }
    }
}
