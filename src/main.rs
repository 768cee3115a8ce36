use clap::{Parser, Subcommand};
use pmap_serial::config::{Config, ConfigLoader};
use pmap_serial::port::default_scanner;
use pmap_serial::{logging, Reporter, SerialTransport, TransportError};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Serial link tool for PMAP mechacon work.",
    long_about = "Lists candidate serial devices, probes a device with the fixed 57600 8-N-1 link settings, and exchanges single commands with a connected mechacon."
)]
struct Args {
    /// Configuration file (overrides the normal search order).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Mirror all narration into a timestamped transcript file.
    #[arg(short, long, global = true)]
    debug_log: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List candidate serial devices.
    List,

    /// Open a device with the link settings, then close it again.
    Probe {
        /// Device path or alias (defaults to `serial.device`).
        device: Option<String>,
    },

    /// Send one line and print the reply.
    Send {
        /// Text to send; a carriage return is appended.
        text: String,

        /// Device path or alias (defaults to `serial.device`).
        #[arg(long)]
        device: Option<String>,

        /// Receive timeout in milliseconds (defaults to `serial.rx_timeout_ms`).
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Largest reply to accept.
        #[arg(long, default_value_t = 256)]
        read_bytes: usize,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] pmap_serial::ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("no device given and serial.device is not configured")]
    NoDevice,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, CliError> {
    let loader = match path {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    Ok(loader.into_config())
}

fn resolve_device(config: &Config, device: Option<String>) -> Result<String, CliError> {
    device
        .or_else(|| config.serial.device.clone())
        .map(|d| config.serial.resolve_device(&d))
        .ok_or(CliError::NoDevice)
}

fn run(args: Args, config: &Config, reporter: &Reporter) -> Result<(), CliError> {
    let mut link = SerialTransport::new(reporter.clone())
        .with_default_timeout(config.serial.rx_timeout());

    match args.command {
        Command::List => {
            let scanner = default_scanner();
            reporter.report(scanner.describe());
            for device in scanner.scan() {
                reporter.report(device);
            }
        }
        Command::Probe { device } => {
            let device = resolve_device(config, device)?;
            link.open(&device)?;
            link.close();
        }
        Command::Send {
            text,
            device,
            timeout_ms,
            read_bytes,
        } => {
            let device = resolve_device(config, device)?;
            link.open(&device)?;
            if let Some(ms) = timeout_ms {
                link.set_receive_timeout(Duration::from_millis(ms));
            }

            let result = exchange(&mut link, &text, read_bytes);
            link.close();
            let reply = result?;
            reporter.report(format!("Reply: {}", String::from_utf8_lossy(&reply).trim_end()));
        }
    }
    Ok(())
}

fn exchange(link: &mut SerialTransport, text: &str, read_bytes: usize) -> Result<Vec<u8>, CliError> {
    link.write(format!("{text}\r"))?;
    let mut reply = vec![0u8; read_bytes.max(1)];
    let n = link.read_default(&mut reply)?;
    reply.truncate(n);
    Ok(reply)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(args.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init_tracing(&config.logging);

    let reporter = Reporter::new();
    reporter.set_transcript_naming(config.logging.transcript_naming());
    if args.debug_log || config.logging.debug_transcript {
        if reporter.init_debug_sink().is_none() {
            eprintln!("Warning: could not create debug transcript, continuing without it");
        }
    }

    let outcome = run(args, &config, &reporter);
    reporter.deinit_debug_sink();

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
