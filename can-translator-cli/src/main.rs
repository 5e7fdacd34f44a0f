//! CAN Translator CLI Application
//!
//! Command-line front end for the can-translator library:
//! - Loads a vehicle configuration (TOML, optionally with DBC files)
//! - Replays a candump trace and prints the translated vehicle messages
//! - Sends inbound commands and logs the frames they produce

use anyhow::{bail, Context, Result};
use can_translator::Translator;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

mod config;
mod output;
mod trace;

use config::{AppConfig, OutputFormat};
use output::{CandumpWriter, LineListener};

/// CAN Translator - Turn raw CAN traffic into vehicle events
#[derive(Parser, Debug)]
#[command(name = "can-translator-cli")]
#[command(about = "Translate CAN traces into normalized vehicle messages", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the vehicle configuration (vehicle.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// candump trace to translate ("-" for stdin)
    #[arg(short, long, value_name = "FILE")]
    trace: Option<PathBuf>,

    /// Additional DBC file(s) (can be repeated)
    #[arg(long, value_name = "FILE")]
    dbc: Vec<PathBuf>,

    /// Command to send after the trace, as NAME=JSON (can be repeated)
    #[arg(long, value_name = "NAME=VALUE")]
    command: Vec<String>,

    /// Output file for vehicle messages (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output file for transmitted frames (default: stdout)
    #[arg(long, value_name = "FILE")]
    tx_log: Option<PathBuf>,

    /// Output format, overriding the configuration
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Maximum number of frames to translate
    #[arg(long, value_name = "COUNT")]
    max_frames: Option<usize>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Json,
    Txt,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Txt => OutputFormat::Txt,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("CAN Translator CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using translator library v{}", can_translator::VERSION);

    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None if !args.dbc.is_empty() => AppConfig::default(),
        None => bail!("No vehicle configuration given; use --config vehicle.toml (see --help)"),
    };
    config.vehicle.dbc_files.extend(args.dbc.iter().cloned());
    if let Some(format) = args.format {
        config.output.format = format.into();
    }

    let mut translator =
        Translator::from_config(&config.vehicle).context("Failed to build signal table")?;
    let stats = translator.table_stats();
    log::info!(
        "Signal table: {} signals, {} messages, {} writable",
        stats.num_signals,
        stats.num_messages,
        stats.num_writable
    );

    if let Some(trace_path) = &args.trace {
        translate_trace(&mut translator, trace_path, &args, &config)?;
    }

    if !args.command.is_empty() {
        send_commands(&mut translator, &args)?;
    }

    Ok(())
}

fn open_output(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {:?}", path))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

/// Replay a trace through the translator
fn translate_trace(translator: &mut Translator, path: &PathBuf, args: &Args, config: &AppConfig) -> Result<()> {
    let reader: Box<dyn io::BufRead> = if path.as_os_str() == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open trace {:?}", path))?,
        ))
    };

    let mut listener = LineListener::new(open_output(args.output.as_ref())?, config.output.format);
    let mut frames = 0usize;

    for frame in trace::read_frames(reader) {
        if args.max_frames.is_some_and(|max| frames >= max) {
            log::info!("Reached frame limit ({})", frames);
            break;
        }

        let frame = frame?;
        if config.output.include_timestamps {
            listener.timestamp = Some(frame.timestamp());
        }
        translator.process_frame(&frame, &mut listener);
        frames += 1;
    }

    listener.flush()?;
    log::info!("Translated {} frames into {} messages", frames, listener.published);
    if listener.failed > 0 {
        bail!("{} messages could not be written", listener.failed);
    }

    let totals = translator.accumulators();
    log::debug!(
        "Totals since restart: distance {}, fuel {} L, rotations {}",
        totals.distance_since_restart,
        totals.fuel_consumed_since_restart_liters,
        totals.rotations_since_restart
    );
    Ok(())
}

/// Parse `NAME=VALUE`; VALUE is JSON, or a bare string
fn parse_command(command: &str) -> Result<(String, serde_json::Value)> {
    let (name, value) = command
        .split_once('=')
        .with_context(|| format!("Command must be NAME=VALUE: {}", command))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((name.trim().to_string(), value))
}

fn send_commands(translator: &mut Translator, args: &Args) -> Result<()> {
    let mut bus = CandumpWriter::new(open_output(args.tx_log.as_ref())?);
    let mut failures = 0;

    for command in &args.command {
        let (name, value) = parse_command(command)?;
        if translator.handle_command(&name, &value, &mut bus) {
            log::info!("Sent command {} = {}", name, value);
        } else {
            log::error!("Command {} = {} failed", name, value);
            failures += 1;
        }
    }

    if failures > 0 {
        bail!("{} of {} commands failed", failures, args.command.len());
    }
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
