//! GPR trace tap
//!
//! Connects to a Zond-12e, streams traces into a sliding window, and either
//! prints a fixed number of trace summaries (batch mode) or runs until the
//! device goes away, logging throughput. Renderers and broadcasters use the
//! same `Session` API this tool does.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gpr_stream::{
    config::DeviceConfig,
    constants::*,
    error::Error,
    session::{start_session, Session},
};

#[derive(Parser, Debug)]
#[command(name = "gpr-tap", about = "Stream raw traces from a Cobra Zond-12e over TCP")]
struct Args {
    /// Device hostname or IP
    #[arg(long)]
    host: String,

    /// Device TCP port [default: 23]
    #[arg(long)]
    port: Option<u16>,

    /// Samples per trace (128/256/512/1024; other values fall back to 512)
    /// [default: 512]
    #[arg(long)]
    quantity: Option<u16>,

    /// Time range in ns (25/50/100/200/300/2000; other values fall back to
    /// 50) [default: 100]
    #[arg(long)]
    range: Option<u16>,

    /// Sliding-window capacity in traces [default: 700]
    #[arg(long)]
    window: Option<usize>,

    /// Fetch a fixed number of traces and exit (batch mode)
    #[arg(long)]
    traces: Option<u64>,

    /// Optional TOML config file; CLI flags override it
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    /// Precedence: explicit flag, then config file, then crate default.
    /// Flags carry no clap defaults, so an unset flag never clobbers a
    /// file-supplied value.
    fn into_config(self) -> Result<DeviceConfig> {
        let mut config = match &self.config {
            Some(path) => DeviceConfig::from_file(path)?,
            None => DeviceConfig::default(),
        };
        config.host = self.host;
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(quantity) = self.quantity {
            config.sample_quantity = quantity;
        }
        if let Some(range) = self.range {
            config.time_range_ns = range;
        }
        if let Some(window) = self.window {
            config.window_capacity = window;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let batch = args.traces;

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("gpr-tap: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("connecting to {}:{}", config.host, config.port);
    let session = match start_session(&config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("gpr-tap: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        "streaming: {} samples/trace, {} ns range, window {}",
        session.quantity().as_u16(),
        session.time_range().as_ns(),
        config.window_capacity
    );

    match batch {
        Some(count) => run_batch(session, count),
        None => run_stream(session),
    }
}

/// Print one summary line per observed frame until `count` traces arrived.
fn run_batch(mut session: Session, count: u64) -> ExitCode {
    while session.traces_read() < count {
        if let Some(frame) = session.take_frame() {
            if let Some(newest) = frame.columns.last() {
                let head = &newest.samples[..newest.len().min(5)];
                let tail = &newest.samples[newest.len().saturating_sub(5)..];
                println!(
                    "trace {:>6}: {} samples  {:?} … {:?}",
                    frame.sequence,
                    newest.len(),
                    head,
                    tail
                );
            }
        } else if let Some(e) = stream_fault(&session) {
            tracing::warn!("stream ended early: {}", e);
            break;
        } else {
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    session.stop();
    ExitCode::SUCCESS
}

/// Stream until the device goes away, logging throughput once a second.
fn run_stream(mut session: Session) -> ExitCode {
    let mut last_report = Instant::now();
    let mut last_count = 0u64;

    loop {
        if let Some(e) = stream_fault(&session) {
            tracing::warn!("stream ended: {}", e);
            break;
        }

        if last_report.elapsed() >= Duration::from_secs(1) {
            let stats = session.stats();
            tracing::info!(
                "{} traces ({}/s), window {}/{}, {} frames dropped",
                stats.traces_read,
                stats.traces_read - last_count,
                stats.window.len,
                stats.window.capacity,
                stats.frames_dropped
            );
            last_count = stats.traces_read;
            last_report = Instant::now();
        }

        std::thread::sleep(Duration::from_millis(50));
    }

    session.stop();
    ExitCode::SUCCESS
}

/// A stopped pump in mid-stream is reported but exits cleanly; the
/// connection and handshake path already failed hard before this point.
fn stream_fault(session: &Session) -> Option<Error> {
    if session.is_running() {
        None
    } else {
        session
            .take_error()
            .or(Some(Error::Stream(gpr_stream::error::StreamError::SocketClosed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("gpr-tap-{}-{}.toml", name, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn parse(argv: &[&str]) -> Args {
        Args::parse_from(argv)
    }

    #[test]
    fn test_flags_default_from_crate_constants() {
        let config = parse(&["gpr-tap", "--host", "192.168.0.10"])
            .into_config()
            .unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.sample_quantity, DEFAULT_SAMPLE_QUANTITY);
        assert_eq!(config.time_range_ns, DEFAULT_TIME_RANGE_NS);
        assert_eq!(config.window_capacity, DEFAULT_WINDOW_CAPACITY);
    }

    #[test]
    fn test_config_file_values_survive_unset_flags() {
        let path = write_config("file-wins", "port = 8080\nsample_quantity = 1024\n");
        let config = parse(&[
            "gpr-tap",
            "--host",
            "1.2.3.4",
            "--config",
            path.to_str().unwrap(),
        ])
        .into_config()
        .unwrap();
        let _ = std::fs::remove_file(&path);

        // Unset flags must not clobber the file with their defaults.
        assert_eq!(config.port, 8080);
        assert_eq!(config.sample_quantity, 1024);
        // Untouched by both file and flags: crate default.
        assert_eq!(config.time_range_ns, DEFAULT_TIME_RANGE_NS);
    }

    #[test]
    fn test_explicit_flag_overrides_config_file() {
        let path = write_config("flag-wins", "port = 8080\nwindow_capacity = 50\n");
        let config = parse(&[
            "gpr-tap",
            "--host",
            "1.2.3.4",
            "--port",
            "2023",
            "--config",
            path.to_str().unwrap(),
        ])
        .into_config()
        .unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(config.port, 2023);
        assert_eq!(config.window_capacity, 50);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args = parse(&[
            "gpr-tap",
            "--host",
            "1.2.3.4",
            "--config",
            Path::new("/nonexistent/gpr-tap.toml").to_str().unwrap(),
        ]);
        assert!(args.into_config().is_err());
    }
}
