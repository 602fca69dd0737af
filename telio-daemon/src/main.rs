//! Telio Daemon (teliod)
//!
//! Periodically samples the board's vehicle inputs and publishes the latest
//! snapshot as JSON for other services to read.
//!
//! # Startup
//! - Settings are loaded and validated before any hardware is touched
//! - The I/O scheme is detected once and kept for the life of the process
//! - The boot mask is read once, remapped and logged
//!
//! # Signals
//! SIGINT/SIGTERM stop the sampling loop after its current cycle.

mod sampler;

use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use telio_core::{
    load_settings, set_cached_settings, snapshot_to_json, validate_settings, BootMask,
    SchemeCache, SysfsChannelSource, TelioError, TelioSettings,
};

use crate::sampler::{run_sampling_loop, Sampler, SamplerState};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the log filter
const LOG_ENV: &str = "TELIO_LOG";

/// Present when systemd-journald is running
const JOURNALD_SOCKET: &str = "/run/systemd/journal/socket";

// ============================================================================
// Argument Parsing
// ============================================================================

#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    config: Option<PathBuf>,
    source: Option<PathBuf>,
    once: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run(Options),
    Help,
    Version,
}

fn parse_args<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    let mut options = Options::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-v" | "--version" => return Ok(Command::Version),
            "--once" => options.once = true,
            "-c" | "--config" => {
                let path = args.next().ok_or("--config requires a path argument")?;
                options.config = Some(PathBuf::from(path));
            }
            "-s" | "--source" => {
                let path = args.next().ok_or("--source requires a path argument")?;
                options.source = Some(PathBuf::from(path));
            }
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }

    Ok(Command::Run(options))
}

fn print_help() {
    eprintln!("teliod {} - Telio input sampling daemon", VERSION);
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    teliod [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -c, --config PATH   Settings file (default: $TELIO_CONFIG or /etc/telio/settings.json)");
    eprintln!("    -s, --source PATH   Channel source directory (overrides settings)");
    eprintln!("        --once          Take one sample, print it as JSON and exit");
    eprintln!("    -v, --version       Print version");
    eprintln!("    -h, --help          Print this help");
    eprintln!();
    eprintln!("ENVIRONMENT:");
    eprintln!("    TELIO_LOG           Log level (trace, debug, info, warn, error)");
}

// ============================================================================
// Logging
// ============================================================================

/// Initialize tracing, preferring the systemd journal. Returns true if journald is used.
fn init_logging(log_level: &str) -> bool {
    if Path::new(JOURNALD_SOCKET).exists() {
        match tracing_journald::layer() {
            Ok(journald_layer) => {
                use tracing_subscriber::prelude::*;
                tracing_subscriber::registry()
                    .with(journald_layer)
                    .with(tracing_subscriber::EnvFilter::new(log_level))
                    .init();
                return true;
            }
            Err(e) => {
                eprintln!("Failed to create journald layer: {}, falling back to stdout", e);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(log_level)
        .init();
    false
}

// ============================================================================
// Startup
// ============================================================================

fn load_validated_settings(options: &Options) -> anyhow::Result<TelioSettings> {
    let mut settings = load_settings(options.config.as_deref()).context("Failed to load settings")?;

    if let Some(source) = &options.source {
        settings.sampling.source_path = source.clone();
    }

    validate_settings(&settings).context("Invalid settings")?;
    set_cached_settings(&settings);
    Ok(settings)
}

fn read_boot_mask(source: &SysfsChannelSource, scheme: telio_core::Scheme) -> Option<BootMask> {
    match source.read_boot_mask() {
        Ok(raw) => {
            let mask = BootMask::from_raw(raw, scheme);
            info!(
                raw,
                ignition = mask.ignition,
                inputs = ?mask.inputs,
                wiggle = mask.wiggle,
                arm_lockup = mask.arm_lockup,
                watchdog = mask.watchdog,
                "Boot mask"
            );
            if mask.abnormal_reset() {
                warn!("Board came up after an abnormal reset");
            }
            Some(mask)
        }
        Err(TelioError::FileNotFound(path)) => {
            debug!(path = ?path, "Driver publishes no boot mask");
            None
        }
        Err(e) => {
            warn!(error = %e, "Boot mask unreadable");
            None
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let options = match parse_args(std::env::args().skip(1)) {
        Ok(Command::Run(options)) => options,
        Ok(Command::Help) => {
            print_help();
            return Ok(());
        }
        Ok(Command::Version) => {
            println!("teliod {}", VERSION);
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            std::process::exit(1);
        }
    };

    let log_level = std::env::var(LOG_ENV).unwrap_or_else(|_| "info".to_string());
    let use_journald = init_logging(&log_level);

    info!("STARTUP: teliod {} starting", VERSION);
    info!("STARTUP: Logging to {}", if use_journald { "systemd journal" } else { "stdout" });

    let settings = load_validated_settings(&options)?;

    let schemes = SchemeCache::new(settings.detection.clone());
    let scheme = schemes.get();

    let source = Arc::new(SysfsChannelSource::new(&settings.sampling.source_path));
    info!(scheme = %scheme, source = ?source.base(), "STARTUP: Sampling configured");

    let boot_mask = read_boot_mask(&source, scheme);
    let mut sampler = Sampler::new(Arc::clone(&source), scheme, &settings).with_boot_mask(boot_mask);
    let state = Arc::new(SamplerState::new(settings.sampling.poll_interval_ms));

    if options.once {
        let snapshot = sampler.sample_once().await;
        let Some((snapshot, in_window)) = sampler.process(snapshot, &state) else {
            bail!("No sample available from {:?}", source.base());
        };
        println!("{}", snapshot_to_json(&sampler.report(&snapshot, in_window))?);
        return Ok(());
    }

    let signal_state = Arc::clone(&state);
    if let Err(e) = ctrlc::set_handler(move || {
        info!("SIGNAL: Received SIGINT/SIGTERM - stopping");
        signal_state.stop();
    }) {
        warn!("Failed to set signal handler: {}. Shutdown via signals may not work cleanly.", e);
    }

    run_sampling_loop(sampler, state).await;

    info!("SHUTDOWN: teliod stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_defaults() {
        assert_eq!(parse_args(args(&[])), Ok(Command::Run(Options::default())));
    }

    #[test]
    fn test_parse_all_options() {
        let command = parse_args(args(&["-c", "/tmp/s.json", "--source", "/tmp/in", "--once"]));
        assert_eq!(
            command,
            Ok(Command::Run(Options {
                config: Some(PathBuf::from("/tmp/s.json")),
                source: Some(PathBuf::from("/tmp/in")),
                once: true,
            }))
        );
    }

    #[test]
    fn test_parse_help_and_version() {
        assert_eq!(parse_args(args(&["--once", "-h"])), Ok(Command::Help));
        assert_eq!(parse_args(args(&["--version"])), Ok(Command::Version));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(args(&["--config"])).is_err());
        assert!(parse_args(args(&["--bogus"])).is_err());
    }

    #[test]
    fn test_source_override_applied() {
        let dir = tempfile::TempDir::new().unwrap();
        let options = Options {
            config: Some(dir.path().join("absent.json")),
            source: Some(PathBuf::from("/srv/telio/inputs")),
            once: false,
        };
        let settings = load_validated_settings(&options).unwrap();
        assert_eq!(settings.sampling.source_path, PathBuf::from("/srv/telio/inputs"));
    }

    #[test]
    fn test_relative_source_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let options = Options {
            config: Some(dir.path().join("absent.json")),
            source: Some(PathBuf::from("relative/inputs")),
            once: false,
        };
        assert!(load_validated_settings(&options).is_err());
    }

    #[test]
    fn test_boot_mask_missing_or_garbled_is_none() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = SysfsChannelSource::new(dir.path());
        assert_eq!(read_boot_mask(&source, telio_core::Scheme::Mixed6), None);

        std::fs::write(dir.path().join("boot_mask"), "garbage").unwrap();
        assert_eq!(read_boot_mask(&source, telio_core::Scheme::Mixed6), None);
    }

    #[test]
    fn test_boot_mask_decoded_for_scheme() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("boot_mask"), "0x09").unwrap();
        let source = SysfsChannelSource::new(dir.path());

        let mask = read_boot_mask(&source, telio_core::Scheme::Digital9x7).unwrap();
        assert!(mask.ignition);
        assert!(mask.watchdog);
    }
}
