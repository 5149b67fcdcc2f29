//! # Tactile Bridge
//!
//! Connects the frame producer, the tablet pointer driver and the haptic
//! driver. Interrupt (`Ctrl-C`) writes a snapshot of the current frame
//! instead of exiting.
//!
//! ## Usage
//!
//! ```bash
//! tactile_bridge /tmp/pgm /tmp/pnt /tmp/haptic --snapshot /tmp/scope.pgm
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use tactile_bridge::{ChannelPaths, PipelineSupervisor};
use tactile_core::BridgeConfig;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage: tactile_bridge [OPTIONS] <FRAMES> <POINTER> <HAPTIC>

Arguments:
  <FRAMES>             Frame input FIFO (created if absent)
  <POINTER>            Pointer input FIFO (created if absent)
  <HAPTIC>             Haptic output FIFO (created if absent)

Options:
  -c, --config <PATH>    TOML config file (default: built-in deployment values)
  -s, --snapshot <PATH>  Snapshot file written on interrupt (default: image.pgm)
  -d, --debug            Trace every frame and every pointer sample
  -h, --help             Show this help";

struct Args {
    paths: ChannelPaths,
    config: Option<PathBuf>,
    snapshot: Option<PathBuf>,
    debug: bool,
}

enum Parsed {
    Run(Args),
    Help,
}

fn parse_args(args: &[String]) -> Result<Parsed, String> {
    let mut positional = Vec::with_capacity(3);
    let mut config = None;
    let mut snapshot = None;
    let mut debug = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                let value = args.get(i).ok_or("--config needs a path")?;
                config = Some(PathBuf::from(value));
            }
            "--snapshot" | "-s" => {
                i += 1;
                let value = args.get(i).ok_or("--snapshot needs a path")?;
                snapshot = Some(PathBuf::from(value));
            }
            "--debug" | "-d" => debug = true,
            "--help" | "-h" => return Ok(Parsed::Help),
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(format!("unknown option {flag}"));
            }
            path => positional.push(PathBuf::from(path)),
        }
        i += 1;
    }

    let [frames, pointer, haptic]: [PathBuf; 3] = positional
        .try_into()
        .map_err(|got: Vec<PathBuf>| format!("expected 3 channel paths, got {}", got.len()))?;

    Ok(Parsed::Run(Args {
        paths: ChannelPaths::new(frames, pointer, haptic),
        config,
        snapshot,
        debug,
    }))
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("info,tactile_bridge=debug,tactile_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .init();
}

fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args().collect();
    let args = match parse_args(&argv) {
        Ok(Parsed::Run(args)) => args,
        Ok(Parsed::Help) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("error: {message}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    init_logging(args.debug);

    let mut config = match args.config.as_deref().map(BridgeConfig::load).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::from(2);
        }
    };
    if let Some(path) = args.snapshot {
        config.snapshot.path = path;
    }

    tracing::info!(
        frames = %args.paths.frames.display(),
        pointer = %args.paths.pointer.display(),
        haptic = %args.paths.haptic.display(),
        "tactile bridge starting"
    );

    match PipelineSupervisor::new(config).run(&args.paths) {
        Ok(never) => match never {},
        Err(e) => {
            tracing::error!(error = %e, "bridge failed to start");
            ExitCode::from(e.exit_code())
        }
    }
}
