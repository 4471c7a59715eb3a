//! CLI entry point for the Z16 simulator binary.

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

#[cfg(test)]
use tempfile as _;
use thiserror::Error;
use z16_core::{load_image_file, run, CoreConfig, CoreState, LoadError, RunOutcome, SimError};

mod host;

use host::{ConsoleWriter, TraceWriter};

const USAGE_TEXT: &str = "\
Usage: z16sim <image>

Loads a raw Z16 binary image at address 0 and runs it from PC 0,
printing one line per executed instruction.

Options:
  -h, --help  Show this help message

Environment:
  RUST_LOG    Diagnostic log filter (default: warn)
";

#[derive(Debug, PartialEq, Eq)]
enum ParseResult {
    Run(PathBuf),
    Help,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Fault(#[from] SimError),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl CliError {
    const fn exit_code(&self) -> i32 {
        match self {
            Self::Fault(_) => 2,
            Self::Usage(_) | Self::Load(_) | Self::Output(_) => 1,
        }
    }
}

fn parse_args(args: impl Iterator<Item = OsString>) -> Result<ParseResult, CliError> {
    let mut image: Option<PathBuf> = None;

    for arg in args {
        if arg == "--help" || arg == "-h" {
            return Ok(ParseResult::Help);
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(CliError::Usage(format!(
                "unknown option: {}",
                arg.to_string_lossy()
            )));
        }

        if image.is_some() {
            return Err(CliError::Usage("multiple image paths provided".to_string()));
        }
        image = Some(PathBuf::from(arg));
    }

    image
        .map(ParseResult::Run)
        .ok_or_else(|| CliError::Usage("missing image path".to_string()))
}

fn run_image(path: &Path) -> Result<RunOutcome, CliError> {
    let mut state = CoreState::default();
    let loaded = load_image_file(path, &mut state)?;
    println!("Loaded {loaded} bytes into memory");

    let mut trace = TraceWriter::new(io::stdout());
    let mut console = ConsoleWriter::new(io::stdout());
    let result = run(
        &mut state,
        &mut console,
        &mut trace,
        &CoreConfig::default(),
    );

    let warnings = state.diag.warning_count();
    if warnings > 0 {
        log::warn!(
            "{warnings} unimplemented instruction(s) skipped, last at 0x{:04X}",
            state.diag.last_unimplemented_pc.unwrap_or_default()
        );
    }

    let (_, trace_error) = trace.finish();
    let (_, console_error) = console.finish();
    if let Some(error) = trace_error.or(console_error) {
        return Err(CliError::Output(error));
    }

    result.map_err(CliError::from)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Run(path)) => match run_image(&path) {
            Ok(outcome) => {
                log::info!("{:?} after {} steps", outcome.reason, outcome.steps);
                0
            }
            Err(error) => {
                eprintln!("error: {error}");
                error.exit_code()
            }
        },
        Err(error) => {
            eprintln!("error: {error}");
            eprintln!("{USAGE_TEXT}");
            error.exit_code()
        }
    };

    std::process::exit(exit_code);
}
