//! rulegate CLI tool.
//!
//! Usage:
//! ```bash
//! rulegate check [OPTIONS] [PATHS]...
//! rulegate list-rules
//! rulegate init
//! ```
//!
//! Exit codes: `0` pass, `1` policy failure, `2` usage or startup error.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rulegate_core::{EngineError, Severity};
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Exit code for usage and startup errors.
const EXIT_STARTUP_ERROR: u8 = 2;

/// Rule-based static analysis for source trees
#[derive(Parser)]
#[command(name = "rulegate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "RULEGATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run rules over files and decide pass/fail
    Check(commands::check::CheckArgs),

    /// List available rules and presets
    ListRules {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-finding compact format.
    Compact,
}

/// Severity names accepted by `--fail-on`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum SeverityArg {
    /// Informational findings.
    Info,
    /// Warnings.
    Warning,
    /// Errors.
    Error,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Info => Self::Info,
            SeverityArg::Warning => Self::Warning,
            SeverityArg::Error => Self::Error,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so JSON on stdout stays machine-readable.
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Check(args) => commands::check::run(&args, cli.config.as_deref()),
        Commands::ListRules { format } => commands::list_rules::run(format),
        Commands::Init { force } => commands::init::run(force),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            report_startup_error(&err);
            ExitCode::from(EXIT_STARTUP_ERROR)
        }
    }
}

/// Prints a startup failure; rule definition problems get a full diagnostic.
fn report_startup_error(err: &anyhow::Error) {
    let definition = err.chain().find_map(|cause| match cause.downcast_ref::<EngineError>() {
        Some(EngineError::Definition(e)) => Some(e.clone()),
        _ => cause.downcast_ref::<rulegate_core::RuleDefinitionError>().cloned(),
    });

    match definition {
        Some(e) => eprintln!("{:?}", miette::Report::new(e)),
        None => eprintln!("error: {err:#}"),
    }
}
