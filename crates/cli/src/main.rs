// parcelink CLI - link contacts to county parcel and household records

mod exit_codes;
mod link;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use parcelink_matcher::LinkError;
use tracing_subscriber::EnvFilter;

use exit_codes::{EXIT_CONFIG_INVALID, EXIT_ERROR, EXIT_LOAD, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "plink")]
#[command(about = "Link contacts to county parcel and household records")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match every contact in a CSV file against the configured counties
    #[command(after_help = "\
Exit code 5 with --strict means at least one contact ended without a match \
(no_match, collection_not_found or insufficient_input).

Examples:
  plink run link.toml --contacts contacts.csv
  plink run link.toml --contacts contacts.csv --json
  plink run link.toml --contacts contacts.csv --output results.json
  PARCELINK_LOG=debug plink run link.toml --contacts contacts.csv --strict")]
    Run {
        /// Path to the link config (.toml)
        config: PathBuf,

        /// Contacts CSV to match
        #[arg(long, short = 'c')]
        contacts: PathBuf,

        /// Output JSON to stdout instead of only the human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Exit non-zero when any contact stays unmatched
        #[arg(long)]
        strict: bool,
    },

    /// Answer JSON-lines match requests on stdin, one response per line
    #[command(after_help = "\
Each input line is {\"contact\": {...}, \"county\": \"...\"}. Each output line is \
{\"property_ref\", \"demographic_ref\", \"method\", \"score\"}, or {\"line\", \"error\"} \
when the request cannot be parsed.

Examples:
  plink resolve link.toml < requests.jsonl
  echo '{\"contact\":{\"email\":\"jo@example.com\"},\"county\":\"belmont\"}' | plink resolve link.toml")]
    Resolve {
        /// Path to the link config (.toml)
        config: PathBuf,
    },

    /// Parse and validate a link config without loading data
    #[command(after_help = "\
Examples:
  plink validate link.toml")]
    Validate {
        /// Path to the link config (.toml)
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nmatcher: parcelink-matcher ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nmatcher: parcelink-matcher ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

/// Logs go to stderr so stdout stays a clean JSON contract.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("PARCELINK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Run { config, contacts, json, output, strict } => {
            link::cmd_run(config, contacts, json, output, strict)
        }
        Commands::Resolve { config } => link::cmd_resolve(config),
        Commands::Validate { config } => link::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<LinkError> for CliError {
    fn from(err: LinkError) -> Self {
        match &err {
            LinkError::ConfigParse(_) | LinkError::ConfigValidation(_) => {
                Self::new(EXIT_CONFIG_INVALID, err.to_string())
            }
            LinkError::MissingColumn { .. } => Self::new(EXIT_LOAD, err.to_string())
                .with_hint("map the column under [counties.<name>.*_columns] or [contacts.columns]"),
            LinkError::Csv { .. } | LinkError::Io(_) => Self::new(EXIT_LOAD, err.to_string()),
            LinkError::PartitionNotFound(_) => Self::new(EXIT_ERROR, err.to_string()),
        }
    }
}
