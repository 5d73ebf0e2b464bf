//! CLI definitions for pagetrace.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use pagetrace_relay_native::OutputFormat;

/// pagetrace CLI.
#[derive(Parser)]
#[command(name = "pagetrace")]
#[command(about = "Record user interactions on a page as native-messaging envelopes")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Load a page, play an interaction script on it and write the captured records
    Record {
        /// Page fixture (JSON)
        #[arg(long)]
        page: PathBuf,

        /// Interaction script (JSON)
        #[arg(long)]
        script: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output framing
        #[arg(long, value_enum, default_value_t = Format::Native)]
        format: Format,
    },

    /// Print a summary of every message in a native-messaging stream
    Decode {
        /// Framed input file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Validate the configuration file
    CheckConfig,
}

/// Output framing for `record`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    /// Length-prefixed frames
    Native,
    /// One JSON object per line
    Jsonl,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Native => OutputFormat::Native,
            Format::Jsonl => OutputFormat::JsonLines,
        }
    }
}
