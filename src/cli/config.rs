// CLI configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use oggdemux::ogg::DEFAULT_MAX_PAGES;
use oggdemux::ReaderOptions;

use crate::cli::OutputFormat;

/// oggdemux - Ogg Vorbis inspection tool
#[derive(Parser, Debug)]
#[command(name = "oggdemux")]
#[command(about = "Inspect and patch Ogg Vorbis files page by page", long_about = None)]
#[command(version)]
pub struct Config {
    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub format: OutputFormat,

    /// Quiet mode (suppress progress messages)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging of pages and packets)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Give up after this many pages
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES, global = true)]
    pub max_pages: usize,

    /// Fail on gaps in page sequence numbers
    #[arg(long, global = true)]
    pub check_sequence: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode every page and packet and summarize each logical stream
    Parse {
        /// Ogg file path(s)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },

    /// Print vendor string and comments
    Comments {
        /// Ogg file path(s)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Only print the value of this comment field
        #[arg(long)]
        field: Option<String>,
    },

    /// Print the duration of each logical stream in seconds
    Duration {
        /// Ogg file path(s)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },

    /// Dump pages and packets as a directory tree of marker files
    Tree {
        /// Ogg file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Remove a non-empty output directory first
        #[arg(long)]
        force: bool,
    },

    /// Rewrite the sample rate in the identification header
    RewriteRate {
        /// Source Ogg file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Destination file, or - for stdout
        #[arg(value_name = "OUTPUT")]
        output: String,

        /// Factor applied to the sample rate
        #[arg(short, long, default_value_t = 2.0)]
        multiplier: f64,
    },

    /// Fully parse every file matching a pattern
    Batch {
        /// Directory path
        #[arg(short, long)]
        directory: String,

        /// File pattern (e.g., "*.ogg")
        #[arg(short, long)]
        pattern: String,
    },
}

impl Config {
    pub fn reader_options(&self) -> ReaderOptions {
        ReaderOptions {
            max_pages: self.max_pages,
            check_sequence: self.check_sequence,
        }
    }
}
