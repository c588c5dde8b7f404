// CLI module for oggdemux
//
// Each subcommand walks a file with `OggReader` through one of the library's
// inspection or rewrite passes and hands the result to `OutputFormatter`.

pub mod commands;
pub mod config;
pub mod output;

pub use config::{Commands, Config};
pub use output::{OutputFormat, OutputFormatter};
