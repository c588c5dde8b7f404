// CLI binary entry point for oggdemux

mod cli;

use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    let config = cli::Config::parse();
    init_tracing(&config);

    if let Err(e) = cli::commands::run(&config) {
        eprintln!("✗ {:#}", e);
        process::exit(1);
    }
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins over flags.
fn init_tracing(config: &cli::Config) {
    let default_filter = if config.verbose {
        "oggdemux=debug"
    } else if config.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}
