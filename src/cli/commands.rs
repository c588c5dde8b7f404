// CLI command implementations

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use glob::glob;
use serde::Serialize;
use serde_json::Value;

use oggdemux::{inspect, rewrite, OggReader, ReaderOptions};

use crate::cli::{Commands, Config, OutputFormatter};

/// Dispatch the parsed command line
pub fn run(config: &Config) -> Result<()> {
    let formatter = OutputFormatter::new(config.format.clone(), config.quiet);
    let options = config.reader_options();

    match &config.command {
        Commands::Parse { files } => command_parse(files, &options, &formatter),
        Commands::Comments { files, field } => {
            command_comments(files, field.as_deref(), &options, &formatter)
        }
        Commands::Duration { files } => command_duration(files, &options, &formatter),
        Commands::Tree {
            file,
            output,
            force,
        } => command_tree(file, output, *force, &options, &formatter),
        Commands::RewriteRate {
            input,
            output,
            multiplier,
        } => command_rewrite_rate(input, output, *multiplier, &options, &formatter),
        Commands::Batch { directory, pattern } => {
            command_batch(directory, pattern, &options, &formatter)
        }
    }
}

fn open(path: &Path, options: &ReaderOptions) -> Result<OggReader<BufReader<File>>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(OggReader::with_options(BufReader::new(file), options.clone()))
}

/// Serialize `items` as records tagged with the file they came from
fn records<T: Serialize>(path: &Path, items: &[T]) -> Result<Vec<Value>> {
    items
        .iter()
        .map(|item| {
            let mut value = serde_json::to_value(item)?;
            if let Some(obj) = value.as_object_mut() {
                obj.insert("file".to_string(), Value::String(path.display().to_string()));
            }
            Ok(value)
        })
        .collect()
}

/// Run `pass` over every file, printing per-file errors and failing at the end
/// if any file failed
fn for_each_file<F>(files: &[PathBuf], formatter: &OutputFormatter, mut pass: F) -> Result<()>
where
    F: FnMut(&Path) -> Result<Vec<Value>>,
{
    let mut output = Vec::new();
    let mut failures = 0;

    for path in files {
        match pass(path) {
            Ok(mut found) => output.append(&mut found),
            Err(e) => {
                formatter.print_error(&format!("{}: {:#}", path.display(), e));
                failures += 1;
            }
        }
    }

    let stdout = io::stdout();
    formatter.output_records(&output, &mut stdout.lock())?;

    if failures > 0 {
        bail!("{} of {} file(s) could not be read", failures, files.len());
    }
    Ok(())
}

/// Full parse summary per stream
fn command_parse(files: &[PathBuf], options: &ReaderOptions, formatter: &OutputFormatter) -> Result<()> {
    for_each_file(files, formatter, |path| {
        let mut reader = open(path, options)?;
        let summaries = inspect::parse_fully(&mut reader)?;
        records(path, &summaries)
    })
}

/// Vendor and comments per stream, or a single field
fn command_comments(
    files: &[PathBuf],
    field: Option<&str>,
    options: &ReaderOptions,
    formatter: &OutputFormatter,
) -> Result<()> {
    for_each_file(files, formatter, |path| {
        let mut reader = open(path, options)?;
        let comments = inspect::read_comments(&mut reader)?;
        match field {
            Some(field) => {
                let values: Vec<Value> = comments
                    .iter()
                    .map(|stream| {
                        serde_json::json!({
                            "serial": stream.serial,
                            "field": field,
                            "value": stream.header.get(field),
                        })
                    })
                    .collect();
                records(path, &values)
            }
            None => records(path, &comments),
        }
    })
}

/// Duration per stream
fn command_duration(files: &[PathBuf], options: &ReaderOptions, formatter: &OutputFormatter) -> Result<()> {
    for_each_file(files, formatter, |path| {
        let mut reader = open(path, options)?;
        let durations = inspect::read_durations(&mut reader)?;
        records(path, &durations)
    })
}

/// Page/packet directory dump
fn command_tree(
    file: &Path,
    output: &Path,
    force: bool,
    options: &ReaderOptions,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut reader = open(file, options)?;
    inspect::prepare_output_dir(output, force)
        .with_context(|| format!("cannot use {} as output directory", output.display()))?;
    let summary = inspect::write_page_tree(&mut reader, output)
        .with_context(|| format!("failed to dump {}", file.display()))?;

    formatter.print_success(&format!(
        "Wrote {} pages and {} packets to {}",
        summary.pages,
        summary.packets,
        output.display()
    ));
    Ok(())
}

/// Sample-rate rewrite to a file or stdout
fn command_rewrite_rate(
    input: &Path,
    output: &str,
    multiplier: f64,
    options: &ReaderOptions,
    formatter: &OutputFormatter,
) -> Result<()> {
    if !multiplier.is_finite() || multiplier <= 0.0 {
        bail!("multiplier must be a positive number, got {}", multiplier);
    }

    let mut reader = open(input, options)?;
    let summary = if output == "-" {
        let stdout = io::stdout();
        let mut writer = stdout.lock();
        rewrite::multiply_sample_rate(&mut reader, &mut writer, multiplier)?
    } else {
        let file = File::create(output).with_context(|| format!("failed to create {}", output))?;
        let mut writer = BufWriter::new(file);
        let summary = rewrite::multiply_sample_rate(&mut reader, &mut writer, multiplier)?;
        writer.flush()?;
        summary
    };

    if summary.headers_rewritten == 0 {
        bail!("no identification header found in {}", input.display());
    }
    formatter.print_success(&format!(
        "Rewrote {} identification header(s) across {} pages (page checksums not updated)",
        summary.headers_rewritten, summary.pages_written
    ));
    Ok(())
}

/// Batch parse a directory
fn command_batch(
    directory: &str,
    pattern: &str,
    options: &ReaderOptions,
    formatter: &OutputFormatter,
) -> Result<()> {
    let files = find_files(directory, pattern, formatter)?;

    if files.is_empty() {
        formatter.print_info("No files found matching pattern");
        return Ok(());
    }

    formatter.print_info(&format!("Processing {} files...", files.len()));

    let mut success_count = 0;
    let mut error_count = 0;

    for path in &files {
        let result = open(path, options)
            .and_then(|mut reader| inspect::parse_fully(&mut reader).map_err(Into::into));
        match result {
            Ok(streams) => {
                formatter.print_success(&format!("{} ({} stream(s))", path.display(), streams.len()));
                success_count += 1;
            }
            Err(e) => {
                formatter.print_error(&format!("{}: {:#}", path.display(), e));
                error_count += 1;
            }
        }
    }

    formatter.print_info(&format!(
        "Completed: {} successful, {} errors",
        success_count, error_count
    ));

    Ok(())
}

/// Files under `directory` matching `pattern`. A pattern without wildcards
/// matches that file name at any depth.
fn find_files(directory: &str, pattern: &str, formatter: &OutputFormatter) -> Result<Vec<PathBuf>> {
    // Build glob pattern
    let glob_pattern = if pattern.contains('*') || pattern.contains('?') {
        format!("{}/{}", directory, pattern)
    } else {
        format!("{}/**/{}", directory, pattern)
    };

    // Find matching files
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in glob(&glob_pattern).with_context(|| format!("invalid glob pattern {}", glob_pattern))? {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    files.push(path);
                }
            }
            Err(e) => {
                formatter.print_error(&format!("Error reading path: {}", e));
            }
        }
    }
    Ok(files)
}
