// Output formatting for CLI

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;

/// Output format options
#[derive(Debug, Clone, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Pretty,
    /// Compact JSON
    Json,
    /// Key-value pairs
    KeyValue,
    /// Table format
    Table,
}

/// Format and output data
pub struct OutputFormatter {
    format: OutputFormat,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    /// Output a list of records. JSON formats print one array; the text
    /// formats print each record as its own block.
    pub fn output_records(&self, records: &[serde_json::Value], writer: &mut impl Write) -> Result<()> {
        match self.format {
            OutputFormat::Pretty => {
                writeln!(writer, "{}", serde_json::to_string_pretty(records)?)?;
            }
            OutputFormat::Json => {
                writeln!(writer, "{}", serde_json::to_string(records)?)?;
            }
            OutputFormat::KeyValue => {
                for (index, record) in records.iter().enumerate() {
                    if index > 0 {
                        writeln!(writer)?;
                    }
                    self.output_key_value(record, writer)?;
                }
            }
            OutputFormat::Table => {
                for record in records {
                    self.output_table(record, writer)?;
                }
            }
        }
        Ok(())
    }

    /// Output as key-value pairs
    fn output_key_value(&self, record: &serde_json::Value, writer: &mut impl Write) -> Result<()> {
        if let Some(obj) = record.as_object() {
            let mut items: Vec<_> = obj.iter().collect();
            items.sort_by(|a, b| a.0.cmp(b.0));

            for (key, value) in items {
                writeln!(writer, "{}: {}", key, self.format_value(value))?;
            }
        }
        Ok(())
    }

    /// Output as table
    fn output_table(&self, record: &serde_json::Value, writer: &mut impl Write) -> Result<()> {
        if let Some(obj) = record.as_object() {
            let max_key_len = obj.keys().map(|k| k.len()).max().unwrap_or(0);

            writeln!(writer, "{}", "=".repeat(max_key_len + 30))?;

            for (key, value) in obj {
                writeln!(
                    writer,
                    "{:<width$} {}",
                    format!("{}:", key),
                    self.format_value(value),
                    width = max_key_len + 1
                )?;
            }

            writeln!(writer, "{}", "=".repeat(max_key_len + 30))?;
        }
        Ok(())
    }

    /// Format a JSON value for display
    fn format_value(&self, value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => "(null)".to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Array(arr) => {
                if arr.is_empty() {
                    "[]".to_string()
                } else if arr.iter().all(|v| !v.is_array() && !v.is_object()) {
                    arr.iter()
                        .map(|v| self.format_value(v))
                        .collect::<Vec<_>>()
                        .join(", ")
                } else {
                    format!("[{} items]", arr.len())
                }
            }
            serde_json::Value::Object(obj) => {
                if obj.is_empty() {
                    "{}".to_string()
                } else {
                    format!("{{{} items}}", obj.len())
                }
            }
        }
    }

    /// Print success message
    pub fn print_success(&self, message: &str) {
        if !self.quiet {
            eprintln!("✓ {}", message);
        }
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }

    /// Print info message
    pub fn print_info(&self, message: &str) {
        if !self.quiet {
            eprintln!("  {}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(format: OutputFormat, records: &[serde_json::Value]) -> String {
        let mut out = Vec::new();
        OutputFormatter::new(format, true)
            .output_records(records, &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn sample() -> serde_json::Value {
        json!({
            "serial": 1,
            "vendor": "test",
            "comments": ["A=1", "B=2"],
            "duration_secs": null,
        })
    }

    #[test]
    fn test_json_formats_emit_one_array() {
        let records = vec![sample(), json!({ "serial": 2 })];
        for format in [OutputFormat::Json, OutputFormat::Pretty] {
            let parsed: serde_json::Value = serde_json::from_str(&render(format, &records)).unwrap();
            assert_eq!(parsed, serde_json::Value::Array(records.clone()));
        }
        assert_eq!(render(OutputFormat::Json, &records).lines().count(), 1);
    }

    #[test]
    fn test_key_value_sorted_and_separated() {
        let output = render(OutputFormat::KeyValue, &[sample(), json!({ "serial": 2 })]);
        assert_eq!(
            output,
            "comments: A=1, B=2\nduration_secs: (null)\nserial: 1\nvendor: test\n\nserial: 2\n"
        );
    }

    #[test]
    fn test_table_aligns_values() {
        let output = render(OutputFormat::Table, &[json!({ "serial": 7, "vendor": "v", "id": [] })]);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "=".repeat(36));
        assert_eq!(lines[1], "id:     []");
        assert_eq!(lines[2], "serial: 7");
        assert_eq!(lines[3], "vendor: v");
        assert_eq!(lines[4], lines[0]);
    }

    #[test]
    fn test_nested_values_are_summarized() {
        let output = render(
            OutputFormat::KeyValue,
            &[json!({ "pages": [[1], [2]], "header": { "a": 1, "b": 2 } })],
        );
        assert_eq!(output, "header: {2 items}\npages: [2 items]\n");
    }
}
