//! Output formatting for zeeho-cli (table, json)

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// Print a warning message
    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    /// Print rows in the configured format
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    if !self.quiet {
                        println!("No data");
                    }
                } else {
                    println!("{}", Table::new(data));
                }
            }
            OutputFormat::Json => print_json(&data),
        }
    }

    /// Print a single row in the configured format
    pub fn print_one<T: Tabled + Serialize>(&self, data: &T) {
        match self.format {
            OutputFormat::Table => println!("{}", Table::new([data])),
            OutputFormat::Json => print_json(data),
        }
    }

    /// Print any serializable value as JSON
    pub fn print_json<T: Serialize>(&self, data: &T) {
        print_json(data);
    }

    /// Print key-value pairs in table mode, `json` otherwise
    pub fn print_kv<T: Serialize>(&self, pairs: &[(&str, String)], json: &T) {
        match self.format {
            OutputFormat::Table => {
                for (key, value) in pairs {
                    println!("{}: {}", key.bold(), value);
                }
            }
            OutputFormat::Json => print_json(json),
        }
    }
}

fn print_json<T: Serialize + ?Sized>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

/// Render a JSON field value for a table cell
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Render an optional value with its unit
pub fn with_unit(value: &Value, unit: Option<&str>) -> String {
    match unit {
        _ if value.is_null() => format_value(value),
        Some(unit @ ("%" | "°")) => format!("{}{}", format_value(value), unit),
        Some(unit) => format!("{} {}", format_value(value), unit),
        None => format_value(value),
    }
}

// =============================================================================
// Display types for various commands
// =============================================================================

/// Field display for fields/field commands
#[derive(Debug, Tabled, Serialize)]
pub struct FieldRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Unit")]
    pub unit: String,
}

/// Position display for convert command
#[derive(Debug, Tabled, Serialize)]
pub struct PositionRow {
    #[tabled(rename = "System")]
    pub system: String,
    #[tabled(rename = "Longitude")]
    pub longitude: String,
    #[tabled(rename = "Latitude")]
    pub latitude: String,
}
