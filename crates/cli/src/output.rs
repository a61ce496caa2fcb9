//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl OutputFormat {
    pub fn is_table(self) -> bool {
        matches!(self, OutputFormat::Table)
    }
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No tests found.");
                return;
            }
            let mut table = new_table();
            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }
            println!("{table}");
        }
        _ => print_value(items, format),
    }
}

/// Print name/value pairs as a two-column table
pub fn print_pairs(pairs: &[(&str, String)]) {
    let mut table = new_table();
    table.set_header(vec!["Metric", "Value"]);
    for (name, value) in pairs {
        table.add_row(vec![name.to_string(), value.clone()]);
    }
    println!("{table}");
}

/// Print any serializable value in a machine-readable format
pub fn print_value<T: Serialize + ?Sized>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Yaml => match serde_yaml::to_string(value) {
            Ok(yaml) => print!("{yaml}"),
            Err(e) => print_error(&format!("Failed to render YAML: {e}")),
        },
        _ => match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => print_error(&format!("Failed to render JSON: {e}")),
        },
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✅".green(), message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "❌".red(), message.red());
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("{}  {}", "⚠️".yellow(), message.yellow());
}

/// Print info message
pub fn print_info(message: &str) {
    println!("{}  {}", "ℹ️".blue(), message);
}
