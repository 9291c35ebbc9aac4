//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use ledgermount_core::{Attributes, FieldValue, SyncOutcome};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a host record
    pub fn print_record(&self, id: &str, host_type: &str, attributes: &Attributes) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:   {}", id);
                println!("Type: {}", host_type);
                print_fields(attributes);
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "id": id,
                        "host_type": host_type,
                        "attributes": attributes
                    })
                );
            }
            OutputFormat::Quiet => {
                println!("{}", id);
            }
        }
    }

    /// Print a list of host records as (id, host type, attribute count)
    pub fn print_records(&self, records: &[(String, String, usize)]) {
        match self.format {
            OutputFormat::Human => {
                if records.is_empty() {
                    println!("No records found.");
                    return;
                }
                for (id, host_type, fields) in records {
                    println!("{} | {} | {} field(s)", truncate(id, 36), host_type, fields);
                }
                println!("\n{} record(s)", records.len());
            }
            OutputFormat::Json => {
                let json_records: Vec<_> = records
                    .iter()
                    .map(|(id, host_type, fields)| {
                        serde_json::json!({"id": id, "host_type": host_type, "fields": fields})
                    })
                    .collect();
                println!("{}", serde_json::json!(json_records));
            }
            OutputFormat::Quiet => {
                for (id, _, _) in records {
                    println!("{}", id);
                }
            }
        }
    }

    /// Print a remote record
    pub fn print_remote(&self, remote_type: &str, id: Option<&str>, fields: &Attributes) {
        match self.format {
            OutputFormat::Human => {
                println!("Remote: {}", remote_type);
                println!("ID:     {}", id.unwrap_or("(unsaved)"));
                print_fields(fields);
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "remote_type": remote_type,
                        "id": id,
                        "fields": fields
                    })
                );
            }
            OutputFormat::Quiet => {
                if let Some(id) = id {
                    println!("{}", id);
                }
            }
        }
    }

    /// Print the result of an outward sync
    pub fn print_sync_outcome(&self, mount: &str, outcome: Option<&SyncOutcome>) {
        let Some(outcome) = outcome else {
            match self.format {
                OutputFormat::Human => println!("{}: skipped (no mount or no connection)", mount),
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({"mount": mount, "status": "skipped"}));
                }
                OutputFormat::Quiet => {}
            }
            return;
        };

        let remote_id = outcome.record().id();
        match self.format {
            OutputFormat::Human => {
                if outcome.is_saved() {
                    let verb = if outcome.created() { "created" } else { "updated" };
                    println!(
                        "✓ {}: {} {}",
                        mount,
                        verb,
                        remote_id.as_deref().unwrap_or("")
                    );
                } else {
                    println!("✗ {}: rejected by remote", mount);
                    for reason in outcome.reasons() {
                        println!("  - {}", reason);
                    }
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "mount": mount,
                        "status": if outcome.is_saved() { "saved" } else { "rejected" },
                        "created": outcome.created(),
                        "remote_id": remote_id,
                        "reasons": outcome.reasons()
                    })
                );
            }
            OutputFormat::Quiet => {
                if let Some(id) = remote_id.filter(|_| outcome.is_saved()) {
                    println!("{}", id);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_fields(fields: &Attributes) {
    if fields.is_empty() {
        println!("(no fields)");
        return;
    }
    let width = fields.keys().map(|k| k.len()).max().unwrap_or(0);
    for (name, value) in fields {
        println!("  {:width$}  {}", name, display_value(value), width = width);
    }
}

/// Render a value for human output
fn display_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => "(not set)".to_string(),
        FieldValue::Text(s) => truncate_line(s, 60),
        other => other.to_string(),
    }
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}
