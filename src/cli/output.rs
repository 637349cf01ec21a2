//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for the Synapse CLI.

use crate::dispatch::{BatchOutcome, BatchStatus};
use crate::workflows::WorkflowStep;
use owo_colors::OwoColorize;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    /// Print a warning message to stderr, keeping `--json` stdout parseable
    pub fn warning(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            eprintln!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print a list item
    pub fn list_item(&self, item: &str) {
        if self.colored {
            println!("    {} {}", "•".blue(), item);
        } else {
            println!("    - {}", item);
        }
    }

    /// Print one workflow step
    pub fn step(&self, index: usize, step: &WorkflowStep) {
        let line = format!(
            "{} -> {} ({}, {}ms)",
            step.node_id, step.target, step.outcome, step.duration_ms
        );
        if self.colored {
            let counter = format!("[{}]", index + 1);
            if step.outcome == "success" {
                println!("  {} {}", counter.dimmed(), line.bright_white());
            } else {
                println!("  {} {}", counter.dimmed(), line.yellow());
            }
        } else {
            println!("  [{}] {}", index + 1, line);
        }
    }

    /// Print one batch outcome
    pub fn outcome<T>(&self, outcome: &BatchOutcome<T>) {
        match outcome.status {
            BatchStatus::Success => self.success(&outcome.item_id),
            BatchStatus::Error => {
                let message = format!(
                    "{}: {}",
                    outcome.item_id,
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
                if self.colored {
                    println!("  {} {}", "✗".red().bold(), message.red());
                } else {
                    println!("  [FAILED] {}", message);
                }
            }
        }
    }

    /// Print a table header row
    pub fn table_header(&self, columns: &[&str]) {
        let header: String = columns
            .iter()
            .map(|c| format!("{:<20}", c))
            .collect::<Vec<_>>()
            .join(" ");
        if self.colored {
            println!("    {}", header.bright_white().bold());
            println!("    {}", "─".repeat(columns.len() * 21).dimmed());
        } else {
            println!("    {}", header);
            println!("    {}", "-".repeat(columns.len() * 21));
        }
    }

    /// Print a table row
    pub fn table_row(&self, values: &[&str]) {
        let row: String = values
            .iter()
            .map(|v| format!("{:<20}", v))
            .collect::<Vec<_>>()
            .join(" ");
        println!("    {}", row);
    }

    /// Print newline
    pub fn newline(&self) {
        println!();
    }
}
