//! CLI module for Synapse
//!
//! Provides command-line interface parsing for the `synapse` binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Synapse - agent orchestration core
///
/// Creates the agents and workflows declared in synapse.toml, then runs a
/// workflow or a batch of documents through them.
#[derive(Parser, Debug)]
#[command(
    name = "synapse",
    version,
    about = "Synapse - agent orchestration core",
    long_about = "Agent registry, outcome-labelled workflow graphs and bounded-concurrency\n\
                  batch dispatch, driven by a declarative synapse.toml.",
    after_help = "EXAMPLES:\n    \
                  synapse config --validate                  # Check synapse.toml\n    \
                  synapse agents                             # List configured agents\n    \
                  synapse run pipeline --input doc-1         # Run one workflow\n    \
                  synapse batch loader doc-1 doc-2 doc-3     # Fan documents out to an agent"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "synapse.toml", global = true)]
    pub config: PathBuf,

    /// JSON file with documents to seed the in-memory store
    #[arg(short, long, global = true)]
    pub documents: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show configuration information
    Config {
        /// Only validate the configuration file
        #[arg(long)]
        validate: bool,
    },

    /// List the agents created from the configuration
    Agents,

    /// List the registered workflows
    Workflows,

    /// Run a workflow
    Run {
        /// Workflow id
        workflow: String,

        /// Initial input. Parsed as JSON when possible, otherwise sent as a string.
        #[arg(short, long)]
        input: String,

        /// Print every step of the run
        #[arg(long)]
        history: bool,
    },

    /// Dispatch a batch of item ids to one agent
    Batch {
        /// Agent id
        agent_id: String,

        /// Item ids (e.g. document ids)
        #[arg(required = true)]
        items: Vec<String>,

        /// Override dispatch.max_concurrent
        #[arg(short = 'n', long)]
        max_concurrent: Option<usize>,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Interpret a command-line input as JSON, falling back to a plain string
pub fn parse_input(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from(["synapse", "run", "pipeline", "--input", "doc-1"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("synapse.toml"));
        match cli.command {
            Commands::Run { workflow, input, history } => {
                assert_eq!(workflow, "pipeline");
                assert_eq!(input, "doc-1");
                assert!(!history);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_batch_with_globals() {
        let cli = Cli::try_parse_from([
            "synapse", "batch", "loader", "a", "b", "-n", "3", "--json", "--config", "x.toml",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.config, PathBuf::from("x.toml"));
        match cli.command {
            Commands::Batch { agent_id, items, max_concurrent } => {
                assert_eq!(agent_id, "loader");
                assert_eq!(items, vec!["a", "b"]);
                assert_eq!(max_concurrent, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_batch_requires_items() {
        assert!(Cli::try_parse_from(["synapse", "batch", "loader"]).is_err());
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("doc-1"), json!("doc-1"));
        assert_eq!(parse_input(r#"{"document_id": "d"}"#), json!({"document_id": "d"}));
        assert_eq!(parse_input("42"), json!(42));
    }
}
