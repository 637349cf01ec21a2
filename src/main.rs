use anyhow::{Context, Result};
use std::sync::Arc;
use synapse::bootstrap::Runtime;
use synapse::cli::output::Output;
use synapse::cli::{parse_input, Cli, Commands};
use synapse::collaborators::{DocumentStore, InMemoryDocumentStore};
use synapse::dispatch::BatchDispatcher;
use synapse::utils::logging::init_logging;
use synapse::utils::toml_config::{ConfigError, SynapseConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    if let Commands::Config { validate } = cli.command {
        return config_command(&cli, &output, validate);
    }

    let config = SynapseConfig::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    init_logging(&config.logging);

    let store: Arc<dyn DocumentStore> = match cli.documents {
        Some(ref path) => Arc::new(InMemoryDocumentStore::from_json_file(path)?),
        None => Arc::new(InMemoryDocumentStore::new()),
    };
    let runtime = Runtime::from_config(&config, store).await?;

    let outcome = run_command(&cli, &output, &runtime).await;

    let report = runtime.shutdown().await;
    if !report.is_clean() {
        output.warning(&format!(
            "Agents still registered after failed shutdown: {}",
            report.failed.join(", ")
        ));
    }
    outcome
}

fn config_command(cli: &Cli, output: &Output, validate_only: bool) -> Result<()> {
    let config = match SynapseConfig::load(&cli.config) {
        Ok(config) => config,
        Err(ConfigError::FileNotFound(path)) => {
            output.error(&format!("Configuration file not found: {}", path.display()));
            std::process::exit(1);
        }
        Err(e) => {
            output.error(&e.to_string());
            std::process::exit(1);
        }
    };

    if validate_only {
        output.success(&format!("{} is valid", cli.config.display()));
        return Ok(());
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    output.header("Configuration");
    output.kv("File", &cli.config.display().to_string());
    output.kv("Log level", &config.logging.level);
    output.kv("Log format", &config.logging.format);
    output.kv("Max concurrent", &config.dispatch.max_concurrent.to_string());
    output.kv("Max steps", &config.engine.max_steps.to_string());

    output.header("Agents");
    for id in config.agent_ids() {
        if let Some(agent) = config.get_agent(id) {
            output.list_item(&format!("{} ({})", id, agent.agent_type));
        }
    }

    output.header("Workflows");
    for id in config.workflow_ids() {
        if let Some(workflow) = config.get_workflow(id) {
            output.list_item(&format!(
                "{} (start: {}, {} nodes)",
                id,
                workflow.start,
                workflow.nodes.len()
            ));
        }
    }
    output.newline();
    Ok(())
}

async fn run_command(cli: &Cli, output: &Output, runtime: &Runtime) -> Result<()> {
    match cli.command {
        Commands::Config { .. } => Ok(()),

        Commands::Agents => {
            let agents = runtime.agents.list();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&agents)?);
                return Ok(());
            }
            output.header("Agents");
            output.table_header(&["Id", "Name", "Type"]);
            for agent in &agents {
                output.table_row(&[&agent.id, &agent.name, agent.agent_type.as_str()]);
            }
            output.newline();
            Ok(())
        }

        Commands::Workflows => {
            let workflows = runtime.workflows.list();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&workflows)?);
                return Ok(());
            }
            output.header("Workflows");
            output.table_header(&["Id", "Name", "Start", "Nodes"]);
            for w in &workflows {
                output.table_row(&[
                    &w.workflow_id,
                    &w.display_name,
                    &w.start_node_id,
                    &w.node_count.to_string(),
                ]);
            }
            output.newline();
            Ok(())
        }

        Commands::Run {
            ref workflow,
            ref input,
            history,
        } => {
            let run = runtime
                .workflows
                .run_detailed(workflow, parse_input(input))
                .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&run)?);
                return Ok(());
            }

            if history {
                output.header("Steps");
                for (i, step) in run.history.iter().enumerate() {
                    output.step(i, step);
                }
            }

            output.header(&format!("Workflow '{}'", run.workflow_id));
            output.kv("Run", &run.run_id.to_string());
            output.kv("Steps", &run.history.len().to_string());
            if run.result.success {
                output.success(&run.result.message);
                if let Some(ref data) = run.result.data {
                    println!("{}", serde_json::to_string_pretty(data)?);
                }
            } else {
                output.error(run.result.error.as_deref().unwrap_or(&run.result.message));
            }
            Ok(())
        }

        Commands::Batch {
            ref agent_id,
            ref items,
            max_concurrent,
        } => {
            let dispatcher = match max_concurrent {
                Some(n) => BatchDispatcher::new(n)?,
                None => runtime.dispatcher.clone(),
            };
            let report = dispatcher
                .run_agent(Arc::clone(&runtime.agents), agent_id, items.clone())
                .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            output.header(&format!("Batch via '{}'", agent_id));
            for outcome in &report.outcomes {
                output.outcome(outcome);
            }
            output.newline();
            output.info(&format!(
                "{} succeeded, {} failed",
                report.succeeded(),
                report.failed()
            ));
            Ok(())
        }
    }
}
