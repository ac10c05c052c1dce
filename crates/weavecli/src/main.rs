// crates/weavecli/src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use weavecore::{ExecutionEvent, NodeDefinition, Value, WorkflowDefinition, WorkflowInputs};
use weaveruntime::{RuntimeConfig, WeaveRuntime};

#[derive(Parser)]
#[command(name = "weave")]
#[command(about = "Weave workflow CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow file
    Run {
        /// Path to workflow JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Root inputs as JSON: {"node_id": {"param": value}}
        #[arg(short, long)]
        input: Option<String>,

        /// Maximum number of activities running at once
        #[arg(short = 'p', long)]
        max_parallel: Option<usize>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a workflow file
    Validate {
        /// Path to workflow JSON file
        file: PathBuf,
    },

    /// List available activity types
    Activities,

    /// Create a new example workflow
    Init {
        /// Output file path
        #[arg(short, long, default_value = "workflow.json")]
        output: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            input,
            max_parallel,
            verbose,
        } => {
            init_logging(verbose);
            run_workflow(&file, input, max_parallel).await?;
        }

        Commands::Validate { file } => {
            init_logging(false);
            validate_workflow(&file)?;
        }

        Commands::Activities => {
            list_activities()?;
        }

        Commands::Init { output } => {
            create_example_workflow(&output)?;
        }
    }

    Ok(())
}

fn build_runtime(config: RuntimeConfig) -> Result<WeaveRuntime> {
    let registry = weaveactivities::standard_registry()?;
    Ok(WeaveRuntime::with_registry(Arc::new(registry), config))
}

fn load_definition(file: &Path) -> Result<WorkflowDefinition> {
    let workflow_json = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let definition = serde_json::from_str(&workflow_json)
        .with_context(|| format!("Invalid workflow definition in {}", file.display()))?;
    Ok(definition)
}

/// Parse `{"node_id": {"param": value}}` into per-node inputs
fn parse_inputs(input: Option<String>) -> Result<WorkflowInputs> {
    let Some(input_str) = input else {
        return Ok(WorkflowInputs::new());
    };

    let json: serde_json::Value = serde_json::from_str(&input_str)?;
    let serde_json::Value::Object(nodes) = json else {
        anyhow::bail!("Input must be a JSON object keyed by node id");
    };

    nodes
        .into_iter()
        .map(|(node_id, params)| match Value::from(params) {
            Value::Object(values) => Ok((node_id, values)),
            _ => Err(anyhow::anyhow!(
                "Inputs for node {} must be a JSON object",
                node_id
            )),
        })
        .collect()
}

async fn run_workflow(
    file: &Path,
    input: Option<String>,
    max_parallel: Option<usize>,
) -> Result<()> {
    println!("🚀 Loading workflow from: {}", file.display());

    let definition = load_definition(file)?;

    println!("📋 Workflow: {}", definition.name);
    println!("   Nodes: {}", definition.nodes.len());
    println!("   Connections: {}", definition.connections.len());
    println!();

    let inputs = parse_inputs(input)?;

    let mut config = RuntimeConfig::default();
    if let Some(max_parallel) = max_parallel {
        config.max_parallel_nodes = max_parallel;
    }
    let runtime = build_runtime(config)?;

    // Subscribe to events for real-time output
    let mut events = runtime.subscribe_events();

    let event_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ExecutionEvent::WorkflowStarted { node_count, .. } => {
                    println!("▶️  Workflow started ({} nodes)", node_count);
                }
                ExecutionEvent::NodeStarted {
                    node_id,
                    activity_type,
                    ..
                } => {
                    println!("  ⚡ Starting node: {} ({})", node_id, activity_type);
                }
                ExecutionEvent::NodeCompleted {
                    node_id,
                    duration_ms,
                    ..
                } => {
                    println!("  ✅ Node {} completed in {}ms", node_id, duration_ms);
                }
                ExecutionEvent::NodeFailed { node_id, error, .. } => {
                    println!("  ❌ Node {} failed: {}", node_id, error);
                }
                ExecutionEvent::WorkflowCompleted {
                    success,
                    duration_ms,
                    ..
                } => {
                    if success {
                        println!("✨ Workflow completed successfully in {}ms", duration_ms);
                    } else {
                        println!("💥 Workflow failed after {}ms", duration_ms);
                    }
                    break;
                }
            }
        }
    });

    let result = runtime.execute_definition(&definition, inputs).await;

    // Let the listener drain; it stops on WorkflowCompleted
    if tokio::time::timeout(std::time::Duration::from_millis(500), event_task)
        .await
        .is_err()
    {
        tracing::debug!("Event listener did not finish in time");
    }

    let result = result?;

    println!();
    println!("📊 Execution Summary:");
    println!("   Execution ID: {}", result.execution_id);
    println!(
        "   Completed: {}/{} nodes",
        result.completed_nodes, result.total_nodes
    );

    if !result.outputs.is_empty() {
        let outputs: serde_json::Map<String, serde_json::Value> = result
            .outputs
            .into_iter()
            .map(|(node_id, values)| (node_id, serde_json::Value::from(Value::Object(values))))
            .collect();
        println!();
        println!("📤 Outputs:");
        println!("{}", serde_json::to_string_pretty(&outputs)?);
    }

    Ok(())
}

fn validate_workflow(file: &Path) -> Result<()> {
    println!("🔍 Validating workflow: {}", file.display());

    let definition = load_definition(file)?;
    let runtime = build_runtime(RuntimeConfig::default())?;
    let topology = runtime.validate(&definition)?;

    let join = |ids: &std::collections::BTreeSet<String>| {
        ids.iter().cloned().collect::<Vec<_>>().join(", ")
    };

    println!("✅ Workflow is valid:");
    println!("   Name: {}", definition.name);
    println!("   Nodes: {}", definition.nodes.len());
    println!("   Connections: {}", definition.connections.len());
    println!("   Roots: {}", join(&topology.roots));
    println!("   Leaves: {}", join(&topology.leaves));

    Ok(())
}

fn list_activities() -> Result<()> {
    println!("📦 Available Activity Types:");
    println!();

    let registry = weaveactivities::standard_registry()?;

    for info in registry.activity_types() {
        let schema = if info.allow_custom_params {
            "custom params".to_string()
        } else {
            let describe = |params: &Option<weavecore::ParamMap>| {
                params
                    .iter()
                    .flatten()
                    .map(|(name, param)| format!("{}: {}", name, param.describe()))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            format!(
                "({}) -> ({})",
                describe(&info.input_params),
                describe(&info.output_params)
            )
        };
        println!("  • {} {}", info.activity_type, schema);
        println!("    {}", info.description);
    }

    Ok(())
}

fn create_example_workflow(output: &Path) -> Result<()> {
    let mut definition = WorkflowDefinition::new("Example Text Workflow");
    definition.description = Some("Uppercases text and measures its length".to_string());

    let upper_id = definition.add_node(
        NodeDefinition::new("uppercase_node", "uppercase", "Uppercase")
            .with_param("activity_name", json!("uppercase")),
    );
    let length_id = definition.add_node(
        NodeDefinition::new("length_node", "string_length", "Length")
            .with_param("activity_name", json!("length")),
    );

    definition.connect(upper_id, "uppercase_text", length_id, "text");

    let json = serde_json::to_string_pretty(&definition)?;
    std::fs::write(output, json)?;

    println!("✨ Created example workflow: {}", output.display());
    println!();
    println!("Run it with:");
    println!(
        "  weave run --file {} --input '{{\"uppercase_node\": {{\"text\": \"hello\"}}}}'",
        output.display()
    );

    Ok(())
}
