// crates/agentcli/src/main.rs

use agentcore::{import_flow, ExecutionEvent, ExecutionMode, Flow, NodeEvent, NodeTemplate, NodeType};
use agentnodes::{standard_registry, OpenAiClient};
use agentruntime::{scheduler, validator, AgentRuntime, CyclePolicy, EngineConfig, RuntimeConfig};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agentflow")]
#[command(about = "Agent flow CLI", long_about = None)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a flow file
    Run {
        /// Path to a flow or exported agent JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Text fed to the input node
        #[arg(short, long, default_value = "")]
        input: String,

        /// sequential, parallel or conditional
        #[arg(short, long, default_value = "sequential")]
        mode: ExecutionMode,

        /// Request streamed output from the model
        #[arg(long)]
        stream: bool,

        /// Print every node's output
        #[arg(long)]
        trace: bool,

        /// Skip nodes on cycles instead of failing the run
        #[arg(long)]
        allow_cycles: bool,
    },

    /// Validate a flow file
    Validate {
        /// Path to a flow or exported agent JSON file
        file: PathBuf,
    },

    /// List available node types
    Nodes,

    /// Create a new example flow
    Init {
        /// Output file path
        #[arg(short, long, default_value = "flow.json")]
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
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            file,
            input,
            mode,
            stream,
            trace,
            allow_cycles,
        } => {
            let engine = EngineConfig {
                cycle_policy: if allow_cycles {
                    CyclePolicy::Omit
                } else {
                    CyclePolicy::Reject
                },
                trace_nodes: trace,
                ..EngineConfig::default()
            };
            run_flow(&file, &input, mode, stream, engine).await?;
        }

        Commands::Validate { file } => {
            validate_flow(&file)?;
        }

        Commands::Nodes => {
            list_nodes();
        }

        Commands::Init { output } => {
            create_example_flow(&output)?;
        }
    }

    Ok(())
}

fn load_flow(file: &Path) -> Result<Flow> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    Ok(import_flow(&json)?)
}

async fn run_flow(
    file: &Path,
    input: &str,
    mode: ExecutionMode,
    stream: bool,
    engine: EngineConfig,
) -> Result<()> {
    println!("Loading flow from: {}", file.display());

    let flow = load_flow(file)?;
    println!("   Nodes: {}", flow.nodes.len());
    println!("   Connections: {}", flow.connections.len());
    println!();

    let runtime = AgentRuntime::with_registry(
        Arc::new(standard_registry()),
        OpenAiClient::from_env_or_echo()?,
        RuntimeConfig {
            engine,
            ..RuntimeConfig::default()
        },
    );

    let mut events = runtime.subscribe_events();

    let event_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ExecutionEvent::RunStarted { mode, .. } => {
                    println!("Run started ({} mode)", mode);
                }
                ExecutionEvent::NodeStarted {
                    node_id, node_type, ..
                } => {
                    println!("  > Starting node: {} ({})", node_id, node_type);
                }
                ExecutionEvent::NodeCompleted {
                    node_id,
                    duration_ms,
                    ..
                } => {
                    println!("  < Node {} completed in {}ms", node_id, duration_ms);
                }
                ExecutionEvent::NodeEvent { node_id, event, .. } => match event {
                    NodeEvent::Info { message } => {
                        println!("     [{}] {}", node_id, message);
                    }
                    NodeEvent::Warning { message } => {
                        println!("     [{}] warning: {}", node_id, message);
                    }
                },
                ExecutionEvent::RunCompleted {
                    success,
                    duration_ms,
                    ..
                } => {
                    if success {
                        println!("Run completed successfully in {}ms", duration_ms);
                    } else {
                        println!("Run failed after {}ms", duration_ms);
                    }
                }
            }
        }
    });

    let result = runtime.execute(&flow, input, mode, stream).await;

    // Let the listener drain before printing the summary.
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    event_task.abort();

    if !result.intermediate_results.is_empty() {
        println!();
        println!("Trace:");
        for step in &result.intermediate_results {
            println!(
                "   {} ({}, {}ms): {}",
                step.node_id, step.node_type, step.duration_ms, step.output
            );
        }
    }

    let stats = runtime.stats().await;
    println!();
    println!("Execution Summary:");
    println!("   Success: {}", result.success);
    println!("   Response time: {:.3}s", result.response_time);
    println!(
        "   Runs: {} total, {} ok, {} failed",
        stats.total_runs, stats.successful_runs, stats.failed_runs
    );

    match (&result.output, &result.error) {
        (Some(output), _) => {
            println!();
            println!("Output:");
            println!("{}", output);
            Ok(())
        }
        (None, Some(error)) => bail!("{}", error),
        (None, None) => Ok(()),
    }
}

fn validate_flow(file: &Path) -> Result<()> {
    println!("Validating flow: {}", file.display());

    let flow = load_flow(file)?;
    let mut problems = 0;

    if !validator::validate(&flow) {
        println!("   error: flow needs at least one input and one output node");
        problems += 1;
    }

    let cycle = scheduler::cycle_members(&flow.nodes, &flow.connections);
    if !cycle.is_empty() {
        println!("   error: cyclic dependency between: {}", cycle.join(", "));
        problems += 1;
    }

    for finding in validator::lint(&flow) {
        println!("   warning: {}", finding);
    }

    if problems > 0 {
        bail!("{} is not runnable", file.display());
    }

    println!("Flow is valid:");
    println!("   Nodes: {}", flow.nodes.len());
    println!("   Connections: {}", flow.connections.len());
    println!(
        "   Order: {}",
        scheduler::order(&flow.nodes, &flow.connections).join(" -> ")
    );

    Ok(())
}

fn list_nodes() {
    println!("Available Node Types:");
    println!();

    let registry = standard_registry();

    for node_type in registry.list_node_types() {
        if let Some(metadata) = registry.get_metadata(&node_type) {
            println!("  * {} ({})", node_type, metadata.category);
            println!("    {}", metadata.description);
        } else {
            println!("  * {}", node_type);
        }
    }
}

fn example_node(node_type: NodeType, name: &str, x: f64) -> agentcore::NodeSpec {
    let node = match NodeTemplate::for_type(&node_type) {
        Some(template) => template.instantiate(),
        None => agentcore::NodeSpec::new(node_type),
    };
    node.with_name(name).with_position(x, 100.0)
}

fn create_example_flow(output: &Path) -> Result<()> {
    let mut flow = Flow::new();
    flow.metadata.insert(
        "description".to_string(),
        serde_json::Value::from("Answers a question with a language model"),
    );

    let input = flow.add_node(example_node(NodeType::Input, "Question", 100.0));
    let prompt = flow.add_node(
        example_node(NodeType::Prompt, "Prompt", 300.0)
            .with_property("template", "Answer briefly: {input}")
            .with_property("variables", serde_json::json!(["input"])),
    );
    let llm = flow.add_node(example_node(NodeType::Llm, "Model", 500.0));
    let out = flow.add_node(example_node(NodeType::Output, "Answer", 700.0));

    flow.connect(input, prompt.clone());
    flow.connect(prompt, llm.clone());
    flow.connect(llm, out);

    let json = serde_json::to_string_pretty(&flow)?;
    std::fs::write(output, json)?;

    println!("Created example flow: {}", output.display());
    println!();
    println!("Run it with:");
    println!(
        "  agentflow run --file {} --input 'What is Rust?'",
        output.display()
    );

    Ok(())
}
