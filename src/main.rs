mod host;
mod store;

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use botflow_config::{ExecutionContext, ExecutionLimits, LimitOverrides, ValidationIssue, WorkflowGraph};
use botflow_runtime::execute;
use botflow_validator::validate;
use botflow_workflow::compile;

use crate::host::{ConsoleHandlers, parse_response};
use crate::store::FileVariableStore;

/// Botflow - A visual workflow engine for chat bots
#[derive(Parser)]
#[command(name = "botflow")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.botflow)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Check a workflow graph and print every issue found
  Validate {
    /// Path to the workflow graph (JSON)
    workflow_file: PathBuf,
  },

  /// Compile a workflow graph and print the executable form
  Compile {
    /// Path to the workflow graph (JSON)
    workflow_file: PathBuf,
  },

  /// Run a workflow against an execution context
  Run {
    /// Path to the workflow graph (JSON)
    workflow_file: PathBuf,

    /// Path to the execution context (JSON). Read from stdin when omitted
    #[arg(long)]
    context: Option<PathBuf>,

    /// Answer interactive messages with `button:<id>` or `select:<menu>:<value>`
    #[arg(long)]
    respond: Option<String>,

    #[arg(long)]
    max_nodes: Option<usize>,

    #[arg(long)]
    max_duration_ms: Option<u64>,

    #[arg(long)]
    max_loop_iterations: Option<usize>,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".botflow"),
  };

  match cli.command {
    Some(Commands::Validate { workflow_file }) => validate_workflow(&workflow_file),
    Some(Commands::Compile { workflow_file }) => compile_workflow(&workflow_file),
    Some(Commands::Run {
      workflow_file,
      context,
      respond,
      max_nodes,
      max_duration_ms,
      max_loop_iterations,
    }) => {
      let overrides = LimitOverrides {
        max_nodes,
        max_duration_ms,
        max_loop_iterations,
      };
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(run_workflow(
        workflow_file,
        context,
        respond,
        overrides,
        data_dir,
      ))
    }
    None => {
      println!("botflow - use --help to see available commands");
      Ok(())
    }
  }
}

fn read_graph(workflow_file: &Path) -> Result<WorkflowGraph> {
  let content = std::fs::read_to_string(workflow_file)
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;
  let graph: WorkflowGraph = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))?;
  info!(
    path = %workflow_file.display(),
    nodes = graph.nodes.len(),
    edges = graph.edges.len(),
    "workflow_loaded"
  );
  Ok(graph)
}

fn print_issues(issues: &[ValidationIssue]) {
  for issue in issues {
    eprintln!("{}", issue);
  }
  let errors = issues.iter().filter(|i| i.is_error()).count();
  if !issues.is_empty() {
    warn!(errors, warnings = issues.len() - errors, "validation_issues");
  }
}

fn validate_workflow(workflow_file: &Path) -> Result<()> {
  let graph = read_graph(workflow_file)?;
  let issues = validate(&graph);
  print_issues(&issues);
  println!("{}", serde_json::to_string_pretty(&issues)?);

  let errors = issues.iter().filter(|i| i.is_error()).count();
  if errors > 0 {
    bail!("workflow has {} validation error(s)", errors);
  }
  Ok(())
}

fn compile_workflow(workflow_file: &Path) -> Result<()> {
  let graph = read_graph(workflow_file)?;
  let workflow = compile(&graph).context("failed to compile workflow")?;
  println!("{}", serde_json::to_string_pretty(&workflow)?);
  Ok(())
}

async fn run_workflow(
  workflow_file: PathBuf,
  context_file: Option<PathBuf>,
  respond: Option<String>,
  overrides: LimitOverrides,
  data_dir: PathBuf,
) -> Result<()> {
  let graph = read_graph(&workflow_file)?;

  let issues = validate(&graph);
  print_issues(&issues);
  if issues.iter().any(|i| i.is_error()) {
    bail!("workflow is not valid, refusing to run");
  }

  let workflow = compile(&graph).context("failed to compile workflow")?;
  let mut context = read_context(context_file.as_deref())?;

  let response = match respond.as_deref() {
    Some(text) => Some(
      parse_response(text)
        .with_context(|| format!("invalid interaction response '{}'", text))?,
    ),
    None => None,
  };
  let handlers = ConsoleHandlers::new(response);
  let store = FileVariableStore::new(data_dir.join("variables.json"));
  let limits = ExecutionLimits::default().with_overrides(&overrides);

  let result = tokio::select! {
    result = execute(&workflow, &mut context, &handlers, &store, limits) => result,
    _ = tokio::signal::ctrl_c() => {
      warn!("run interrupted");
      bail!("interrupted")
    }
  };
  info!(
    execution_id = %result.execution_id,
    steps = result.steps,
    success = result.is_success(),
    "workflow_run_finished"
  );

  println!("{}", serde_json::to_string_pretty(&result)?);

  if let Some(error) = result.error {
    bail!("workflow run {} failed: {}", result.execution_id, error);
  }
  Ok(())
}

fn read_context(context_file: Option<&Path>) -> Result<ExecutionContext> {
  use std::io::IsTerminal;

  let input = match context_file {
    Some(path) => std::fs::read_to_string(path)
      .with_context(|| format!("failed to read context file: {}", path.display()))?,
    None if io::stdin().is_terminal() => String::new(),
    None => {
      let mut input = String::new();
      io::stdin()
        .read_to_string(&mut input)
        .context("failed to read context from stdin")?;
      input
    }
  };

  if input.trim().is_empty() {
    Ok(ExecutionContext::default())
  } else {
    serde_json::from_str(&input).context("failed to parse execution context JSON")
  }
}
