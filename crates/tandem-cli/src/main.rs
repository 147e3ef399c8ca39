//! Tandem CLI — run multi-agent consultation pipelines from the terminal.
//!
//! Wires the pieces together the way a host system would: load an agent
//! roster, build the standard adapter set, install the built-in pipelines,
//! then run, list, or health-probe.

mod roster;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use tandem_adapters::consultation::{builtin_pipelines, consultation_summary, infer_pipeline};
use tandem_adapters::standard_adapters;
use tandem_core::{
    probe_all, AgentRegistry, Orchestrator, RunStatus, StepStatus, WorkflowReport,
};

use roster::AgentRoster;

#[derive(Parser)]
#[command(name = "tandem", version, about = "Tandem — multi-agent consultation orchestrator")]
struct Cli {
    /// Path to a YAML agent roster; the built-in demo roster is used when omitted
    #[arg(long, global = true, env = "TANDEM_ROSTER")]
    roster: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline against a JSON input payload
    Run {
        /// Pipeline name; inferred from the payload's "task" field when omitted
        #[arg(long)]
        pipeline: Option<String>,

        /// Inline JSON input payload
        #[arg(long, conflicts_with = "input_file")]
        input: Option<String>,

        /// Read the JSON input payload from a file
        #[arg(long)]
        input_file: Option<String>,

        /// Print the raw report as JSON instead of the human summary
        #[arg(long)]
        json: bool,
    },

    /// List registered agents and their capabilities
    Agents,

    /// List the installed pipelines
    Pipelines,

    /// Probe every registered agent's reachability
    Health,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run(Cli::parse()).await {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let roster = match &cli.roster {
        Some(path) => AgentRoster::from_file(path)?,
        None => AgentRoster::builtin(),
    };

    let registry = AgentRegistry::new();
    for descriptor in roster.agents {
        registry.register(descriptor).await?;
    }
    tracing::info!("{} agents registered", registry.len().await);

    let adapters = standard_adapters();

    match cli.command {
        Commands::Run {
            pipeline,
            input,
            input_file,
            json,
        } => {
            let payload = read_payload(input, input_file)?;

            let mut orchestrator = Orchestrator::new(registry, adapters);
            for builtin in builtin_pipelines() {
                orchestrator.install_pipeline(builtin);
            }

            let name = match pipeline {
                Some(name) => name,
                None => {
                    let task = payload.get("task").and_then(|t| t.as_str()).unwrap_or_default();
                    infer_pipeline(task)
                        .ok_or("no --pipeline given and the payload's 'task' field names none")?
                        .to_string()
                }
            };

            let report = orchestrator.run_pipeline(&name, payload).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
                println!();
                println!("Consultation summary:");
                println!(
                    "{}",
                    serde_json::to_string_pretty(&consultation_summary(&report))?
                );
            }
        }

        Commands::Agents => {
            for agent in registry.list_all().await {
                println!(
                    "• {} ({}) — {}",
                    agent.agent_id,
                    agent.agent_type,
                    agent.capabilities.join(", ")
                );
            }
        }

        Commands::Pipelines => {
            for pipeline in builtin_pipelines() {
                let description = pipeline
                    .description
                    .as_deref()
                    .map(|d| format!(" — {}", d))
                    .unwrap_or_default();
                println!("• {} ({} steps){}", pipeline.name, pipeline.len(), description);
            }
        }

        Commands::Health => {
            let statuses = probe_all(&registry, &adapters).await;
            for status in &statuses {
                println!(
                    "{} {} ({})",
                    if status.healthy { "✅" } else { "❌" },
                    status.agent_id,
                    status.agent_type
                );
            }
            let healthy = statuses.iter().filter(|s| s.healthy).count();
            println!("{}/{} agents healthy", healthy, statuses.len());
        }
    }

    Ok(())
}

fn read_payload(
    inline: Option<String>,
    file: Option<String>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = match (inline, file) {
        (Some(inline), _) => inline,
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => return Err("provide --input or --input-file".into()),
    };
    Ok(serde_json::from_str(&raw)?)
}

fn print_report(report: &WorkflowReport) {
    println!("═══════════════════════════════════════════════════════════");
    println!("  Pipeline : {}", report.pipeline);
    println!("  Run      : {}", report.run_id);
    println!("  Status   : {}", status_label(report.status));
    println!("───────────────────────────────────────────────────────────");
    for (i, step) in report.steps.iter().enumerate() {
        let marker = match step.status {
            StepStatus::Completed => "✅",
            StepStatus::Degraded => "⚠️ ",
            StepStatus::Failed => "❌",
        };
        let agent = step
            .agent_id
            .as_deref()
            .map(|id| format!("agent {}", id))
            .unwrap_or_else(|| "no agent".to_string());
        println!(
            "  {} Step {}/{}: {} ({}, {}ms)",
            marker,
            i + 1,
            report.steps.len(),
            step.step,
            agent,
            step.duration_ms
        );
        if let Some(error) = &step.error {
            println!("      {}", error);
        }
    }
    println!("───────────────────────────────────────────────────────────");
    println!(
        "  {}/{} steps completed in {}ms",
        report.completed_steps(),
        report.steps.len(),
        report.total_duration_ms
    );
    println!("═══════════════════════════════════════════════════════════");
}

fn status_label(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Success => "✅ SUCCESS",
        RunStatus::PartialSuccess => "⚠️  PARTIAL SUCCESS",
        RunStatus::Failure => "❌ FAILURE",
    }
}
