//! Stratos CLI — run the research pipeline from the terminal.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use stratos_core::config::load_config;
use stratos_core::pipeline::Pipeline;
use stratos_core::policy::{load_policy, AccessPolicy};
use stratos_core::provider::GeminiGenerator;
use stratos_core::report::FinalReport;
use stratos_core::state::PlanStep;
use stratos_core::ToolGovernor;
use tracing_subscriber::EnvFilter;

/// Stratos: multi-stage research and reporting pipeline
#[derive(Parser, Debug)]
#[command(name = "stratos", version, about, long_about = None)]
struct Cli {
    /// Research topic
    topic: String,

    /// Workspace directory
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// JSON file with a pre-built plan, bypassing plan generation
    #[arg(long)]
    plan_file: Option<PathBuf>,

    /// Emit the final report as raw JSON
    #[arg(long)]
    json: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| PathBuf::from("."));

    let config =
        load_config(Some(&workspace), None).context("Failed to load configuration")?;

    let policy = match &config.policy_path {
        Some(path) => load_policy(path)
            .with_context(|| format!("Failed to load policy from {}", path.display()))?,
        None => AccessPolicy::default_policy(),
    };

    let registry = stratos_tools::default_registry(&config.tools)
        .context("Failed to build tool registry")?;
    let governor = Arc::new(ToolGovernor::new(registry, policy));

    let generator = Arc::new(
        GeminiGenerator::new(&config.provider).context("Failed to initialize provider")?,
    );

    let initial_plan = match &cli.plan_file {
        Some(path) => Some(read_plan_file(path)?),
        None => None,
    };

    let pipeline = Pipeline::new(governor, generator, config.pipeline.clone());
    let state = pipeline
        .run(&cli.topic, initial_plan)
        .await
        .context("Pipeline run failed")?;

    if cli.json {
        println!("{}", state.final_report);
    } else {
        let report: FinalReport =
            serde_json::from_str(&state.final_report).context("Final report was not valid JSON")?;
        print_report(&report, state.iteration_count);
    }

    Ok(())
}

fn read_plan_file(path: &PathBuf) -> anyhow::Result<Vec<PlanStep>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan file {}", path.display()))?;
    let plan: Vec<PlanStep> = serde_json::from_str(&raw)
        .with_context(|| format!("Plan file {} was not a JSON plan array", path.display()))?;
    Ok(plan)
}

fn print_report(report: &FinalReport, iterations: u32) {
    println!("# {}\n", report.title);
    println!("{}\n", report.executive_summary);

    print_section("Market Trends", &report.market_trends);
    print_section("Potential Opportunities", &report.potential_opportunities);
    print_section("Risk & Feasibility", &report.risk_feasibility_section);
    print_section("Recommendations", &report.recommendations);

    if !report.sources.is_empty() {
        println!("## Sources\n");
        for (idx, source) in report.sources.iter().enumerate() {
            println!("{}. {}", idx + 1, source);
        }
        println!();
    }

    println!("_Generated after {iterations} research pass(es)._");
}

fn print_section(heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("## {heading}\n");
    for item in items {
        println!("- {item}");
    }
    println!();
}
