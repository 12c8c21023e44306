use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use colored::Colorize;
use log::LevelFilter;
use tokio_util::sync::CancellationToken;

use mesh_bw_scheduler::config::RunConfig;
use mesh_bw_scheduler::domain::application::application::TieBreak;
use mesh_bw_scheduler::domain::scheduler::node_order::NodeOrder;
use mesh_bw_scheduler::loader::input::SchedulingInput;
use mesh_bw_scheduler::logger;
use mesh_bw_scheduler::runner::{self, RunReport, RunSettings, SchedulerSelection};

#[derive(Parser, Debug)]
#[command(name = "mesh-bw-scheduler", about = "Places an application component graph onto a bandwidth-constrained topology")]
struct Args {
    /// Application description (components and dependencies) as JSON.
    #[arg(long, requires = "topology", conflicts_with = "csv_dir")]
    application: Option<PathBuf>,

    /// Topology description (nodes and links) as JSON.
    #[arg(long, requires = "application")]
    topology: Option<PathBuf>,

    /// Precomputed routes as JSON.
    #[arg(long, requires = "topology")]
    paths: Option<PathBuf>,

    /// Directory holding nodes.csv, links.csv, paths.csv, app.csv and deps.csv.
    #[arg(long)]
    csv_dir: Option<PathBuf>,

    /// cluster, mesh or both.
    #[arg(long)]
    scheduler: Option<SchedulerSelection>,

    /// spread or pack, overrides the scheduler's own order.
    #[arg(long)]
    node_order: Option<NodeOrder>,

    /// declaration or lexicographic.
    #[arg(long)]
    tie_break: Option<TieBreak>,

    /// JSON run config, command line flags take precedence.
    #[arg(long)]
    config: Option<PathBuf>,

    /// off, error, warn, info, debug or trace.
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> RunConfig {
        RunConfig {
            scheduler: self.scheduler,
            node_order: self.node_order,
            tie_break: self.tie_break,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let file_config = match &args.config {
        Some(path) => RunConfig::from_file(path).with_context(|| format!("reading config {}", path.display()))?,
        None => RunConfig::default(),
    };
    let config = file_config.merge(args.overrides());

    let level = match config.log_level.as_deref() {
        Some(level) => Some(level.parse::<LevelFilter>().map_err(|_| anyhow::anyhow!("invalid log level '{}'", level))?),
        None => None,
    };
    logger::init(level);

    let input = match (&args.csv_dir, &args.application, &args.topology) {
        (Some(dir), _, _) => SchedulingInput::from_csv_dir(dir)?,
        (None, Some(application), Some(topology)) => SchedulingInput::from_json_files(application, topology, args.paths.as_deref())?,
        _ => bail!("either --csv-dir or --application with --topology is required"),
    };

    let settings = RunSettings {
        selection: config.scheduler.unwrap_or_default(),
        node_order: config.node_order,
        tie_break: config.tie_break.unwrap_or_default(),
    };

    let cancellation = CancellationToken::new();
    let ctrl_c_token = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling scheduling.");
            ctrl_c_token.cancel();
        }
    });

    let reports = runner::run(input, settings, cancellation).await?;

    for report in &reports {
        print_summary(report);
    }
    println!("{}", serde_json::to_string_pretty(&reports)?);

    Ok(())
}

fn print_summary(report: &RunReport) {
    let verdict = if report.outcome.feasible { "feasible".green().bold() } else { "infeasible".red().bold() };
    eprintln!("{} scheduler: {} ({} components placed, {:.3} ms)", report.scheduler.to_string().bold(), verdict, report.outcome.assignment.len(), report.elapsed_ms);

    if let Some(reason) = &report.outcome.infeasibility {
        eprintln!("  {}", reason.to_string().yellow());
    }
    if !report.oversubscription.is_clean() {
        eprintln!("  {} paths oversubscribed by {} in total", report.oversubscription.violation_count().to_string().yellow(), report.total_deficit);
    }
}
