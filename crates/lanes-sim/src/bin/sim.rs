#![forbid(unsafe_code)]

use std::env;

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use lanes_sim::campaign::{CampaignConfig, describe, grouping_shapes, replay_seed, run_campaign};
use lanes_sim::workload::MutationMix;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "lanes-sim: deterministic simulation of incremental grouped views",
    long_about = None
)]
struct Cli {
    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Run every seed against every grouping shape",
        after_help = "EXAMPLES:\n    # 200 seeds, unfiltered views only\n    lanes-sim campaign --seeds 200 --unfiltered"
    )]
    Campaign(CampaignArgs),

    #[command(
        about = "Replay one seed and shape with its full trace",
        after_help = "EXAMPLES:\n    # Replay a failing run reported by a campaign\n    lanes-sim replay 17 --shape 4 --filtered --json"
    )]
    Replay(ReplayArgs),

    #[command(about = "List grouping shapes and their indices")]
    Shapes,
}

#[derive(Args, Debug)]
struct WorkloadArgs {
    /// Issues created before the first mutation.
    #[arg(long, default_value_t = 12)]
    issues: usize,

    /// Mutations per run.
    #[arg(long, default_value_t = 48)]
    mutations: usize,

    /// Percent of mutations that create an issue.
    #[arg(long, default_value_t = 10)]
    create_percent: u8,

    /// Percent of mutations that delete an issue.
    #[arg(long, default_value_t = 5)]
    delete_percent: u8,

    /// Percent of mutations that re-save an issue unchanged.
    #[arg(long, default_value_t = 10)]
    touch_percent: u8,

    /// Show sub-issues in filtered views.
    #[arg(long)]
    show_sub_issues: bool,
}

#[derive(Args, Debug)]
struct CampaignArgs {
    /// First seed.
    #[arg(long, default_value_t = 0)]
    start: u64,

    /// Number of seeds.
    #[arg(long, default_value_t = 50)]
    seeds: u64,

    /// Skip the filtered variant of each shape.
    #[arg(long)]
    unfiltered: bool,

    #[command(flatten)]
    workload: WorkloadArgs,
}

#[derive(Args, Debug)]
struct ReplayArgs {
    seed: u64,

    /// Grouping shape index (see `lanes-sim shapes`).
    #[arg(long, default_value_t = 0)]
    shape: usize,

    /// Replay behind the view filter.
    #[arg(long)]
    filtered: bool,

    #[command(flatten)]
    workload: WorkloadArgs,
}

impl WorkloadArgs {
    fn campaign_config(&self, seeds: std::ops::Range<u64>, filtered: bool) -> CampaignConfig {
        CampaignConfig {
            seed_range: seeds,
            initial_issues: self.issues,
            mutations: self.mutations,
            mix: MutationMix {
                create_percent: self.create_percent,
                delete_percent: self.delete_percent,
                touch_percent: self.touch_percent,
            },
            filtered,
            hide_sub_issues: !self.show_sub_issues,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Campaign(args) => {
            let end = args.start.saturating_add(args.seeds);
            let config = args.workload.campaign_config(args.start..end, !args.unfiltered);
            let report = run_campaign(&config)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "campaign complete: runs={} passed={} interesting={} actions={}",
                    report.runs,
                    report.runs_passed,
                    report.interesting_runs,
                    report.actions_planned
                );
                for failure in &report.failures {
                    println!(
                        "  FAIL seed={} shape={} ({}){}",
                        failure.seed,
                        failure.shape,
                        failure.grouping,
                        if failure.filtered { " filtered" } else { "" }
                    );
                    for violation in &failure.violations {
                        println!("    {violation}");
                    }
                }
            }

            if let Some(seed) = report.first_failure {
                bail!("invariant violations found; first failing seed: {seed}");
            }
        }
        Commands::Replay(args) => {
            let config = args
                .workload
                .campaign_config(args.seed..args.seed.saturating_add(1), args.filtered);
            let result = replay_seed(args.seed, args.shape, args.filtered, &config)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "replay seed={} grouping={} steps={} actions={} passed={}",
                    result.seed,
                    describe(&result.grouping),
                    result.trace.len(),
                    result.actions_planned(),
                    result.oracle.passed
                );
                for step in &result.trace {
                    println!(
                        "  #{:<3} {:<6} {:<6} {}",
                        step.step,
                        step.mutation,
                        step.issue_id,
                        step.actions
                            .iter()
                            .map(|a| format!("{} {}", a.action, a.path))
                            .collect::<Vec<_>>()
                            .join(", ")
                    );
                }
                for violation in &result.oracle.violations {
                    println!("  {violation}");
                }
            }
        }
        Commands::Shapes => {
            for (index, grouping) in grouping_shapes().iter().enumerate() {
                println!("{index:>2}  {}", describe(grouping));
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LANES_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "lanes=debug,info"
        } else {
            "lanes=info,warn"
        })
    });

    let format = env::var("LANES_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}
