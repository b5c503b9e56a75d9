use clap::{Parser, Subcommand};
use iodse::models::BenchTool;
use iodse::parsers::parse_output;
use iodse::processors::campaign::default_prefill_backend;
use iodse::processors::{
    prefill_many, total_tests, Campaign, GridAxes, PrefillStatus, PrefillTracker,
};
use iodse::utils::{CampaignConfig, Logger};
use iodse::log;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "iodse")]
#[command(version, about = "Storage I/O design-space exploration with fio / SPDK perf")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every point of the configured parameter grid
    Run {
        /// Campaign config (JSON). Built-in defaults when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the results directory
        #[arg(long)]
        results_dir: Option<PathBuf>,

        /// Re-run points whose result file already exists
        #[arg(long)]
        no_resume: bool,

        /// Prefill targets again even if a marker exists
        #[arg(long)]
        force_prefill: bool,

        /// Print the commands without launching anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the number of valid grid points
    Count {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Sequentially fill devices / test files (or PCIe addresses for SPDK)
    Prefill {
        #[arg(required = true)]
        targets: Vec<String>,

        #[arg(long)]
        force: bool,

        /// Remove existing markers instead of writing
        #[arg(long, conflicts_with = "force")]
        invalidate: bool,

        /// fio | spdk (defaults to the config's tool)
        #[arg(long)]
        tool: Option<BenchTool>,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Parse a saved benchmark output and print the metrics as JSON
    Parse {
        file: PathBuf,

        #[arg(long, default_value = "fio")]
        tool: BenchTool,
    },

    /// Print the effective configuration
    PrintConfig {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> io::Result<CampaignConfig> {
    match path {
        Some(path) => CampaignConfig::load(path).map_err(io::Error::other),
        None => Ok(CampaignConfig::default()),
    }
}

fn run_campaign(
    mut config: CampaignConfig,
    results_dir: Option<PathBuf>,
    no_resume: bool,
    force_prefill: bool,
    dry_run: bool,
) -> io::Result<()> {
    if let Some(dir) = results_dir {
        config.results_dir = dir;
    }
    if no_resume {
        config.enable_resume = false;
    }
    if force_prefill {
        config.force_prefill = true;
    }

    Logger::init(&config.results_dir);
    let start_time = Instant::now();

    let mut campaign = Campaign::from_config(config)?.with_dry_run(dry_run);
    let summary = campaign.run()?;

    log!(
        "Total time: {:.2}s ({} completed, {} skipped, {} recovered, {} failed)",
        start_time.elapsed().as_secs_f64(),
        summary.completed,
        summary.skipped,
        summary.recovered,
        summary.failed
    );
    Logger::flush()
}

fn run_prefill(
    mut config: CampaignConfig,
    targets: &[String],
    force: bool,
    invalidate: bool,
    tool: Option<BenchTool>,
) -> io::Result<()> {
    if let Some(tool) = tool {
        config.tool = tool;
    }

    let mut tracker = PrefillTracker::load(&config.marker_dir)?;

    if invalidate {
        for target in targets {
            if tracker.invalidate(target)? {
                log!("[Prefill] Marker removed: {}", target);
            } else {
                log!("[Prefill] No marker for {}", target);
            }
        }
        return Ok(());
    }

    let backend = default_prefill_backend(&config);
    let results = prefill_many(&mut tracker, targets, force, backend.as_ref());

    let mut failures = 0;
    for (target, result) in &results {
        match result {
            Ok(PrefillStatus::AlreadyDone(marker)) => {
                log!("{}: already prefilled ({})", target, marker.timestamp)
            }
            Ok(PrefillStatus::Completed(marker)) => {
                log!("{}: prefilled in {:.2}s", target, marker.duration_sec)
            }
            Err(_) => failures += 1,
        }
    }

    if failures > 0 {
        return Err(io::Error::other(format!(
            "{failures} of {} prefill(s) failed",
            results.len()
        )));
    }
    Ok(())
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            results_dir,
            no_resume,
            force_prefill,
            dry_run,
        } => {
            let config = load_config(config.as_deref())?;
            run_campaign(config, results_dir, no_resume, force_prefill, dry_run)
        }
        Commands::Count { config } => {
            let config = load_config(config.as_deref())?;
            for warning in config.warnings() {
                eprintln!("Warning: {warning}");
            }
            println!("{}", total_tests(&GridAxes::from_config(&config)));
            Ok(())
        }
        Commands::Prefill {
            targets,
            force,
            invalidate,
            tool,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            run_prefill(config, &targets, force, invalidate, tool)
        }
        Commands::Parse { file, tool } => {
            let text = fs::read_to_string(&file)?;
            let metrics = parse_output(tool, &text);
            println!("{}", serde_json::to_string_pretty(&metrics)?);
            Ok(())
        }
        Commands::PrintConfig { config } => {
            let config = load_config(config.as_deref())?;
            let json = config.to_json_pretty().map_err(io::Error::other)?;
            println!("{json}");
            Ok(())
        }
    }
}
