//! # Loadflow CLI
//!
//! Command-line front end for `load_core`:
//!
//! - `loadflow run <building.json>` runs every phase and prints a summary
//!   (or writes the full schedule with `--output`)
//! - `loadflow chain <building.json> <load-id>` prints the impact cascade
//!   reachable from one load
//! - `loadflow validate <building.json>` checks the building without running
//!
//! Logging goes to stderr; set `RUST_LOG` or pass `-v` for more detail.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use load_core::loads::{Discipline, LoadCategory};
use load_core::{load_building, load_config, save_schedule, EngineConfig, EngineError, EngineResult, LoadEngine, LoadSchedule};

#[derive(Parser)]
#[command(name = "loadflow")]
#[command(about = "Loadflow - cross-discipline building load propagation", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every phase and report the schedule
    Run {
        /// Path to the building JSON file
        building: PathBuf,
        /// Engine config JSON file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the full schedule JSON here
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Enable the optimization pass
        #[arg(long)]
        optimize: bool,
        /// Optimizer seed (implies --optimize)
        #[arg(long)]
        seed: Option<u64>,
        /// Optimizer iteration budget (implies --optimize)
        #[arg(long)]
        iterations: Option<usize>,
    },
    /// Print the impact chain reachable from one load
    Chain {
        /// Path to the building JSON file
        building: PathBuf,
        /// Root load id, e.g. INTERNAL-R101
        load_id: String,
        /// Engine config JSON file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Check a building file without running
    Validate {
        /// Path to the building JSON file
        building: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            building,
            config,
            output,
            optimize,
            seed,
            iterations,
        } => cmd_run(&building, config.as_deref(), output.as_deref(), optimize, seed, iterations),
        Commands::Chain {
            building,
            load_id,
            config,
        } => cmd_chain(&building, &load_id, config.as_deref()),
        Commands::Validate { building } => cmd_validate(&building),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn report_error(e: &EngineError) {
    eprintln!("Error [{}]: {}", e.error_code(), e);
    if let Ok(json) = serde_json::to_string_pretty(e) {
        eprintln!();
        eprintln!("Error JSON:");
        eprintln!("{}", json);
    }
}

fn engine_config(path: Option<&Path>) -> EngineResult<EngineConfig> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading engine config");
            load_config(path)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn cmd_validate(building_path: &Path) -> EngineResult<()> {
    let building = load_building(building_path)?;
    building.validate()?;

    let spaces: usize = building.floors.iter().map(|f| f.spaces.len()).sum();
    println!("[OK] {} ({})", building.name, building.id);
    println!("  Floors:    {}", building.floors.len());
    println!("  Spaces:    {}", spaces);
    println!("  Area:      {:.1} m²", building.total_area_m2());
    println!("  Occupancy: {}", building.total_occupancy());
    println!(
        "  Site data: {}",
        if building.site.is_some() { "yes" } else { "no (environmental loads skipped)" }
    );
    Ok(())
}

fn cmd_run(
    building_path: &Path,
    config_path: Option<&Path>,
    output: Option<&Path>,
    optimize: bool,
    seed: Option<u64>,
    iterations: Option<usize>,
) -> EngineResult<()> {
    let building = load_building(building_path)?;
    let mut config = engine_config(config_path)?;
    if optimize || seed.is_some() || iterations.is_some() {
        config.optimization.enabled = true;
    }
    if let Some(seed) = seed {
        config.optimization.seed = seed;
    }
    if let Some(iterations) = iterations {
        config.optimization.iterations = iterations;
    }

    let mut engine = LoadEngine::new(config)?;
    let schedule = engine.run(&building)?;

    print_summary(&schedule);

    if let Some(path) = output {
        save_schedule(&schedule, path)?;
        info!(path = %path.display(), loads = schedule.load_count(), "schedule saved");
        println!();
        println!("Schedule written to {}", path.display());
    }
    Ok(())
}

fn print_summary(schedule: &LoadSchedule) {
    println!("═══════════════════════════════════════");
    println!("  LOAD SCHEDULE  {}", schedule.building_id);
    println!("═══════════════════════════════════════");
    println!("  Run:   {}", schedule.run_id);
    println!("  Loads: {}", schedule.load_count());
    println!();

    println!("Discipline totals:");
    for total in &schedule.summary.disciplines {
        println!(
            "  {:<11} {:>12.2} {:<4} ({} loads)",
            total.discipline.display_name(),
            total.total,
            total.unit,
            total.count
        );
    }
    println!();

    println!("Category totals:");
    for total in &schedule.summary.categories {
        println!("  {:<16} {:>12.2} {}", total.category.code(), total.total, total.unit);
    }
    println!();

    if let Some(outcome) = &schedule.optimization {
        println!(
            "Optimization: {} (objective {:.3} -> {:.3}, {} iterations)",
            if outcome.improved { "improved" } else { "no improvement" },
            outcome.baseline_objective,
            outcome.best_objective,
            outcome.iterations
        );
        println!();
    }

    println!("Panel demand:");
    let panels = schedule
        .loads_for(Discipline::Electrical)
        .iter()
        .filter(|l| l.category == LoadCategory::Power);
    for panel in panels {
        println!("  {:<12} {:>10.2} {}", panel.id, panel.magnitude, panel.unit);
    }
    println!();

    println!("Warnings: {}", schedule.warnings.len());
    for warning in &schedule.warnings {
        println!("  {} [{}] {}: {}", warning.id, warning.severity, warning.category, warning.message);
    }
    println!("═══════════════════════════════════════");
}

fn cmd_chain(building_path: &Path, load_id: &str, config_path: Option<&Path>) -> EngineResult<()> {
    let building = load_building(building_path)?;
    let mut engine = LoadEngine::new(engine_config(config_path)?)?;
    engine.run(&building)?;

    let chain = engine.get_load_impact_chain(load_id);
    if chain.is_empty() {
        return Err(EngineError::load_not_found(load_id));
    }

    println!("Impact chain from {}:", load_id);
    for node in &chain {
        let affects: Vec<&str> = node.affected_categories.iter().map(|c| c.code()).collect();
        println!(
            "{}{} [{}] {:.3}{}",
            "  ".repeat(node.depth + 1),
            node.load_id,
            node.category.code(),
            node.magnitude,
            if affects.is_empty() {
                String::new()
            } else {
                format!(" -> {}", affects.join(", "))
            }
        );
    }

    println!();
    println!("JSON Output:");
    if let Ok(json) = serde_json::to_string_pretty(&chain) {
        println!("{}", json);
    }
    Ok(())
}
