mod policy;
mod reports;
mod seeds;
mod simulation;
mod util;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use policy::Strategy;
use reports::SimulationReport;
use seeds::{SeedInfo, resolve_seed_inputs};
use simulation::{
    BattleRecord, ExpeditionRecord, SimulationConfig, iteration_seed, run_battle, run_expedition,
    summarize_battles, summarize_expeditions,
};
use util::split_csv;
use voyage_core::{BalanceConfig, Initiative, NpcDifficulty};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RunMode {
    /// Seeded battles against generated NPCs
    Battle,
    /// Seeded exploration rolls and market ticks
    Explore,
    /// Run both battles and expeditions
    Both,
}

impl RunMode {
    const fn battles(self) -> bool {
        matches!(self, Self::Battle | Self::Both)
    }

    const fn expeditions(self) -> bool {
        matches!(self, Self::Explore | Self::Both)
    }
}

#[derive(Debug, Parser)]
#[command(name = "voyage-sim", version = "0.1.0")]
#[command(about = "Seeded battle and expedition simulator for the Age of Voyage combat engine")]
struct Args {
    /// What to simulate: battles, expeditions, or both
    #[arg(long, value_enum, default_value_t = RunMode::Both)]
    mode: RunMode,

    /// Seeds to run (comma-separated non-negative integers or replay codes)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// NPC difficulty preset
    #[arg(long, default_value = "medium")]
    #[arg(value_parser = ["easy", "medium", "hard"])]
    difficulty: String,

    /// Player captain temperament
    #[arg(long, value_enum, default_value_t = Strategy::Balanced)]
    strategy: Strategy,

    /// Who opens each round
    #[arg(long, default_value = "player-first")]
    #[arg(value_parser = ["player-first", "by-speed"])]
    initiative: String,

    /// Balance sheet to load instead of the bundled one
    #[arg(long)]
    balance: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    announce_banner();

    let start_time = Instant::now();
    let balance = load_balance(args.balance.as_ref())?;
    let difficulty: NpcDifficulty = args
        .difficulty
        .parse()
        .map_err(anyhow::Error::msg)
        .context("invalid --difficulty")?;
    let initiative: Initiative = args
        .initiative
        .parse()
        .map_err(anyhow::Error::msg)
        .context("invalid --initiative")?;
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;

    let battles = run_battles(&args, &seed_infos, difficulty, initiative, &balance)?;
    let expeditions = run_expeditions(&args, &seed_infos);

    let report = SimulationReport {
        strategy: args.strategy,
        difficulty,
        initiative: args.initiative.clone(),
        iterations: args.iterations,
        seeds: seed_infos.iter().map(SeedInfo::label).collect(),
        battle_summary: args.mode.battles().then(|| summarize_battles(&battles)),
        expedition_summary: args
            .mode
            .expeditions()
            .then(|| summarize_expeditions(&expeditions)),
        battles,
        expeditions,
    };

    write_reports(&args, &report, start_time)
}

fn announce_banner() {
    println!("{}", "⛵ Age of Voyage Simulator".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn load_balance(path: Option<&PathBuf>) -> Result<BalanceConfig> {
    let Some(path) = path else {
        return Ok(BalanceConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    BalanceConfig::from_json(&json).with_context(|| format!("invalid balance sheet {}", path.display()))
}

fn run_battles(
    args: &Args,
    seed_infos: &[SeedInfo],
    difficulty: NpcDifficulty,
    initiative: Initiative,
    balance: &BalanceConfig,
) -> Result<Vec<BattleRecord>> {
    let mut records = Vec::new();
    if !args.mode.battles() {
        return Ok(records);
    }

    println!("{}", "⚔️  Running Battles".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    for info in seed_infos {
        let label = info.label();
        if let Some(mode) = info.mode {
            log::info!("replaying {label} as {mode:?}");
        }
        for iteration in (0_u64..).take(args.iterations) {
            let seed = iteration_seed(info.seed, iteration);
            let config =
                SimulationConfig::new(seed, difficulty, args.strategy).with_initiative(initiative);
            let record = run_battle(&config, &label, balance)
                .with_context(|| format!("battle {label} iteration {iteration} failed"))?;
            log::debug!(
                "[{label} #{iteration}] {} after {} rounds",
                record.verdict.label(),
                record.rounds
            );
            records.push(record);
        }
    }
    Ok(records)
}

fn run_expeditions(args: &Args, seed_infos: &[SeedInfo]) -> Vec<ExpeditionRecord> {
    if !args.mode.expeditions() {
        return Vec::new();
    }

    println!("{}", "🧭 Running Expeditions".bright_blue().bold());
    println!("{}", "-".repeat(30).blue());

    seed_infos
        .iter()
        .flat_map(|info| {
            let label = info.label();
            (0_u64..)
                .take(args.iterations)
                .map(move |iteration| run_expedition(iteration_seed(info.seed, iteration), &label))
        })
        .collect()
}

fn write_reports(args: &Args, report: &SimulationReport, start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => reports::generate_json_report(output_target.writer(), report)?,
        "markdown" => reports::generate_markdown_report(output_target.writer(), report)?,
        "csv" => reports::generate_csv_report(output_target.writer(), report)?,
        _ => reports::generate_console_report(
            output_target.writer(),
            report,
            args.verbose,
            start_time.elapsed(),
        )?,
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
