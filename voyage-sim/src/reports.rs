use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use crate::policy::Strategy;
use crate::simulation::{
    BattleRecord, BattleSummary, ExpeditionRecord, ExpeditionSummary, opening_action,
};
use voyage_core::NpcDifficulty;

/// Everything one CLI run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub strategy: Strategy,
    pub difficulty: NpcDifficulty,
    pub initiative: String,
    pub iterations: usize,
    pub seeds: Vec<String>,
    pub battles: Vec<BattleRecord>,
    pub battle_summary: Option<BattleSummary>,
    pub expeditions: Vec<ExpeditionRecord>,
    pub expedition_summary: Option<ExpeditionSummary>,
}

pub fn generate_console_report(
    out: &mut dyn Write,
    report: &SimulationReport,
    verbose: bool,
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Simulation Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "=====================".cyan())?;
    writeln!(out, "Seeds: {}", report.seeds.join(", "))?;
    writeln!(
        out,
        "Strategy: {} (opens with {}) vs {} NPCs, initiative {}",
        report.strategy,
        opening_action(report.strategy, report.difficulty),
        report.difficulty.key(),
        report.initiative
    )?;
    writeln!(out, "Iterations per seed: {}", report.iterations)?;
    writeln!(out)?;

    if let Some(summary) = &report.battle_summary {
        writeln!(out, "{}", "⚔️  Battles".bright_yellow().bold())?;
        writeln!(out, "Total battles: {}", summary.battles)?;
        writeln!(out, "Victories: {}", summary.victories.to_string().green())?;
        writeln!(out, "Defeats: {}", summary.defeats.to_string().red())?;
        writeln!(
            out,
            "Draws: {}  Fled: {}  Stalemates: {}",
            summary.draws, summary.fled, summary.stalemates
        )?;
        writeln!(out, "Win rate: {:.1}%", summary.win_rate * 100.0)?;
        writeln!(out, "Average rounds: {:.1}", summary.avg_rounds)?;
        writeln!(
            out,
            "Average reward: {:.1} xp, {:.1} gold",
            summary.avg_experience, summary.avg_gold
        )?;
        writeln!(out)?;
        if verbose {
            for record in &report.battles {
                let verdict = match record.verdict.label() {
                    "victory" => record.verdict.label().green(),
                    "defeat" => record.verdict.label().red(),
                    other => other.yellow(),
                };
                writeln!(
                    out,
                    "   [{}] {} in {} rounds, hull {} vs {}",
                    record.seed_code, verdict, record.rounds, record.player_health,
                    record.enemy_health
                )?;
            }
            writeln!(out)?;
        }
    }

    if let Some(summary) = &report.expedition_summary {
        writeln!(out, "{}", "🧭 Expeditions".bright_blue().bold())?;
        writeln!(out, "Total expeditions: {}", summary.expeditions)?;
        writeln!(out, "Successes: {}", summary.successes.to_string().green())?;
        writeln!(out, "Success rate: {:.1}%", summary.success_rate * 100.0)?;
        writeln!(out, "Average gold: {:+.1}", summary.avg_gold)?;
        writeln!(out, "Average hull damage: {:.1}", summary.avg_hull_damage)?;
        writeln!(out, "Events triggered: {}", summary.events_triggered)?;
        writeln!(out)?;
        if verbose {
            for record in &report.expeditions {
                let status = if record.success {
                    "✅".green()
                } else {
                    "❌".red()
                };
                writeln!(
                    out,
                    "   {status} [{}] roll {} vs {}% (difficulty {}) gold {:+} hull -{} {}",
                    record.seed_code,
                    record.roll,
                    record.success_rate,
                    record.region_difficulty,
                    record.gold_delta,
                    record.hull_damage,
                    record.events.join(",")
                )?;
            }
            writeln!(out)?;
        }
    }

    writeln!(out, "🏁 Total time: {total_duration:?}")?;
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, report: &SimulationReport) -> Result<()> {
    let json_output = serde_json::to_string_pretty(report)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, report: &SimulationReport) -> Result<()> {
    writeln!(out, "# Age of Voyage Simulation Results\n")?;
    writeln!(out, "- **Strategy**: {}", report.strategy)?;
    writeln!(out, "- **Difficulty**: {}", report.difficulty.key())?;
    writeln!(out, "- **Initiative**: {}", report.initiative)?;
    writeln!(out, "- **Seeds**: {}\n", report.seeds.join(", "))?;

    if let Some(summary) = &report.battle_summary {
        writeln!(out, "## Battles\n")?;
        writeln!(out, "| Metric | Value |")?;
        writeln!(out, "|---|---|")?;
        writeln!(out, "| Battles | {} |", summary.battles)?;
        writeln!(out, "| Victories | {} |", summary.victories)?;
        writeln!(out, "| Defeats | {} |", summary.defeats)?;
        writeln!(out, "| Draws | {} |", summary.draws)?;
        writeln!(out, "| Fled | {} |", summary.fled)?;
        writeln!(out, "| Stalemates | {} |", summary.stalemates)?;
        writeln!(out, "| Win rate | {:.1}% |", summary.win_rate * 100.0)?;
        writeln!(out, "| Average rounds | {:.1} |\n", summary.avg_rounds)?;
    }

    if let Some(summary) = &report.expedition_summary {
        writeln!(out, "## Expeditions\n")?;
        writeln!(out, "| Metric | Value |")?;
        writeln!(out, "|---|---|")?;
        writeln!(out, "| Expeditions | {} |", summary.expeditions)?;
        writeln!(out, "| Successes | {} |", summary.successes)?;
        writeln!(out, "| Success rate | {:.1}% |", summary.success_rate * 100.0)?;
        writeln!(out, "| Average gold | {:+.1} |", summary.avg_gold)?;
        writeln!(out, "| Average hull damage | {:.1} |\n", summary.avg_hull_damage)?;
    }
    Ok(())
}

pub fn generate_csv_report(out: &mut dyn Write, report: &SimulationReport) -> Result<()> {
    if !report.battles.is_empty() {
        writeln!(
            out,
            "seed_code,seed,strategy,difficulty,verdict,rounds,turns,player_health,enemy_health,stakes,experience,gold"
        )?;
        for r in &report.battles {
            writeln!(
                out,
                "{},{},{},{},{},{},{},{},{},{},{},{}",
                r.seed_code,
                r.seed,
                r.strategy.label(),
                r.difficulty.key(),
                r.verdict.label(),
                r.rounds,
                r.turns,
                r.player_health,
                r.enemy_health,
                r.stakes,
                r.experience,
                r.gold
            )?;
        }
    }
    if !report.expeditions.is_empty() {
        writeln!(
            out,
            "seed_code,seed,region_difficulty,success_rate,roll,success,gold_delta,experience_delta,hull_damage,events,spice_price"
        )?;
        for r in &report.expeditions {
            writeln!(
                out,
                "{},{},{},{},{},{},{},{},{},{},{}",
                r.seed_code,
                r.seed,
                r.region_difficulty,
                r.success_rate,
                r.roll,
                r.success,
                r.gold_delta,
                r.experience_delta,
                r.hull_damage,
                r.events.join(";"),
                r.spice_price
            )?;
        }
    }
    Ok(())
}
