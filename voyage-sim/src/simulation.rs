use serde::Serialize;
use voyage_core::{
    ActionChoice, BalanceConfig, BattleConfig, BattleState, CombatError, CombatantKind,
    CombatantRecord, CombatantState, Dice, EventEffects, EventId, ExplorationCheck,
    ExplorationRequest, Initiative, MarketConditions, NpcDifficulty, PriceQuote, Progression,
    RandomEvent, RegionProfile, Resolution, RewardTerms, RngBundle, Side, finalize_outcome,
    npc_opponent, play_pve_round, roll_exploration, roll_market_tick, roll_stakes, start_battle,
};

use crate::policy::Strategy;

const CAPTAIN_LEVEL: u32 = 5;
const CAPTAIN_GOLD: u32 = 1_000;
const CAPTAIN_SKILL: u32 = 4;

/// Configuration for one simulated battle.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub difficulty: NpcDifficulty,
    pub strategy: Strategy,
    pub initiative: Initiative,
    pub max_rounds: u32,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(seed: u64, difficulty: NpcDifficulty, strategy: Strategy) -> Self {
        Self {
            seed,
            difficulty,
            strategy,
            initiative: Initiative::SideAFirst,
            max_rounds: 200,
        }
    }

    #[must_use]
    pub fn with_initiative(mut self, initiative: Initiative) -> Self {
        self.initiative = initiative;
        self
    }
}

/// How a simulated battle ended from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleVerdict {
    Victory,
    Defeat,
    Draw,
    Fled,
    /// Round cap reached without a terminal turn.
    Stalemate,
}

impl BattleVerdict {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Victory => "victory",
            Self::Defeat => "defeat",
            Self::Draw => "draw",
            Self::Fled => "fled",
            Self::Stalemate => "stalemate",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BattleRecord {
    pub seed: u64,
    pub seed_code: String,
    pub strategy: Strategy,
    pub difficulty: NpcDifficulty,
    pub verdict: BattleVerdict,
    pub rounds: u32,
    pub turns: usize,
    pub player_health: u32,
    pub enemy_health: u32,
    pub stakes: u32,
    pub experience: u32,
    pub gold: u32,
    pub levels_gained: u32,
    pub rolls: u64,
}

/// The player's flagship used for every simulated battle.
#[must_use]
pub fn flagship() -> CombatantRecord {
    CombatantRecord {
        kind: CombatantKind::Ship,
        name: String::from("Santa Lucia"),
        health: 120,
        max_health: 120,
        attack: 24,
        defense: 12,
        speed: 9,
        crew: 45,
        morale: 60,
    }
}

/// Fight one seeded battle against a generated NPC.
pub fn run_battle(
    config: &SimulationConfig,
    seed_code: &str,
    balance: &BalanceConfig,
) -> Result<BattleRecord, CombatError> {
    let bundle = RngBundle::from_user_seed(config.seed);
    let player = CombatantState::from_record(&flagship())?;
    let npc = npc_opponent(&player, config.difficulty);
    let stakes = roll_stakes(&mut *bundle.combat());

    let battle_config = BattleConfig {
        initiative: config.initiative,
        combat: balance.combat.clone(),
        skill_a: CAPTAIN_SKILL,
        skill_b: 0,
        rewards: RewardTerms {
            level_a: CAPTAIN_LEVEL,
            level_b: CAPTAIN_LEVEL,
            gold_a: CAPTAIN_GOLD,
            gold_b: stakes,
            stakes,
            ..RewardTerms::default()
        }
        .against_npc(config.difficulty),
        ..BattleConfig::default()
    };
    let mut battle = start_battle(&BattleState::new(player, npc, battle_config))?;

    while !battle.is_finished() && battle.round() <= config.max_rounds {
        let action = config.strategy.pick(
            battle.combatant(Side::A),
            battle.combatant(Side::B),
            &balance.combat,
        );
        let (next, turns) = play_pve_round(&battle, action, &mut *bundle.combat())?;
        for turn in &turns {
            log::debug!("seed {seed_code} turn {}: {}", turn.turn_number, turn.description);
        }
        battle = next;
    }

    let rounds = battle.round().min(config.max_rounds);
    let mut record = BattleRecord {
        seed: config.seed,
        seed_code: seed_code.to_string(),
        strategy: config.strategy,
        difficulty: config.difficulty,
        verdict: BattleVerdict::Stalemate,
        rounds,
        turns: battle.turns().len(),
        player_health: battle.combatant(Side::A).health,
        enemy_health: battle.combatant(Side::B).health,
        stakes,
        experience: 0,
        gold: 0,
        levels_gained: 0,
        rolls: bundle.combat().draws(),
    };
    if !battle.is_finished() {
        return Ok(record);
    }

    let outcome = finalize_outcome(&battle)?;
    record.verdict = match outcome.resolution {
        Resolution::Victory(Side::A) => BattleVerdict::Victory,
        Resolution::Victory(Side::B) => BattleVerdict::Defeat,
        Resolution::Draw => BattleVerdict::Draw,
        Resolution::Fled => BattleVerdict::Fled,
    };
    if record.verdict == BattleVerdict::Victory {
        record.experience = outcome.experience_awarded;
        record.gold = outcome.gold_transferred;
        let mut progression = Progression::default();
        record.levels_gained = progression.add_experience(record.experience, &balance.leveling);
    }
    Ok(record)
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpeditionRecord {
    pub seed: u64,
    pub seed_code: String,
    pub region_difficulty: u32,
    pub success_rate: u32,
    pub roll: u32,
    pub success: bool,
    pub gold_delta: i64,
    pub experience_delta: u32,
    pub hull_damage: u32,
    pub events: Vec<String>,
    /// Spice price in cents after the port's market tick.
    pub spice_price: u64,
}

fn event_pool() -> Vec<RandomEvent> {
    vec![
        RandomEvent {
            id: EventId::from("sunken_treasure"),
            probability: 8,
            effects: EventEffects {
                gold: 400,
                experience: 25,
                hull_damage: 0,
            },
        },
        RandomEvent {
            id: EventId::from("squall"),
            probability: 15,
            effects: EventEffects {
                gold: 0,
                experience: 5,
                hull_damage: 12,
            },
        },
        RandomEvent {
            id: EventId::from("friendly_merchant"),
            probability: 20,
            effects: EventEffects {
                gold: 60,
                experience: 0,
                hull_damage: 0,
            },
        },
    ]
}

/// Sail one seeded expedition into a randomly rolled region, then let the
/// home port's spice market tick.
#[must_use]
pub fn run_expedition(seed: u64, seed_code: &str) -> ExpeditionRecord {
    let bundle = RngBundle::from_user_seed(seed);
    let region = {
        let mut dice = bundle.exploration();
        let mut rating = || u32::try_from(dice.between(1, 10)).unwrap_or(1);
        RegionProfile {
            pirate_activity: rating(),
            weather_risk: rating(),
            danger_level: rating(),
        }
    };
    let difficulty = region.difficulty();
    let check = ExplorationCheck {
        base_rate: 60,
        skill_bonus: CAPTAIN_SKILL * 2,
        equipment_bonus: 5,
        region_penalty: difficulty * 3,
    };
    let pool = event_pool();
    let request = ExplorationRequest {
        success_rate: check.success_rate(),
        region_difficulty: difficulty,
        captain_level: CAPTAIN_LEVEL,
        event_pool: &pool,
    };
    let roll = roll_exploration(&request, &mut *bundle.exploration());

    let spice = PriceQuote::new(2_500, 80, 80, 1.0);
    let tick = roll_market_tick(&spice, &MarketConditions::default(), &mut *bundle.market());

    ExpeditionRecord {
        seed,
        seed_code: seed_code.to_string(),
        region_difficulty: difficulty,
        success_rate: roll.success_rate,
        roll: roll.roll,
        success: roll.success,
        gold_delta: roll.gold_delta,
        experience_delta: roll.experience_delta,
        hull_damage: roll.hull_damage,
        events: roll
            .triggered_events
            .iter()
            .map(ToString::to_string)
            .collect(),
        spice_price: tick.quote.current_price,
    }
}

/// Seed for iteration `n` of a base seed. Iteration 0 is the seed itself.
#[must_use]
pub const fn iteration_seed(base: u64, iteration: u64) -> u64 {
    base.wrapping_add(iteration.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BattleSummary {
    pub battles: usize,
    pub victories: usize,
    pub defeats: usize,
    pub draws: usize,
    pub fled: usize,
    pub stalemates: usize,
    pub win_rate: f64,
    pub avg_rounds: f64,
    pub avg_experience: f64,
    pub avg_gold: f64,
}

#[must_use]
pub fn summarize_battles(records: &[BattleRecord]) -> BattleSummary {
    let count = |verdict: BattleVerdict| records.iter().filter(|r| r.verdict == verdict).count();
    let mut summary = BattleSummary {
        battles: records.len(),
        victories: count(BattleVerdict::Victory),
        defeats: count(BattleVerdict::Defeat),
        draws: count(BattleVerdict::Draw),
        fled: count(BattleVerdict::Fled),
        stalemates: count(BattleVerdict::Stalemate),
        ..BattleSummary::default()
    };
    if records.is_empty() {
        return summary;
    }
    summary.win_rate = mean(records.iter().map(|r| {
        if r.verdict == BattleVerdict::Victory {
            1.0
        } else {
            0.0
        }
    }));
    summary.avg_rounds = mean(records.iter().map(|r| f64::from(r.rounds)));
    summary.avg_experience = mean(records.iter().map(|r| f64::from(r.experience)));
    summary.avg_gold = mean(records.iter().map(|r| f64::from(r.gold)));
    summary
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExpeditionSummary {
    pub expeditions: usize,
    pub successes: usize,
    pub success_rate: f64,
    pub avg_gold: f64,
    pub avg_hull_damage: f64,
    pub events_triggered: usize,
}

#[must_use]
pub fn summarize_expeditions(records: &[ExpeditionRecord]) -> ExpeditionSummary {
    let mut summary = ExpeditionSummary {
        expeditions: records.len(),
        successes: records.iter().filter(|r| r.success).count(),
        events_triggered: records.iter().map(|r| r.events.len()).sum(),
        ..ExpeditionSummary::default()
    };
    if records.is_empty() {
        return summary;
    }
    summary.success_rate = mean(records.iter().map(|r| if r.success { 1.0 } else { 0.0 }));
    summary.avg_gold = mean(records.iter().map(|r| {
        let clamped = r.gold_delta.clamp(i64::from(i32::MIN), i64::from(i32::MAX));
        f64::from(i32::try_from(clamped).unwrap_or(0))
    }));
    summary.avg_hull_damage = mean(records.iter().map(|r| f64::from(r.hull_damage)));
    summary
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (total, count) = values.fold((0.0, 0_u32), |(total, count), value| {
        (total + value, count.saturating_add(1))
    });
    if count == 0 {
        0.0
    } else {
        total / f64::from(count)
    }
}

/// Player action a strategy would open with against a fresh NPC; used by the
/// console report to describe each strategy.
#[must_use]
pub fn opening_action(strategy: Strategy, difficulty: NpcDifficulty) -> ActionChoice {
    let Ok(player) = CombatantState::from_record(&flagship()) else {
        return ActionChoice::Attack;
    };
    let npc = npc_opponent(&player, difficulty);
    strategy.pick(&player, &npc, &BalanceConfig::default().combat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn battles_replay_from_their_seed() {
        let balance = BalanceConfig::default();
        let config = SimulationConfig::new(1337, NpcDifficulty::Medium, Strategy::Balanced);
        let first = run_battle(&config, "PV-TEST00", &balance).unwrap();
        let second = run_battle(&config, "PV-TEST00", &balance).unwrap();
        assert_eq!(first.verdict, second.verdict);
        assert_eq!(first.turns, second.turns);
        assert_eq!(first.player_health, second.player_health);
        assert_eq!(first.rolls, second.rolls);
        assert!((50..=200).contains(&first.stakes));
    }

    #[test]
    fn every_strategy_reaches_a_verdict() {
        let balance = BalanceConfig::default();
        for strategy in [Strategy::Aggressive, Strategy::Balanced, Strategy::Cautious] {
            for seed in 0..20 {
                let config = SimulationConfig::new(seed, NpcDifficulty::Hard, strategy)
                    .with_initiative(Initiative::BySpeed);
                let record = run_battle(&config, "x", &balance).unwrap();
                assert!(record.rounds <= config.max_rounds);
                if record.verdict != BattleVerdict::Victory {
                    assert_eq!(record.experience, 0);
                    assert_eq!(record.gold, 0);
                }
            }
        }
    }

    #[test]
    fn victories_pay_out() {
        let balance = BalanceConfig::default();
        let records: Vec<BattleRecord> = (0..40)
            .map(|seed| {
                let config = SimulationConfig::new(seed, NpcDifficulty::Easy, Strategy::Balanced);
                run_battle(&config, "x", &balance).unwrap()
            })
            .collect();
        let summary = summarize_battles(&records);
        assert!(summary.victories > 0);
        for record in records.iter().filter(|r| r.verdict == BattleVerdict::Victory) {
            assert_eq!(record.experience, NpcDifficulty::Easy.xp_reward());
            assert!(record.gold >= record.stakes);
            assert_eq!(record.levels_gained, 0);
        }
    }

    #[test]
    fn harder_npcs_pay_a_larger_bounty() {
        let balance = BalanceConfig::default();
        let first_win = |difficulty: NpcDifficulty| {
            (0..200)
                .map(|seed| {
                    let config = SimulationConfig::new(seed, difficulty, Strategy::Aggressive);
                    run_battle(&config, "x", &balance).unwrap()
                })
                .find(|record| record.verdict == BattleVerdict::Victory)
        };
        let easy = first_win(NpcDifficulty::Easy).unwrap();
        assert_eq!(easy.experience, 15);
        if let Some(hard) = first_win(NpcDifficulty::Hard) {
            assert_eq!(hard.experience, 40);
            assert!(hard.experience > easy.experience);
        }
    }

    #[test]
    fn expeditions_are_deterministic() {
        let first = run_expedition(99, "PV-TEST01");
        let second = run_expedition(99, "PV-TEST01");
        assert_eq!(first.roll, second.roll);
        assert_eq!(first.events, second.events);
        assert_eq!(first.spice_price, second.spice_price);
        assert!((1..=10).contains(&first.region_difficulty));
        if !first.success {
            assert!(first.hull_damage >= 10);
        }
    }

    #[test]
    fn summaries_handle_empty_input() {
        let summary = summarize_battles(&[]);
        assert_eq!(summary.battles, 0);
        assert!(summary.win_rate.abs() < f64::EPSILON);
        assert_eq!(summarize_expeditions(&[]).expeditions, 0);
    }

    #[test]
    fn iteration_zero_is_the_base_seed() {
        assert_eq!(iteration_seed(42, 0), 42);
        assert_ne!(iteration_seed(42, 1), iteration_seed(42, 2));
    }
}
