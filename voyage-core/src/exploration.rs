//! Exploration rolls: a percentile check against a success rate, scaled
//! rewards or hull damage, and independently rolled random events.
use std::collections::BTreeSet;
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::constants::{
    EXPLORATION_BASE_EXPERIENCE, EXPLORATION_BASE_GOLD, EXPLORATION_DIFFICULTY_STEP,
    EXPLORATION_EXPERIENCE_PER_LEVEL, EXPLORATION_GOLD_PENALTY_PER_DIFFICULTY,
    EXPLORATION_GOLD_PER_LEVEL, EXPLORATION_HULL_DAMAGE_MAX, EXPLORATION_HULL_DAMAGE_MIN,
    LOG_EXPLORATION_FAILURE, LOG_EXPLORATION_SUCCESS, REGION_DIFFICULTY_MAX,
};
use crate::dice::Dice;
use crate::numbers::{clamp_i64_to_u32, floor_f64_to_u32};

/// Inputs to an exploration success rate, all in percentage points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExplorationCheck {
    pub base_rate: u32,
    pub skill_bonus: u32,
    pub equipment_bonus: u32,
    pub region_penalty: u32,
}

impl ExplorationCheck {
    /// Combined success rate, clamped to `0..=100`.
    #[must_use]
    pub fn success_rate(&self) -> u32 {
        let raw = i64::from(self.base_rate) + i64::from(self.skill_bonus)
            + i64::from(self.equipment_bonus)
            - i64::from(self.region_penalty);
        clamp_i64_to_u32(raw.clamp(0, 100))
    }
}

/// Hazard ratings of a sea region, each on a 1-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionProfile {
    pub pirate_activity: u32,
    pub weather_risk: u32,
    pub danger_level: u32,
}

impl RegionProfile {
    /// Mean of the three hazard ratings.
    #[must_use]
    pub fn danger_rating(&self) -> f64 {
        (f64::from(self.pirate_activity) + f64::from(self.weather_risk)
            + f64::from(self.danger_level))
            / 3.0
    }

    /// Region difficulty in `1..=10`.
    #[must_use]
    pub fn difficulty(&self) -> u32 {
        floor_f64_to_u32(self.danger_rating().round()).clamp(1, REGION_DIFFICULTY_MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventEffects {
    pub gold: i64,
    pub experience: u32,
    pub hull_damage: u32,
}

/// Something that may happen during an expedition, independent of whether
/// the expedition itself succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomEvent {
    pub id: EventId,
    /// Percent chance in `0..=100`.
    pub probability: u32,
    #[serde(default)]
    pub effects: EventEffects,
}

#[derive(Debug, Clone, Copy)]
pub struct ExplorationRequest<'a> {
    /// Percent chance in `0..=100`, see [`ExplorationCheck::success_rate`].
    pub success_rate: u32,
    /// Region difficulty in `1..=10`.
    pub region_difficulty: u32,
    pub captain_level: u32,
    pub event_pool: &'a [RandomEvent],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplorationStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorationRoll {
    pub status: ExplorationStatus,
    pub success: bool,
    pub roll: u32,
    pub success_rate: u32,
    pub gold_delta: i64,
    pub experience_delta: u32,
    pub hull_damage: u32,
    pub triggered_events: BTreeSet<EventId>,
}

/// Reward multiplier for a region difficulty.
#[must_use]
pub fn difficulty_multiplier(difficulty: u32) -> f64 {
    let steps = f64::from(difficulty.clamp(1, REGION_DIFFICULTY_MAX) - 1);
    EXPLORATION_DIFFICULTY_STEP.mul_add(steps, 1.0)
}

/// Roll one expedition.
///
/// The first percentile roll decides success (`roll <= success_rate`). A
/// failure costs `10..=30` hull and some gold. Every event in the pool is
/// then rolled on its own percentile die.
pub fn roll_exploration<D: Dice + ?Sized>(
    request: &ExplorationRequest<'_>,
    dice: &mut D,
) -> ExplorationRoll {
    let success_rate = request.success_rate.min(100);
    let difficulty = request.region_difficulty.clamp(1, REGION_DIFFICULTY_MAX);
    let roll = dice.percentile();
    let success = roll <= success_rate;

    let mut outcome = ExplorationRoll {
        status: ExplorationStatus::Completed,
        success,
        roll,
        success_rate,
        gold_delta: 0,
        experience_delta: 0,
        hull_damage: 0,
        triggered_events: BTreeSet::new(),
    };

    if success {
        let multiplier = difficulty_multiplier(difficulty);
        let level = request.captain_level;
        let gold = EXPLORATION_BASE_GOLD
            .saturating_add(EXPLORATION_GOLD_PER_LEVEL.saturating_mul(level));
        let experience = EXPLORATION_BASE_EXPERIENCE
            .saturating_add(EXPLORATION_EXPERIENCE_PER_LEVEL.saturating_mul(level));
        outcome.gold_delta = i64::from(floor_f64_to_u32(f64::from(gold) * multiplier));
        outcome.experience_delta = floor_f64_to_u32(f64::from(experience) * multiplier);
        debug!(
            "{LOG_EXPLORATION_SUCCESS} roll={roll} rate={success_rate} gold={} xp={}",
            outcome.gold_delta, outcome.experience_delta
        );
    } else {
        outcome.status = ExplorationStatus::Failed;
        outcome.hull_damage = clamp_i64_to_u32(dice.between(
            i64::from(EXPLORATION_HULL_DAMAGE_MIN),
            i64::from(EXPLORATION_HULL_DAMAGE_MAX),
        ));
        outcome.gold_delta = -EXPLORATION_GOLD_PENALTY_PER_DIFFICULTY * i64::from(difficulty);
        debug!(
            "{LOG_EXPLORATION_FAILURE} roll={roll} rate={success_rate} hull={}",
            outcome.hull_damage
        );
    }

    for event in request.event_pool {
        if dice.percentile() <= event.probability.min(100) {
            outcome.gold_delta = outcome.gold_delta.saturating_add(event.effects.gold);
            outcome.experience_delta = outcome
                .experience_delta
                .saturating_add(event.effects.experience);
            outcome.hull_damage = outcome.hull_damage.saturating_add(event.effects.hull_damage);
            outcome.triggered_events.insert(event.id.clone());
            debug!("exploration event triggered: {}", event.id);
        }
    }
    outcome
}
