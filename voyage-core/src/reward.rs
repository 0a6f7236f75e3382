//! Reward and progression arithmetic.
use serde::{Deserialize, Serialize};

use crate::battle::{Resolution, Side};
use crate::config::ConfigError;
use crate::constants::{
    FLAT_LEVEL_BUCKET, GEOMETRIC_GROWTH, INITIAL_EXPERIENCE_TO_NEXT, LEVEL_CAP,
    REWARD_BASE_EXPERIENCE, REWARD_EXPERIENCE_PER_LEVEL_GAP,
};
use crate::numbers::floor_f64_to_u32;
use crate::stats::NpcDifficulty;

/// Experience and gold earned by the winner of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RewardResult {
    pub experience: u32,
    pub gold: u32,
    /// Part of `gold` taken from the loser's purse.
    #[serde(default)]
    pub seized: u32,
}

/// Compute the winner's rewards.
///
/// Experience is a flat base plus a bonus for beating a higher-level
/// opponent. Gold is the stakes plus up to half the stakes again, taken from
/// whatever the loser carries. Draws and escapes pay nothing.
#[must_use]
pub fn compute_rewards(
    resolution: Resolution,
    winner_level: u32,
    loser_level: u32,
    stakes: u32,
    loser_gold: u32,
) -> RewardResult {
    if !matches!(resolution, Resolution::Victory(_)) {
        return RewardResult::default();
    }
    winner_rewards(REWARD_BASE_EXPERIENCE, winner_level, loser_level, stakes, loser_gold)
}

fn winner_rewards(
    base_experience: u32,
    winner_level: u32,
    loser_level: u32,
    stakes: u32,
    loser_gold: u32,
) -> RewardResult {
    let gap = loser_level.saturating_sub(winner_level);
    let experience =
        base_experience.saturating_add(gap.saturating_mul(REWARD_EXPERIENCE_PER_LEVEL_GAP));
    let seized = loser_gold.min(stakes / 2);
    RewardResult {
        experience,
        gold: stakes.saturating_add(seized),
        seized,
    }
}

const fn default_base_experience() -> u32 {
    REWARD_BASE_EXPERIENCE
}

/// Levels and purses of both sides, used when a battle is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTerms {
    pub level_a: u32,
    pub level_b: u32,
    pub gold_a: u32,
    pub gold_b: u32,
    pub stakes: u32,
    /// Experience paid for any victory before the level-gap bonus.
    #[serde(default = "default_base_experience")]
    pub base_experience: u32,
}

impl Default for RewardTerms {
    fn default() -> Self {
        Self {
            level_a: 1,
            level_b: 1,
            gold_a: 0,
            gold_b: 0,
            stakes: 0,
            base_experience: REWARD_BASE_EXPERIENCE,
        }
    }
}

impl RewardTerms {
    #[must_use]
    pub const fn level(&self, side: Side) -> u32 {
        match side {
            Side::A => self.level_a,
            Side::B => self.level_b,
        }
    }

    #[must_use]
    pub const fn gold(&self, side: Side) -> u32 {
        match side {
            Side::A => self.gold_a,
            Side::B => self.gold_b,
        }
    }

    /// Side B is a generated NPC: a victory pays its difficulty's bounty
    /// instead of the duel base.
    #[must_use]
    pub const fn against_npc(mut self, difficulty: NpcDifficulty) -> Self {
        self.base_experience = difficulty.xp_reward();
        self
    }

    /// Rewards owed for `resolution` under these terms.
    #[must_use]
    pub fn rewards(&self, resolution: Resolution) -> RewardResult {
        let Resolution::Victory(winner) = resolution else {
            return RewardResult::default();
        };
        let loser = winner.opponent();
        winner_rewards(
            self.base_experience,
            self.level(winner),
            self.level(loser),
            self.stakes,
            self.gold(loser),
        )
    }
}

/// How accumulated experience turns into levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum LevelingRule {
    /// Spend the current threshold to gain a level, then grow the threshold.
    Geometric { growth: f64 },
    /// One level per fixed bucket of total experience.
    Flat { bucket: u32 },
}

impl Default for LevelingRule {
    fn default() -> Self {
        Self::Geometric {
            growth: GEOMETRIC_GROWTH,
        }
    }
}

impl LevelingRule {
    #[must_use]
    pub const fn flat() -> Self {
        Self::Flat {
            bucket: FLAT_LEVEL_BUCKET,
        }
    }

    /// # Errors
    ///
    /// Geometric growth must exceed 1.0 and flat buckets must be non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Geometric { growth } if growth <= 1.0 => Err(ConfigError::NonPositive {
                field: "leveling.growth",
                value: growth - 1.0,
            }),
            Self::Flat { bucket: 0 } => Err(ConfigError::NonPositive {
                field: "leveling.bucket",
                value: 0.0,
            }),
            _ => Ok(()),
        }
    }
}

/// A captain's level track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub level: u32,
    pub experience: u32,
    pub experience_to_next: u32,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0,
            experience_to_next: INITIAL_EXPERIENCE_TO_NEXT,
        }
    }
}

impl Progression {
    /// Add experience and apply level-ups. Returns the number of levels
    /// gained.
    pub fn add_experience(&mut self, amount: u32, rule: &LevelingRule) -> u32 {
        let before = self.level;
        self.experience = self.experience.saturating_add(amount);
        match *rule {
            LevelingRule::Geometric { growth } => {
                while self.level < LEVEL_CAP
                    && self.experience_to_next > 0
                    && self.experience >= self.experience_to_next
                {
                    self.experience -= self.experience_to_next;
                    self.level += 1;
                    self.experience_to_next =
                        floor_f64_to_u32(f64::from(self.experience_to_next) * growth);
                }
            }
            LevelingRule::Flat { bucket } => {
                if bucket > 0 {
                    self.level = (self.experience / bucket).saturating_add(1).max(self.level);
                    self.experience_to_next = bucket - self.experience % bucket;
                }
            }
        }
        self.level - before
    }
}
