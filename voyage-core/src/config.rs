//! Balance configuration for combat resolution.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    ATTACK_BASE_ACCURACY, ATTACK_MIN_DAMAGE, ATTACK_VARIANCE, BOARD_BASE_CHANCE,
    BOARD_CREW_WEIGHT, BOARD_MAX_CHANCE, BOARD_MIN_CHANCE, BOARD_MORALE_DIVISOR,
    FLEE_BASE_CHANCE, FLEE_MAX_CHANCE, FLEE_MIN_CHANCE, FLEE_SPEED_WEIGHT, RAM_BONUS_MAX,
    RAM_BONUS_MIN, RAM_SELF_DAMAGE_MAX, RAM_SELF_DAMAGE_MIN, REPAIR_MAX, REPAIR_MIN,
};
use crate::reward::LevelingRule;

const DEFAULT_BALANCE_DATA: &str = include_str!("../data/balance.json");

/// Errors raised when balance configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} range invalid (min {min} > max {max})")]
    RangeBounds {
        field: &'static str,
        min: u32,
        max: u32,
    },
    #[error("{field} must be between 0.00 and 1.00 (got {value:.2})")]
    Probability { field: &'static str, value: f64 },
    #[error("{field} chance bounds invalid (min {min:.2} > max {max:.2})")]
    ChanceBounds {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{field} must be positive (got {value:.2})")]
    NonPositive { field: &'static str, value: f64 },
    #[error("balance data could not be parsed: {0}")]
    Parse(String),
}

/// Inclusive integer range used for uniform rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollRange {
    pub min: u32,
    pub max: u32,
}

impl RollRange {
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub const fn contains(&self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::RangeBounds {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Success-probability contract for boarding actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub base_chance: f64,
    /// Weight of the normalized crew advantage, in `[-1, 1]` before scaling.
    pub crew_weight: f64,
    /// Morale above/below 50 is divided by this before being added.
    pub morale_divisor: f64,
    pub min_chance: f64,
    pub max_chance: f64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            base_chance: BOARD_BASE_CHANCE,
            crew_weight: BOARD_CREW_WEIGHT,
            morale_divisor: BOARD_MORALE_DIVISOR,
            min_chance: BOARD_MIN_CHANCE,
            max_chance: BOARD_MAX_CHANCE,
        }
    }
}

/// Success-probability contract for escape attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleeConfig {
    pub base_chance: f64,
    /// Chance gained per point of speed advantage.
    pub speed_weight: f64,
    pub min_chance: f64,
    pub max_chance: f64,
}

impl Default for FleeConfig {
    fn default() -> Self {
        Self {
            base_chance: FLEE_BASE_CHANCE,
            speed_weight: FLEE_SPEED_WEIGHT,
            min_chance: FLEE_MIN_CHANCE,
            max_chance: FLEE_MAX_CHANCE,
        }
    }
}

/// Tunables consumed by the action resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatConfig {
    pub base_accuracy: f64,
    /// Attack damage varies uniformly in `[-attack_variance, attack_variance]`.
    pub attack_variance: u32,
    pub min_damage: u32,
    pub ram_bonus: RollRange,
    pub ram_self_damage: RollRange,
    pub repair: RollRange,
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub flee: FleeConfig,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            base_accuracy: ATTACK_BASE_ACCURACY,
            attack_variance: u32::try_from(ATTACK_VARIANCE).unwrap_or(10),
            min_damage: ATTACK_MIN_DAMAGE,
            ram_bonus: RollRange::new(RAM_BONUS_MIN, RAM_BONUS_MAX),
            ram_self_damage: RollRange::new(RAM_SELF_DAMAGE_MIN, RAM_SELF_DAMAGE_MAX),
            repair: RollRange::new(REPAIR_MIN, REPAIR_MAX),
            board: BoardConfig::default(),
            flee: FleeConfig::default(),
        }
    }
}

impl CombatConfig {
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        probability("combat.base_accuracy", self.base_accuracy)?;
        self.ram_bonus.validate("combat.ram_bonus")?;
        self.ram_self_damage.validate("combat.ram_self_damage")?;
        self.repair.validate("combat.repair")?;
        for (field, range) in [
            ("combat.ram_bonus", self.ram_bonus),
            ("combat.ram_self_damage", self.ram_self_damage),
        ] {
            if range.min == 0 {
                return Err(ConfigError::RangeBounds {
                    field,
                    min: 0,
                    max: range.max,
                });
            }
        }
        probability("combat.board.base_chance", self.board.base_chance)?;
        chance_bounds(
            "combat.board",
            self.board.min_chance,
            self.board.max_chance,
        )?;
        if self.board.morale_divisor <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "combat.board.morale_divisor",
                value: self.board.morale_divisor,
            });
        }
        probability("combat.flee.base_chance", self.flee.base_chance)?;
        chance_bounds("combat.flee", self.flee.min_chance, self.flee.max_chance)?;
        Ok(())
    }
}

/// Complete balance sheet shipped with the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceConfig {
    pub combat: CombatConfig,
    #[serde(default)]
    pub leveling: LevelingRule,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self::from_json(DEFAULT_BALANCE_DATA).unwrap_or_else(|err| {
            log::warn!("bundled balance data rejected, using built-in values: {err}");
            Self {
                combat: CombatConfig::default(),
                leveling: LevelingRule::default(),
            }
        })
    }
}

impl BalanceConfig {
    /// Parse and validate a balance sheet.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and any validation
    /// error for out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.combat.validate()?;
        self.leveling.validate()
    }
}

pub(crate) fn probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Probability { field, value });
    }
    Ok(())
}

fn chance_bounds(field: &'static str, min: f64, max: f64) -> Result<(), ConfigError> {
    probability(field, min)?;
    probability(field, max)?;
    if min > max {
        return Err(ConfigError::ChanceBounds { field, min, max });
    }
    Ok(())
}
