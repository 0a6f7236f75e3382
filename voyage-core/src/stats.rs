//! Combatant stat model.
//!
//! External records (player ships, pirate fleets, NPC templates) come from a
//! record store with signed columns; everything the resolvers touch is the
//! normalized, validated [`CombatantState`].
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{MORALE_MAX, STAKES_MAX, STAKES_MIN};
use crate::dice::Dice;
use crate::numbers::{clamp_i64_to_u32, floor_f64_to_u32};

/// Reasons a stat snapshot cannot become a [`CombatantState`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidStatError {
    #[error("max_health must be greater than zero")]
    ZeroMaxHealth,
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: i64 },
    #[error("health {health} exceeds max_health {max_health}")]
    HealthExceedsMax { health: u32, max_health: u32 },
    #[error("morale must be between 0 and 100 (got {0})")]
    MoraleOutOfRange(i64),
}

/// Origin of a stat snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatantKind {
    Ship,
    Fleet,
    Npc,
}

/// Raw stat snapshot as read from the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantRecord {
    pub kind: CombatantKind,
    pub name: String,
    pub health: i64,
    pub max_health: i64,
    pub attack: i64,
    pub defense: i64,
    pub speed: i64,
    pub crew: i64,
    pub morale: i64,
}

impl CombatantRecord {
    /// Snapshot of a pirate fleet. Fleets fight at full strength with
    /// neutral morale.
    #[must_use]
    pub fn from_fleet(
        name: &str,
        total_health: i64,
        total_attack: i64,
        total_defense: i64,
        fleet_speed: i64,
        total_ships: i64,
    ) -> Self {
        Self {
            kind: CombatantKind::Fleet,
            name: name.to_string(),
            health: total_health,
            max_health: total_health,
            attack: total_attack,
            defense: total_defense,
            speed: fleet_speed,
            crew: total_ships.saturating_mul(20),
            morale: 50,
        }
    }
}

/// Uniform combat record used by all resolution math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatantState {
    pub health: u32,
    pub max_health: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
    pub crew: u32,
    pub morale: u8,
}

impl CombatantState {
    /// Normalize a store record.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidStatError`] when a stat is negative, `max_health` is
    /// zero, `health` exceeds `max_health`, or morale leaves `0..=100`.
    pub fn from_record(record: &CombatantRecord) -> Result<Self, InvalidStatError> {
        let health = non_negative("health", record.health)?;
        let max_health = non_negative("max_health", record.max_health)?;
        let attack = non_negative("attack", record.attack)?;
        let defense = non_negative("defense", record.defense)?;
        let speed = non_negative("speed", record.speed)?;
        let crew = non_negative("crew", record.crew)?;
        let morale = u8::try_from(record.morale)
            .ok()
            .filter(|value| *value <= MORALE_MAX)
            .ok_or(InvalidStatError::MoraleOutOfRange(record.morale))?;

        let state = Self {
            health,
            max_health,
            attack,
            defense,
            speed,
            crew,
            morale,
        };
        state.validate()?;
        Ok(state)
    }

    /// Check the invariants of an already typed state.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidStatError`] when `max_health` is zero, health exceeds
    /// it, or morale is above 100.
    pub fn validate(&self) -> Result<(), InvalidStatError> {
        if self.max_health == 0 {
            return Err(InvalidStatError::ZeroMaxHealth);
        }
        if self.health > self.max_health {
            return Err(InvalidStatError::HealthExceedsMax {
                health: self.health,
                max_health: self.max_health,
            });
        }
        if self.morale > MORALE_MAX {
            return Err(InvalidStatError::MoraleOutOfRange(i64::from(self.morale)));
        }
        Ok(())
    }

    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        self.health == 0
    }

    /// Remove health, saturating at zero.
    pub fn take_damage(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
    }

    /// Restore health, capped at `max_health`. Returns the amount restored.
    pub fn restore(&mut self, amount: u32) -> u32 {
        let before = self.health;
        self.health = self.health.saturating_add(amount).min(self.max_health);
        self.health - before
    }

    pub fn shift_morale(&mut self, delta: i16) {
        let next = i16::from(self.morale).saturating_add(delta);
        self.morale = u8::try_from(next.clamp(0, i16::from(MORALE_MAX))).unwrap_or(0);
    }
}

fn non_negative(field: &'static str, value: i64) -> Result<u32, InvalidStatError> {
    if value < 0 {
        return Err(InvalidStatError::Negative { field, value });
    }
    Ok(clamp_i64_to_u32(value))
}

/// Preset strength of a generated NPC opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpcDifficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl NpcDifficulty {
    #[must_use]
    pub const fn health_mult(self) -> f64 {
        match self {
            Self::Easy => 0.8,
            Self::Medium => 1.0,
            Self::Hard => 1.3,
        }
    }

    #[must_use]
    pub const fn attack_mult(self) -> f64 {
        match self {
            Self::Easy => 0.9,
            Self::Medium => 1.0,
            Self::Hard => 1.2,
        }
    }

    /// Experience granted for defeating an NPC of this difficulty.
    #[must_use]
    pub const fn xp_reward(self) -> u32 {
        match self {
            Self::Easy => 15,
            Self::Medium => 25,
            Self::Hard => 40,
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl std::str::FromStr for NpcDifficulty {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(format!("unknown difficulty `{other}`")),
        }
    }
}

/// Scale the challenger's own ship into an NPC opponent, the way pirate
/// encounters are generated. The NPC starts at full health.
#[must_use]
pub fn npc_opponent(template: &CombatantState, difficulty: NpcDifficulty) -> CombatantState {
    let max_health =
        floor_f64_to_u32(f64::from(template.max_health) * difficulty.health_mult()).max(1);
    let attack = floor_f64_to_u32(f64::from(template.attack) * difficulty.attack_mult());
    CombatantState {
        health: max_health,
        max_health,
        attack,
        defense: template.defense,
        speed: template.speed,
        crew: template.crew,
        morale: 50,
    }
}

/// Roll the gold wagered on an NPC battle.
pub fn roll_stakes<D: Dice + ?Sized>(dice: &mut D) -> u32 {
    clamp_i64_to_u32(dice.between(i64::from(STAKES_MIN), i64::from(STAKES_MAX)))
}
