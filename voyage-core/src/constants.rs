//! Centralized balance and tuning constants for Age of Voyage combat logic.
//!
//! These values back the fallback `BalanceConfig` and the formulas whose
//! numbers are fixed by the rules (reward base, leveling cap). Keeping them
//! together ensures balance changes land in one reviewed place.

// Log keys -----------------------------------------------------------------
pub(crate) const LOG_ATTACK_HIT: &str = "log.combat.attack.hit";
pub(crate) const LOG_ATTACK_MISS: &str = "log.combat.attack.miss";
pub(crate) const LOG_RAM: &str = "log.combat.ram";
pub(crate) const LOG_REPAIR: &str = "log.combat.repair";
pub(crate) const LOG_BOARD_SUCCESS: &str = "log.combat.board.success";
pub(crate) const LOG_BOARD_REPELLED: &str = "log.combat.board.repelled";
pub(crate) const LOG_FLEE_SUCCESS: &str = "log.combat.flee.success";
pub(crate) const LOG_FLEE_FAILED: &str = "log.combat.flee.failed";
pub(crate) const LOG_EXPLORATION_SUCCESS: &str = "log.exploration.success";
pub(crate) const LOG_EXPLORATION_FAILURE: &str = "log.exploration.failure";

// Attack -------------------------------------------------------------------
pub(crate) const ATTACK_BASE_ACCURACY: f64 = 0.8;
pub(crate) const ATTACK_VARIANCE: i64 = 10;
pub(crate) const ATTACK_MIN_DAMAGE: u32 = 1;
pub(crate) const SKILL_ACCURACY_PER_POINT: f64 = 0.02;

// Ram ----------------------------------------------------------------------
pub(crate) const RAM_BONUS_MIN: u32 = 5;
pub(crate) const RAM_BONUS_MAX: u32 = 15;
pub(crate) const RAM_SELF_DAMAGE_MIN: u32 = 5;
pub(crate) const RAM_SELF_DAMAGE_MAX: u32 = 10;

// Repair -------------------------------------------------------------------
pub(crate) const REPAIR_MIN: u32 = 10;
pub(crate) const REPAIR_MAX: u32 = 20;

// Board --------------------------------------------------------------------
pub(crate) const BOARD_BASE_CHANCE: f64 = 0.35;
pub(crate) const BOARD_CREW_WEIGHT: f64 = 0.30;
pub(crate) const BOARD_MORALE_DIVISOR: f64 = 200.0;
pub(crate) const BOARD_MIN_CHANCE: f64 = 0.05;
pub(crate) const BOARD_MAX_CHANCE: f64 = 0.95;
pub(crate) const BOARD_CREW_DAMAGE_DIVISOR: u32 = 4;
pub(crate) const BOARD_MORALE_SHOCK: u8 = 15;
pub(crate) const BOARD_MORALE_BOOST: u8 = 5;
pub(crate) const BOARD_REPELLED_MORALE_LOSS: u8 = 10;
pub(crate) const BOARD_REPELLED_DAMAGE_MIN: u32 = 5;
pub(crate) const BOARD_REPELLED_DAMAGE_MAX: u32 = 15;

// Flee ---------------------------------------------------------------------
pub(crate) const FLEE_BASE_CHANCE: f64 = 0.5;
pub(crate) const FLEE_SPEED_WEIGHT: f64 = 0.02;
pub(crate) const FLEE_MIN_CHANCE: f64 = 0.1;
pub(crate) const FLEE_MAX_CHANCE: f64 = 0.9;

// Morale -------------------------------------------------------------------
pub(crate) const MORALE_MAX: u8 = 100;
pub(crate) const MORALE_NEUTRAL: f64 = 50.0;

// Rewards ------------------------------------------------------------------
pub(crate) const REWARD_BASE_EXPERIENCE: u32 = 100;
pub(crate) const REWARD_EXPERIENCE_PER_LEVEL_GAP: u32 = 10;
pub(crate) const STAKES_MIN: u32 = 50;
pub(crate) const STAKES_MAX: u32 = 200;

// Leveling -----------------------------------------------------------------
pub(crate) const LEVEL_CAP: u32 = 100;
pub(crate) const INITIAL_EXPERIENCE_TO_NEXT: u32 = 100;
pub(crate) const GEOMETRIC_GROWTH: f64 = 1.2;
pub(crate) const FLAT_LEVEL_BUCKET: u32 = 1_000;

// Exploration --------------------------------------------------------------
pub(crate) const EXPLORATION_BASE_GOLD: u32 = 100;
pub(crate) const EXPLORATION_GOLD_PER_LEVEL: u32 = 10;
pub(crate) const EXPLORATION_BASE_EXPERIENCE: u32 = 50;
pub(crate) const EXPLORATION_EXPERIENCE_PER_LEVEL: u32 = 5;
pub(crate) const EXPLORATION_DIFFICULTY_STEP: f64 = 0.25;
pub(crate) const EXPLORATION_HULL_DAMAGE_MIN: u32 = 10;
pub(crate) const EXPLORATION_HULL_DAMAGE_MAX: u32 = 30;
pub(crate) const EXPLORATION_GOLD_PENALTY_PER_DIFFICULTY: i64 = 10;
pub(crate) const REGION_DIFFICULTY_MAX: u32 = 10;

// Trade --------------------------------------------------------------------
pub(crate) const TRADE_SPREAD_DIVISOR: u64 = 10;
pub(crate) const TRADE_EMPTY_SUPPLY_MODIFIER: f64 = 2.0;
pub(crate) const TRADE_RISING_THRESHOLD: f64 = 1.1;
pub(crate) const TRADE_FALLING_THRESHOLD: f64 = 0.9;
pub(crate) const TRADE_NEUTRAL_PROSPERITY: i64 = 5;
pub(crate) const TRADE_SHOCK_DIVISOR: f64 = 10.0;
pub(crate) const BASIS_POINTS: u64 = 10_000;
