//! Action resolver: one combatant's action against its opponent for one turn.
//!
//! Resolution is pure. Inputs are borrowed immutably and the caller receives
//! updated copies of both combatants alongside the [`TurnResult`] log entry,
//! so a failed call never leaves half-applied damage behind.
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::battle::{Side, Winner};
use crate::config::{CombatConfig, RollRange};
use crate::constants::{
    BOARD_CREW_DAMAGE_DIVISOR, BOARD_MORALE_BOOST, BOARD_MORALE_SHOCK,
    BOARD_REPELLED_DAMAGE_MAX, BOARD_REPELLED_DAMAGE_MIN, BOARD_REPELLED_MORALE_LOSS,
    LOG_ATTACK_HIT, LOG_ATTACK_MISS, LOG_BOARD_REPELLED, LOG_BOARD_SUCCESS, LOG_FLEE_FAILED,
    LOG_FLEE_SUCCESS, LOG_RAM, LOG_REPAIR, MORALE_NEUTRAL, SKILL_ACCURACY_PER_POINT,
};
use crate::dice::Dice;
use crate::error::CombatError;
use crate::numbers::clamp_i64_to_u32;
use crate::stats::CombatantState;

/// Fixed set of actions a combatant may take on its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionChoice {
    Attack,
    Ram,
    Board,
    Repair,
    Flee,
}

impl ActionChoice {
    pub const ALL: [Self; 5] = [Self::Attack, Self::Ram, Self::Board, Self::Repair, Self::Flee];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Attack => "attack",
            Self::Ram => "ram",
            Self::Board => "board",
            Self::Repair => "repair",
            Self::Flee => "flee",
        }
    }

    /// Declared resource cost of the action under the given balance.
    #[must_use]
    pub const fn cost(self, cfg: &CombatConfig) -> ActionCost {
        match self {
            Self::Attack => ActionCost {
                ammunition: 1,
                self_damage: None,
                offensive: true,
            },
            Self::Ram => ActionCost {
                ammunition: 0,
                self_damage: Some(cfg.ram_self_damage),
                offensive: true,
            },
            Self::Board => ActionCost {
                ammunition: 0,
                self_damage: Some(RollRange::new(
                    BOARD_REPELLED_DAMAGE_MIN,
                    BOARD_REPELLED_DAMAGE_MAX,
                )),
                offensive: true,
            },
            Self::Repair | Self::Flee => ActionCost {
                ammunition: 0,
                self_damage: None,
                offensive: false,
            },
        }
    }
}

impl fmt::Display for ActionChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ActionChoice {
    type Err = CombatError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "attack" | "cannon" | "normal" => Ok(Self::Attack),
            "ram" | "ramming" => Ok(Self::Ram),
            "board" | "boarding" => Ok(Self::Board),
            "repair" => Ok(Self::Repair),
            "flee" => Ok(Self::Flee),
            _ => Err(CombatError::InvalidAction(value.to_string())),
        }
    }
}

/// What an action consumes from the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCost {
    /// Rounds of shot spent.
    pub ammunition: u32,
    /// Hull damage the actor risks (always taken for Ram, on failure for Board).
    pub self_damage: Option<RollRange>,
    /// Whether the action can damage the opponent this turn.
    pub offensive: bool,
}

/// Immutable log entry produced once per resolved turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnResult {
    pub turn_number: u32,
    pub acting_side: Side,
    pub action: ActionChoice,
    pub success: bool,
    pub damage_dealt: u32,
    pub damage_received: u32,
    pub description: String,
    pub terminal: bool,
    pub winner: Option<Winner>,
}

impl TurnResult {
    /// True when this turn ended the battle through a successful escape.
    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.terminal && self.winner.is_none() && self.action == ActionChoice::Flee
    }
}

/// Per-turn inputs that are not combatant stats.
#[derive(Debug, Clone, Copy)]
pub struct TurnContext<'a> {
    pub side: Side,
    /// Accuracy added to the base hit chance, see [`skill_bonus_for`].
    pub skill_bonus: f64,
    /// One-based turn counter stamped on the result.
    pub turn_number: u32,
    pub config: &'a CombatConfig,
}

/// A resolved turn plus the post-turn combatant copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnResolution {
    pub result: TurnResult,
    pub actor: CombatantState,
    pub opponent: CombatantState,
}

/// Accuracy bonus granted by a captain's combat skill.
#[must_use]
pub fn skill_bonus_for(combat_skill: u32) -> f64 {
    f64::from(combat_skill) * SKILL_ACCURACY_PER_POINT
}

struct Effect {
    success: bool,
    damage_dealt: u32,
    damage_received: u32,
    escaped: bool,
    description: String,
}

/// Resolve exactly one action of `actor` against `opponent`.
///
/// # Errors
///
/// * [`CombatError::InvalidStat`] when either combatant breaks its invariants.
/// * [`CombatError::ActorDefeated`] when the actor has no health left.
/// * [`CombatError::CombatantDown`] when the opponent is already defeated.
pub fn resolve_turn<D: Dice + ?Sized>(
    actor: &CombatantState,
    opponent: &CombatantState,
    action: ActionChoice,
    ctx: &TurnContext<'_>,
    dice: &mut D,
) -> Result<TurnResolution, CombatError> {
    actor.validate()?;
    opponent.validate()?;
    if actor.is_defeated() {
        return Err(CombatError::ActorDefeated(ctx.side));
    }
    if opponent.is_defeated() {
        return Err(CombatError::CombatantDown(ctx.side.opponent()));
    }

    let mut actor = *actor;
    let mut opponent = *opponent;
    let effect = match action {
        ActionChoice::Attack => attack(&actor, &mut opponent, ctx, dice),
        ActionChoice::Ram => ram(&mut actor, &mut opponent, ctx.config, dice),
        ActionChoice::Repair => repair(&mut actor, ctx.config, dice),
        ActionChoice::Board => board(&mut actor, &mut opponent, ctx.config, dice),
        ActionChoice::Flee => flee(&actor, &opponent, ctx.config, dice),
    };

    let (terminal, winner) = if effect.escaped {
        (true, None)
    } else {
        match (actor.is_defeated(), opponent.is_defeated()) {
            (true, true) => (true, Some(Winner::Draw)),
            (false, true) => (true, Some(Winner::from(ctx.side))),
            (true, false) => (true, Some(Winner::from(ctx.side.opponent()))),
            (false, false) => (false, None),
        }
    };

    let result = TurnResult {
        turn_number: ctx.turn_number,
        acting_side: ctx.side,
        action,
        success: effect.success,
        damage_dealt: effect.damage_dealt,
        damage_received: effect.damage_received,
        description: effect.description,
        terminal,
        winner,
    };
    Ok(TurnResolution {
        result,
        actor,
        opponent,
    })
}

fn attack<D: Dice + ?Sized>(
    actor: &CombatantState,
    opponent: &mut CombatantState,
    ctx: &TurnContext<'_>,
    dice: &mut D,
) -> Effect {
    let cfg = ctx.config;
    let accuracy = (cfg.base_accuracy + ctx.skill_bonus).clamp(0.0, 1.0);
    let draw = dice.chance();
    if draw >= accuracy {
        debug!("{LOG_ATTACK_MISS} side={} draw={draw:.3} accuracy={accuracy:.3}", ctx.side);
        return Effect {
            success: false,
            damage_dealt: 0,
            damage_received: 0,
            escaped: false,
            description: String::from("The broadside misses."),
        };
    }

    let variance = i64::from(cfg.attack_variance);
    let swing = dice.between(-variance, variance);
    let raw = i64::from(actor.attack) + swing - i64::from(opponent.defense / 2);
    let damage = clamp_i64_to_u32(raw.max(i64::from(cfg.min_damage)));
    opponent.take_damage(damage);
    debug!(
        "{LOG_ATTACK_HIT} side={} swing={swing} damage={damage} target_hp={}",
        ctx.side, opponent.health
    );
    Effect {
        success: true,
        damage_dealt: damage,
        damage_received: 0,
        escaped: false,
        description: format!("A clean hit! The broadside deals {damage} damage."),
    }
}

fn roll_in<D: Dice + ?Sized>(dice: &mut D, range: RollRange) -> u32 {
    clamp_i64_to_u32(dice.between(i64::from(range.min), i64::from(range.max)))
}

fn ram<D: Dice + ?Sized>(
    actor: &mut CombatantState,
    opponent: &mut CombatantState,
    cfg: &CombatConfig,
    dice: &mut D,
) -> Effect {
    let dealt = (actor.attack / 2).saturating_add(roll_in(dice, cfg.ram_bonus));
    let received = roll_in(dice, cfg.ram_self_damage);
    opponent.take_damage(dealt);
    actor.take_damage(received);
    debug!("{LOG_RAM} dealt={dealt} received={received}");
    Effect {
        success: true,
        damage_dealt: dealt,
        damage_received: received,
        escaped: false,
        description: format!("Ramming speed! Dealt {dealt} damage but took {received}."),
    }
}

fn repair<D: Dice + ?Sized>(
    actor: &mut CombatantState,
    cfg: &CombatConfig,
    dice: &mut D,
) -> Effect {
    let amount = roll_in(dice, cfg.repair);
    let restored = actor.restore(amount);
    debug!("{LOG_REPAIR} rolled={amount} restored={restored}");
    Effect {
        success: true,
        damage_dealt: 0,
        damage_received: 0,
        escaped: false,
        description: format!("The carpenters patch the hull, restoring {restored} health."),
    }
}

/// Chance that a boarding party carries the enemy deck.
#[must_use]
pub fn board_chance(actor: &CombatantState, opponent: &CombatantState, cfg: &CombatConfig) -> f64 {
    let board = &cfg.board;
    let crew_total = f64::from(actor.crew) + f64::from(opponent.crew);
    let advantage = if crew_total > 0.0 {
        (f64::from(actor.crew) - f64::from(opponent.crew)) / crew_total
    } else {
        0.0
    };
    let morale = (f64::from(actor.morale) - MORALE_NEUTRAL) / board.morale_divisor;
    board
        .crew_weight
        .mul_add(advantage, board.base_chance + morale)
        .clamp(board.min_chance, board.max_chance)
}

fn board<D: Dice + ?Sized>(
    actor: &mut CombatantState,
    opponent: &mut CombatantState,
    cfg: &CombatConfig,
    dice: &mut D,
) -> Effect {
    let chance = board_chance(actor, opponent, cfg);
    let draw = dice.chance();
    if draw < chance {
        let dealt = (actor.attack / 2)
            .saturating_add(actor.crew / BOARD_CREW_DAMAGE_DIVISOR)
            .max(cfg.min_damage);
        opponent.take_damage(dealt);
        opponent.shift_morale(-i16::from(BOARD_MORALE_SHOCK));
        actor.shift_morale(i16::from(BOARD_MORALE_BOOST));
        debug!("{LOG_BOARD_SUCCESS} chance={chance:.3} dealt={dealt}");
        return Effect {
            success: true,
            damage_dealt: dealt,
            damage_received: 0,
            escaped: false,
            description: format!("Boarders swarm the enemy deck, dealing {dealt} damage."),
        };
    }

    let received = roll_in(
        dice,
        RollRange::new(BOARD_REPELLED_DAMAGE_MIN, BOARD_REPELLED_DAMAGE_MAX),
    );
    actor.take_damage(received);
    actor.shift_morale(-i16::from(BOARD_REPELLED_MORALE_LOSS));
    debug!("{LOG_BOARD_REPELLED} chance={chance:.3} received={received}");
    Effect {
        success: false,
        damage_dealt: 0,
        damage_received: received,
        escaped: false,
        description: format!("The boarding party is repelled, costing {received} damage."),
    }
}

/// Chance that an escape attempt succeeds.
#[must_use]
pub fn flee_chance(actor: &CombatantState, opponent: &CombatantState, cfg: &CombatConfig) -> f64 {
    let flee = &cfg.flee;
    let speed_gap = f64::from(actor.speed) - f64::from(opponent.speed);
    flee.speed_weight
        .mul_add(speed_gap, flee.base_chance)
        .clamp(flee.min_chance, flee.max_chance)
}

fn flee<D: Dice + ?Sized>(
    actor: &CombatantState,
    opponent: &CombatantState,
    cfg: &CombatConfig,
    dice: &mut D,
) -> Effect {
    let chance = flee_chance(actor, opponent, cfg);
    let escaped = dice.chance() < chance;
    if escaped {
        debug!("{LOG_FLEE_SUCCESS} chance={chance:.3}");
    } else {
        debug!("{LOG_FLEE_FAILED} chance={chance:.3}");
    }
    Effect {
        success: escaped,
        damage_dealt: 0,
        damage_received: 0,
        escaped,
        description: if escaped {
            String::from("The ship slips away under full sail.")
        } else {
            String::from("The enemy cuts off the escape.")
        },
    }
}
