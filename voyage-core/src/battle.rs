//! Battle state machine.
//!
//! A [`BattleState`] is an immutable snapshot. Every transition returns a new
//! snapshot, so a rejected call leaves the caller's copy untouched.
use std::collections::HashSet;
use std::fmt;

use log::info;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::action::{
    ActionChoice, TurnContext, TurnResolution, TurnResult, resolve_turn, skill_bonus_for,
};
use crate::config::CombatConfig;
use crate::dice::Dice;
use crate::error::CombatError;
use crate::reward::{RewardResult, RewardTerms};
use crate::stats::CombatantState;

/// One of the two participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::A => "A",
            Self::B => "B",
        })
    }
}

/// Decided result of a terminal turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Winner {
    A,
    B,
    Draw,
}

impl From<Side> for Winner {
    fn from(side: Side) -> Self {
        match side {
            Side::A => Self::A,
            Side::B => Self::B,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattlePhase {
    Preparing,
    InProgress,
    Completed,
    Fled,
}

impl BattlePhase {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Fled)
    }
}

/// Who opens each round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Initiative {
    /// Side A (the challenger or player) always opens.
    #[default]
    SideAFirst,
    /// The faster side opens; ties go to side A.
    BySpeed,
}

impl std::str::FromStr for Initiative {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "player-first" | "side-a-first" | "a-first" => Ok(Self::SideAFirst),
            "by-speed" | "speed" => Ok(Self::BySpeed),
            other => Err(format!("unknown initiative `{other}`")),
        }
    }
}

/// Everything about a battle that is fixed when it opens.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BattleConfig {
    pub initiative: Initiative,
    pub combat: CombatConfig,
    /// Captain combat skill for side A.
    pub skill_a: u32,
    /// Captain combat skill for side B.
    pub skill_b: u32,
    pub rewards: RewardTerms,
    /// Store id of side A; empty for battles not backed by records.
    #[serde(default)]
    pub challenger: String,
    /// Store id of side B.
    #[serde(default)]
    pub defender: String,
}

impl BattleConfig {
    /// Store id of `side`.
    #[must_use]
    pub fn record_id(&self, side: Side) -> &str {
        match side {
            Side::A => &self.challenger,
            Side::B => &self.defender,
        }
    }
}

/// Rounds hold at most two turns.
pub type RoundTurns = SmallVec<[TurnResult; 2]>;

/// Snapshot of a battle between two combatants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleState {
    phase: BattlePhase,
    a: CombatantState,
    b: CombatantState,
    config: BattleConfig,
    turns: Vec<TurnResult>,
    round: u32,
    opener_acted: bool,
}

impl BattleState {
    #[must_use]
    pub fn new(a: CombatantState, b: CombatantState, config: BattleConfig) -> Self {
        Self {
            phase: BattlePhase::Preparing,
            a,
            b,
            config,
            turns: Vec::new(),
            round: 1,
            opener_acted: false,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> BattlePhase {
        self.phase
    }

    #[must_use]
    pub const fn combatant(&self, side: Side) -> &CombatantState {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &BattleConfig {
        &self.config
    }

    #[must_use]
    pub fn turns(&self) -> &[TurnResult] {
        &self.turns
    }

    /// One-based round counter. A finished battle reports the round it
    /// ended in.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Side that opens every round under the configured initiative.
    #[must_use]
    pub const fn opener(&self) -> Side {
        match self.config.initiative {
            Initiative::SideAFirst => Side::A,
            Initiative::BySpeed => {
                if self.b.speed > self.a.speed {
                    Side::B
                } else {
                    Side::A
                }
            }
        }
    }

    /// Side whose turn resolves next.
    #[must_use]
    pub const fn next_actor(&self) -> Side {
        let opener = self.opener();
        if self.opener_acted {
            opener.opponent()
        } else {
            opener
        }
    }

    const fn skill(&self, side: Side) -> u32 {
        match side {
            Side::A => self.config.skill_a,
            Side::B => self.config.skill_b,
        }
    }
}

/// Move a prepared battle into progress.
///
/// # Errors
///
/// * [`CombatError::AlreadyStarted`] when the battle is already running.
/// * [`CombatError::BattleAlreadyResolved`] when it has ended.
/// * [`CombatError::InvalidStat`] when either snapshot is malformed.
/// * [`CombatError::CombatantDown`] when either side has no health.
pub fn start_battle(state: &BattleState) -> Result<BattleState, CombatError> {
    match state.phase {
        BattlePhase::Preparing => {}
        BattlePhase::InProgress => return Err(CombatError::AlreadyStarted),
        BattlePhase::Completed | BattlePhase::Fled => {
            return Err(CombatError::BattleAlreadyResolved);
        }
    }
    for side in [Side::A, Side::B] {
        let combatant = state.combatant(side);
        combatant.validate()?;
        if combatant.is_defeated() {
            return Err(CombatError::CombatantDown(side));
        }
    }

    let mut next = state.clone();
    next.phase = BattlePhase::InProgress;
    info!(
        "battle started: A hp={} vs B hp={}, {} opens",
        next.a.health,
        next.b.health,
        next.opener()
    );
    Ok(next)
}

/// Resolve one turn for [`BattleState::next_actor`].
///
/// # Errors
///
/// * [`CombatError::NotStarted`] before [`start_battle`].
/// * [`CombatError::BattleAlreadyResolved`] once a terminal turn was logged.
/// * Anything [`resolve_turn`] rejects.
pub fn advance_battle<D: Dice + ?Sized>(
    state: &BattleState,
    action: ActionChoice,
    dice: &mut D,
) -> Result<(BattleState, TurnResult), CombatError> {
    match state.phase {
        BattlePhase::Preparing => return Err(CombatError::NotStarted),
        BattlePhase::Completed | BattlePhase::Fled => {
            return Err(CombatError::BattleAlreadyResolved);
        }
        BattlePhase::InProgress => {}
    }

    let side = state.next_actor();
    let turn_number = u32::try_from(state.turns.len())
        .unwrap_or(u32::MAX)
        .saturating_add(1);
    let ctx = TurnContext {
        side,
        skill_bonus: skill_bonus_for(state.skill(side)),
        turn_number,
        config: &state.config.combat,
    };
    let TurnResolution {
        result,
        actor,
        opponent,
    } = resolve_turn(
        state.combatant(side),
        state.combatant(side.opponent()),
        action,
        &ctx,
        dice,
    )?;

    let mut next = state.clone();
    match side {
        Side::A => {
            next.a = actor;
            next.b = opponent;
        }
        Side::B => {
            next.b = actor;
            next.a = opponent;
        }
    }
    if result.terminal {
        next.phase = if result.winner.is_some() {
            BattlePhase::Completed
        } else {
            BattlePhase::Fled
        };
        info!(
            "battle ended on turn {turn_number}: phase={:?} winner={:?}",
            next.phase, result.winner
        );
    } else if next.opener_acted {
        next.round = next.round.saturating_add(1);
        next.opener_acted = false;
    } else {
        next.opener_acted = true;
    }
    next.turns.push(result.clone());
    Ok((next, result))
}

/// Resolve the rest of the current round in initiative order. The second
/// turn is skipped when the first one ends the battle.
///
/// # Errors
///
/// Same as [`advance_battle`].
pub fn play_round<D: Dice + ?Sized>(
    state: &BattleState,
    action_a: ActionChoice,
    action_b: ActionChoice,
    dice: &mut D,
) -> Result<(BattleState, RoundTurns), CombatError> {
    let pick = |side: Side| match side {
        Side::A => action_a,
        Side::B => action_b,
    };
    let round = state.round;
    let (mut next, first) = advance_battle(state, pick(state.next_actor()), dice)?;
    let mut turns = RoundTurns::new();
    turns.push(first);
    while !next.is_finished() && next.round == round {
        let (after, turn) = advance_battle(&next, pick(next.next_actor()), dice)?;
        turns.push(turn);
        next = after;
    }
    Ok((next, turns))
}

/// Player-versus-NPC round: side B always fires its cannons.
///
/// # Errors
///
/// Same as [`advance_battle`].
pub fn play_pve_round<D: Dice + ?Sized>(
    state: &BattleState,
    player_action: ActionChoice,
    dice: &mut D,
) -> Result<(BattleState, RoundTurns), CombatError> {
    play_round(state, player_action, ActionChoice::Attack, dice)
}

/// How a battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Victory(Side),
    Draw,
    Fled,
}

/// Final, settled summary of a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleOutcome {
    pub resolution: Resolution,
    pub winner: Option<Side>,
    pub turns: Vec<TurnResult>,
    pub experience_awarded: u32,
    pub gold_transferred: u32,
    /// Part of `gold_transferred` taken from the loser.
    pub gold_seized: u32,
    /// Combatant snapshots at the end of the battle.
    pub final_a: CombatantState,
    pub final_b: CombatantState,
}

/// Summarize a terminal battle. Pure, so calling it twice yields equal
/// outcomes.
///
/// # Errors
///
/// Returns [`CombatError::NotFinished`] unless the battle is completed or
/// fled.
pub fn finalize_outcome(state: &BattleState) -> Result<BattleOutcome, CombatError> {
    let resolution = match state.phase {
        BattlePhase::Preparing | BattlePhase::InProgress => return Err(CombatError::NotFinished),
        BattlePhase::Fled => Resolution::Fled,
        BattlePhase::Completed => match state.turns.last().and_then(|turn| turn.winner) {
            Some(Winner::A) => Resolution::Victory(Side::A),
            Some(Winner::B) => Resolution::Victory(Side::B),
            Some(Winner::Draw) | None => Resolution::Draw,
        },
    };
    let winner = match resolution {
        Resolution::Victory(side) => Some(side),
        Resolution::Draw | Resolution::Fled => None,
    };

    let RewardResult {
        experience,
        gold,
        seized,
    } = state.config.rewards.rewards(resolution);

    Ok(BattleOutcome {
        resolution,
        winner,
        turns: state.turns.clone(),
        experience_awarded: experience,
        gold_transferred: gold,
        gold_seized: seized,
        final_a: state.a,
        final_b: state.b,
    })
}

/// Remembers which battles have been settled so rewards are granted once.
#[derive(Debug, Clone, Default)]
pub struct SettlementLedger {
    settled: HashSet<u64>,
}

impl SettlementLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_settled(&self, battle_id: u64) -> bool {
        self.settled.contains(&battle_id)
    }

    /// Finalize `state` under `battle_id`, at most once.
    ///
    /// # Errors
    ///
    /// [`CombatError::BattleAlreadyResolved`] when the id was settled before,
    /// and whatever [`finalize_outcome`] rejects.
    pub fn settle(
        &mut self,
        battle_id: u64,
        state: &BattleState,
    ) -> Result<BattleOutcome, CombatError> {
        if self.is_settled(battle_id) {
            log::warn!("battle {battle_id} settlement rejected: already settled");
            return Err(CombatError::BattleAlreadyResolved);
        }
        let outcome = finalize_outcome(state)?;
        self.settled.insert(battle_id);
        info!(
            "battle {battle_id} settled: {:?}, xp={} gold={}",
            outcome.resolution, outcome.experience_awarded, outcome.gold_transferred
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;

    fn ship(health: u32, attack: u32, defense: u32, speed: u32) -> CombatantState {
        CombatantState {
            health,
            max_health: health.max(100),
            attack,
            defense,
            speed,
            crew: 30,
            morale: 50,
        }
    }

    fn started(a: CombatantState, b: CombatantState, initiative: Initiative) -> BattleState {
        let config = BattleConfig {
            initiative,
            ..BattleConfig::default()
        };
        start_battle(&BattleState::new(a, b, config)).unwrap()
    }

    #[test]
    fn start_requires_preparing_phase_and_health() {
        let fresh = BattleState::new(ship(50, 10, 5, 5), ship(0, 10, 5, 5), BattleConfig::default());
        assert_eq!(start_battle(&fresh), Err(CombatError::CombatantDown(Side::B)));

        let battle = started(ship(50, 10, 5, 5), ship(50, 10, 5, 5), Initiative::SideAFirst);
        assert_eq!(battle.phase(), BattlePhase::InProgress);
        assert_eq!(start_battle(&battle), Err(CombatError::AlreadyStarted));
    }

    #[test]
    fn advancing_requires_a_started_battle() {
        let fresh = BattleState::new(ship(50, 10, 5, 5), ship(50, 10, 5, 5), BattleConfig::default());
        let mut dice = ScriptedDice::new();
        assert_eq!(
            advance_battle(&fresh, ActionChoice::Attack, &mut dice).unwrap_err(),
            CombatError::NotStarted
        );
        assert_eq!(finalize_outcome(&fresh), Err(CombatError::NotFinished));
    }

    #[test]
    fn forced_hit_finishes_the_battle() {
        let battle = started(ship(100, 30, 10, 5), ship(20, 10, 5, 5), Initiative::SideAFirst);
        let mut dice = ScriptedDice::new().chances([0.0]).values([0]);
        let (done, turn) = advance_battle(&battle, ActionChoice::Attack, &mut dice).unwrap();
        assert_eq!(turn.damage_dealt, 28);
        assert_eq!(done.phase(), BattlePhase::Completed);
        assert_eq!(turn.winner, Some(Winner::A));
        assert_eq!(done.combatant(Side::B).health, 0);

        assert_eq!(
            advance_battle(&done, ActionChoice::Attack, &mut dice).unwrap_err(),
            CombatError::BattleAlreadyResolved
        );
        assert_eq!(start_battle(&done), Err(CombatError::BattleAlreadyResolved));
    }

    #[test]
    fn rounds_alternate_in_initiative_order() {
        let battle = started(ship(100, 10, 5, 4), ship(100, 10, 5, 9), Initiative::BySpeed);
        assert_eq!(battle.next_actor(), Side::B);
        let mut dice = ScriptedDice::new().chances([0.99, 0.99, 0.99, 0.99]);
        let (after, turns) =
            play_round(&battle, ActionChoice::Attack, ActionChoice::Attack, &mut dice).unwrap();
        let order: Vec<Side> = turns.iter().map(|turn| turn.acting_side).collect();
        assert_eq!(order, vec![Side::B, Side::A]);
        assert_eq!(after.round(), 2);
        assert_eq!(after.next_actor(), Side::B);
        assert_eq!(after.turns().len(), 2);
        assert_eq!(after.turns()[1].turn_number, 2);
    }

    #[test]
    fn speed_ties_go_to_side_a() {
        let battle = started(ship(100, 10, 5, 7), ship(100, 10, 5, 7), Initiative::BySpeed);
        assert_eq!(battle.opener(), Side::A);
    }

    #[test]
    fn terminal_first_turn_skips_the_reply() {
        let battle = started(ship(100, 40, 10, 5), ship(10, 10, 5, 5), Initiative::SideAFirst);
        let mut dice = ScriptedDice::new().chances([0.0]).values([0]);
        let (after, turns) = play_pve_round(&battle, ActionChoice::Attack, &mut dice).unwrap();
        assert_eq!(turns.len(), 1);
        assert!(after.is_finished());
    }

    #[test]
    fn npc_side_always_attacks() {
        let battle = started(ship(100, 10, 5, 5), ship(100, 10, 5, 5), Initiative::SideAFirst);
        let mut dice = ScriptedDice::new().values([12]).chances([0.99]);
        let (_, turns) = play_pve_round(&battle, ActionChoice::Repair, &mut dice).unwrap();
        assert_eq!(turns[0].action, ActionChoice::Repair);
        assert_eq!(turns[1].action, ActionChoice::Attack);
        assert_eq!(turns[1].acting_side, Side::B);
    }

    #[test]
    fn simultaneous_knockout_is_a_draw() {
        let battle = started(ship(6, 20, 5, 5), ship(9, 10, 5, 5), Initiative::SideAFirst);
        let mut dice = ScriptedDice::new().values([15, 10]);
        let (done, turn) = advance_battle(&battle, ActionChoice::Ram, &mut dice).unwrap();
        assert_eq!(turn.winner, Some(Winner::Draw));
        let outcome = finalize_outcome(&done).unwrap();
        assert_eq!(outcome.resolution, Resolution::Draw);
        assert_eq!(outcome.winner, None);
        assert_eq!(outcome.experience_awarded, 0);
        assert_eq!(outcome.gold_transferred, 0);
    }

    #[test]
    fn escape_ends_as_fled_without_rewards() {
        let battle = started(ship(100, 10, 5, 30), ship(100, 10, 5, 5), Initiative::SideAFirst);
        let mut dice = ScriptedDice::new().chances([0.2]);
        let (done, _) = advance_battle(&battle, ActionChoice::Flee, &mut dice).unwrap();
        assert_eq!(done.phase(), BattlePhase::Fled);
        let outcome = finalize_outcome(&done).unwrap();
        assert_eq!(outcome.resolution, Resolution::Fled);
        assert_eq!(outcome.experience_awarded, 0);
        assert_eq!(outcome.gold_transferred, 0);
    }

    #[test]
    fn settlement_is_granted_once() {
        let config = BattleConfig {
            rewards: RewardTerms {
                level_a: 3,
                level_b: 5,
                gold_a: 0,
                gold_b: 80,
                stakes: 100,
                ..RewardTerms::default()
            },
            ..BattleConfig::default()
        };
        let battle =
            start_battle(&BattleState::new(ship(100, 30, 10, 5), ship(20, 10, 5, 5), config))
                .unwrap();
        let mut dice = ScriptedDice::new().chances([0.0]).values([0]);
        let (done, _) = advance_battle(&battle, ActionChoice::Attack, &mut dice).unwrap();

        let first = finalize_outcome(&done).unwrap();
        assert_eq!(first, finalize_outcome(&done).unwrap());
        assert_eq!(first.experience_awarded, 120);
        assert_eq!(first.gold_transferred, 150);
        assert_eq!(first.gold_seized, 50);

        let mut ledger = SettlementLedger::new();
        assert_eq!(ledger.settle(7, &done), Ok(first));
        assert_eq!(
            ledger.settle(7, &done),
            Err(CombatError::BattleAlreadyResolved)
        );
        assert!(ledger.is_settled(7));
    }

    #[test]
    fn rejected_turn_leaves_state_untouched() {
        let battle = started(ship(100, 10, 5, 5), ship(100, 10, 5, 5), Initiative::SideAFirst);
        let mut corrupted = battle.clone();
        corrupted.a.health = 200;
        let mut dice = ScriptedDice::new();
        assert!(matches!(
            advance_battle(&corrupted, ActionChoice::Attack, &mut dice),
            Err(CombatError::InvalidStat(_))
        ));
        assert!(corrupted.turns().is_empty());
        assert_eq!(corrupted.phase(), BattlePhase::InProgress);
    }

    #[test]
    fn initiative_parses_cli_names() {
        assert_eq!("player-first".parse::<Initiative>(), Ok(Initiative::SideAFirst));
        assert_eq!("By-Speed".parse::<Initiative>(), Ok(Initiative::BySpeed));
        assert!("random".parse::<Initiative>().is_err());
    }
}
