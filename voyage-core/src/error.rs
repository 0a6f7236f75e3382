//! Errors surfaced by combat resolution and the battle state machine.
use thiserror::Error;

use crate::battle::Side;
use crate::stats::InvalidStatError;

/// Recoverable errors raised while resolving turns or moving a battle
/// between phases. None of them leave partially applied state behind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CombatError {
    #[error("invalid combatant stats: {0}")]
    InvalidStat(#[from] InvalidStatError),
    #[error("unsupported combat action `{0}`")]
    InvalidAction(String),
    #[error("side {0} cannot act with zero health")]
    ActorDefeated(Side),
    #[error("battle has already been resolved")]
    BattleAlreadyResolved,
    #[error("battle has not started")]
    NotStarted,
    #[error("battle is already in progress")]
    AlreadyStarted,
    #[error("side {0} has no health left and cannot enter battle")]
    CombatantDown(Side),
    #[error("battle has not reached a terminal phase")]
    NotFinished,
}
