//! Ship status with an explicit transition table.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipStatus {
    #[default]
    Docked,
    Sailing,
    Exploring,
    Trading,
    InCombat,
    Damaged,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("ship cannot go from {from} to {to}")]
pub struct StatusTransitionError {
    pub from: ShipStatus,
    pub to: ShipStatus,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown ship status `{0}`")]
pub struct UnknownStatus(pub String);

impl ShipStatus {
    pub const ALL: [Self; 6] = [
        Self::Docked,
        Self::Sailing,
        Self::Exploring,
        Self::Trading,
        Self::InCombat,
        Self::Damaged,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Docked => "docked",
            Self::Sailing => "sailing",
            Self::Exploring => "exploring",
            Self::Trading => "trading",
            Self::InCombat => "in_combat",
            Self::Damaged => "damaged",
        }
    }

    /// Statuses reachable in one step.
    #[must_use]
    pub const fn successors(self) -> &'static [Self] {
        match self {
            Self::Docked => &[Self::Sailing, Self::Exploring, Self::Trading, Self::InCombat],
            Self::Sailing => &[Self::Docked, Self::InCombat, Self::Exploring],
            Self::Exploring => &[Self::Docked, Self::InCombat],
            Self::Trading => &[Self::Docked],
            Self::InCombat => &[Self::Docked, Self::Sailing, Self::Damaged],
            Self::Damaged => &[Self::Docked],
        }
    }

    #[must_use]
    pub fn can_transition(self, to: Self) -> bool {
        self.successors().contains(&to)
    }

    /// # Errors
    ///
    /// Returns [`StatusTransitionError`] when `to` is not a successor.
    pub fn transition(self, to: Self) -> Result<Self, StatusTransitionError> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            log::warn!("rejected ship status change {self} -> {to}");
            Err(StatusTransitionError { from: self, to })
        }
    }

    /// Whether the ship can be drawn into a new battle.
    #[must_use]
    pub fn can_engage(self) -> bool {
        self.can_transition(Self::InCombat)
    }
}

impl fmt::Display for ShipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ShipStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "docked" | "idle" => Ok(Self::Docked),
            "sailing" | "traveling" => Ok(Self::Sailing),
            "exploring" => Ok(Self::Exploring),
            "trading" => Ok(Self::Trading),
            "in_combat" | "combat" => Ok(Self::InCombat),
            "damaged" => Ok(Self::Damaged),
            _ => Err(UnknownStatus(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_names_parse() {
        assert_eq!("idle".parse::<ShipStatus>(), Ok(ShipStatus::Docked));
        assert_eq!("Combat".parse::<ShipStatus>(), Ok(ShipStatus::InCombat));
        assert_eq!("traveling".parse::<ShipStatus>(), Ok(ShipStatus::Sailing));
        assert_eq!(
            "sunk".parse::<ShipStatus>(),
            Err(UnknownStatus(String::from("sunk")))
        );
    }

    #[test]
    fn combat_exits_are_limited() {
        assert_eq!(
            ShipStatus::InCombat.transition(ShipStatus::Damaged),
            Ok(ShipStatus::Damaged)
        );
        assert_eq!(
            ShipStatus::InCombat.transition(ShipStatus::Trading),
            Err(StatusTransitionError {
                from: ShipStatus::InCombat,
                to: ShipStatus::Trading
            })
        );
    }

    #[test]
    fn damaged_ships_must_dock() {
        for to in ShipStatus::ALL {
            assert_eq!(
                ShipStatus::Damaged.can_transition(to),
                to == ShipStatus::Docked
            );
        }
        assert!(!ShipStatus::Damaged.can_engage());
    }

    #[test]
    fn no_status_loops_onto_itself() {
        for status in ShipStatus::ALL {
            assert!(!status.can_transition(status), "{status}");
            assert_eq!(status.key().parse::<ShipStatus>(), Ok(status));
        }
    }
}
