use std::fmt;

use clap::ValueEnum;
use serde::Serialize;
use voyage_core::{ActionChoice, CombatConfig, CombatantState, board_chance, flee_chance};

/// Captain temperaments used to pick the player's action each round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Boards when the odds are good, rams while the hull holds.
    Aggressive,
    /// Fires broadsides and patches the hull when it gets low.
    Balanced,
    /// Repairs early and runs when badly hurt.
    Cautious,
}

impl Strategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Aggressive => "Aggressive",
            Self::Balanced => "Balanced",
            Self::Cautious => "Cautious",
        }
    }

    /// Pick the next action for `own` facing `foe`.
    #[must_use]
    pub fn pick(self, own: &CombatantState, foe: &CombatantState, cfg: &CombatConfig) -> ActionChoice {
        let hull = health_percent(own);
        match self {
            Self::Aggressive => {
                if board_chance(own, foe, cfg) >= 0.5 {
                    ActionChoice::Board
                } else if hull > 40 && own.health > cfg.ram_self_damage.max {
                    ActionChoice::Ram
                } else {
                    ActionChoice::Attack
                }
            }
            Self::Balanced => {
                if hull < 35 && foe.health > own.attack {
                    ActionChoice::Repair
                } else {
                    ActionChoice::Attack
                }
            }
            Self::Cautious => {
                if hull < 25 && flee_chance(own, foe, cfg) >= 0.5 {
                    ActionChoice::Flee
                } else if hull < 50 {
                    ActionChoice::Repair
                } else {
                    ActionChoice::Attack
                }
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn health_percent(state: &CombatantState) -> u32 {
    if state.max_health == 0 {
        return 0;
    }
    let percent = u64::from(state.health) * 100 / u64::from(state.max_health);
    u32::try_from(percent).unwrap_or(100)
}
