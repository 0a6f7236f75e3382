//! Age of Voyage combat engine
//!
//! Platform-agnostic rules for ship-to-ship battles, rewards, progression,
//! exploration rolls and market prices. Persistence stays outside the crate
//! behind [`RecordStore`].

pub mod action;
pub mod battle;
pub mod config;
pub mod constants;
pub mod dice;
pub mod error;
pub mod exploration;
pub mod numbers;
pub mod replay;
pub mod reward;
pub mod stats;
pub mod status;
pub mod trade;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export commonly used types
pub use action::{
    ActionChoice, ActionCost, TurnContext, TurnResolution, TurnResult, board_chance, flee_chance,
    resolve_turn, skill_bonus_for,
};
pub use battle::{
    BattleConfig, BattleOutcome, BattlePhase, BattleState, Initiative, Resolution, RoundTurns,
    SettlementLedger, Side, Winner, advance_battle, finalize_outcome, play_pve_round, play_round,
    start_battle,
};
pub use config::{BalanceConfig, BoardConfig, CombatConfig, ConfigError, FleeConfig, RollRange};
pub use dice::{CountingRng, Dice, RngBundle, ScriptedDice};
pub use error::CombatError;
pub use exploration::{
    EventEffects, EventId, ExplorationCheck, ExplorationRequest, ExplorationRoll,
    ExplorationStatus, RandomEvent, RegionProfile, difficulty_multiplier, roll_exploration,
};
pub use replay::{ReplayMode, code_from_entropy, decode as decode_replay, encode as encode_replay};
pub use reward::{LevelingRule, Progression, RewardResult, RewardTerms, compute_rewards};
pub use stats::{
    CombatantKind, CombatantRecord, CombatantState, InvalidStatError, NpcDifficulty, npc_opponent,
    roll_stakes,
};
pub use status::{ShipStatus, StatusTransitionError, UnknownStatus};
pub use trade::{
    MarketConditions, PriceQuote, PriceTrend, PriceUpdate, SaleProceeds, roll_market_tick,
    sale_proceeds, update_price,
};

/// Write-back produced when a battle is settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordMutation {
    SetHealth { id: String, health: u32 },
    AddGold { id: String, amount: i64 },
    AddExperience { id: String, amount: u32 },
    SetStatus { id: String, status: ShipStatus },
}

/// Trait for abstracting the persistent records combat reads and writes.
/// Platform-specific implementations should provide this
pub trait RecordStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the stat snapshot of a ship, fleet or NPC template.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be found or read.
    fn load_combatant(&self, id: &str) -> Result<CombatantRecord, Self::Error>;

    /// Persist a batch of mutations. Implementations apply all or none.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot be written.
    fn apply_mutations(&self, mutations: &[RecordMutation]) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum EngineError<E: std::error::Error + 'static> {
    #[error("record store failed")]
    Store(#[source] E),
    #[error(transparent)]
    Combat(#[from] CombatError),
    #[error("battle was not opened from stored records")]
    Unbound,
}

/// Which stored records fight, and on what terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleRequest {
    pub challenger: String,
    pub defender: String,
    #[serde(default)]
    pub initiative: Initiative,
    #[serde(default)]
    pub skill_a: u32,
    #[serde(default)]
    pub skill_b: u32,
    #[serde(default)]
    pub rewards: RewardTerms,
}

/// Outcome of a settled battle and the writes sent to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettledBattle {
    pub outcome: BattleOutcome,
    pub mutations: Vec<RecordMutation>,
}

/// Main engine tying stored combatants to battle resolution
pub struct VoyageEngine<S>
where
    S: RecordStore,
{
    store: S,
    balance: BalanceConfig,
    ledger: SettlementLedger,
}

impl<S> VoyageEngine<S>
where
    S: RecordStore,
{
    /// Create an engine with the bundled balance sheet
    pub fn new(store: S) -> Self {
        Self::with_balance(store, BalanceConfig::default())
    }

    pub fn with_balance(store: S, balance: BalanceConfig) -> Self {
        Self {
            store,
            balance,
            ledger: SettlementLedger::new(),
        }
    }

    #[must_use]
    pub const fn balance(&self) -> &BalanceConfig {
        &self.balance
    }

    /// Load both combatants and start their battle.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] when a record cannot be loaded and
    /// [`EngineError::Combat`] when a record is invalid or a side is down.
    pub fn open_battle(&self, request: &BattleRequest) -> Result<BattleState, EngineError<S::Error>> {
        let a = self.load_state(&request.challenger)?;
        let b = self.load_state(&request.defender)?;
        let config = BattleConfig {
            initiative: request.initiative,
            combat: self.balance.combat.clone(),
            skill_a: request.skill_a,
            skill_b: request.skill_b,
            rewards: request.rewards,
            challenger: request.challenger.clone(),
            defender: request.defender.clone(),
        };
        Ok(start_battle(&BattleState::new(a, b, config))?)
    }

    fn load_state(&self, id: &str) -> Result<CombatantState, EngineError<S::Error>> {
        let record = self.store.load_combatant(id).map_err(EngineError::Store)?;
        CombatantState::from_record(&record).map_err(|err| EngineError::Combat(err.into()))
    }

    /// Settle a finished battle once and persist its consequences. Record
    /// ids and reward terms come from the battle itself, as fixed by
    /// [`VoyageEngine::open_battle`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Combat`] when the battle is unfinished or was
    /// already settled, [`EngineError::Unbound`] when it carries no record
    /// ids, and [`EngineError::Store`] when the write fails.
    pub fn settle(
        &mut self,
        battle_id: u64,
        state: &BattleState,
    ) -> Result<SettledBattle, EngineError<S::Error>> {
        if self.ledger.is_settled(battle_id) {
            return Err(CombatError::BattleAlreadyResolved.into());
        }
        let config = state.config();
        if config.challenger.is_empty() || config.defender.is_empty() {
            return Err(EngineError::Unbound);
        }
        let outcome = finalize_outcome(state)?;
        let mutations = settlement_mutations(config, &outcome);
        self.store
            .apply_mutations(&mutations)
            .map_err(EngineError::Store)?;
        let outcome = self.ledger.settle(battle_id, state)?;
        Ok(SettledBattle { outcome, mutations })
    }
}

fn settlement_mutations(config: &BattleConfig, outcome: &BattleOutcome) -> Vec<RecordMutation> {
    let id = |side: Side| config.record_id(side).to_string();
    let mut mutations = Vec::new();
    for (side, final_state) in [(Side::A, &outcome.final_a), (Side::B, &outcome.final_b)] {
        mutations.push(RecordMutation::SetHealth {
            id: id(side),
            health: final_state.health,
        });
        let status = if final_state.is_defeated() {
            ShipStatus::Damaged
        } else {
            ShipStatus::Docked
        };
        mutations.push(RecordMutation::SetStatus {
            id: id(side),
            status,
        });
    }
    if let Some(winner) = outcome.winner {
        mutations.push(RecordMutation::AddGold {
            id: id(winner),
            amount: i64::from(outcome.gold_transferred),
        });
        if outcome.gold_seized > 0 {
            mutations.push(RecordMutation::AddGold {
                id: id(winner.opponent()),
                amount: -i64::from(outcome.gold_seized),
            });
        }
        mutations.push(RecordMutation::AddExperience {
            id: id(winner),
            amount: outcome.experience_awarded,
        });
    }
    mutations
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Debug, Error)]
    #[error("no record for `{0}`")]
    struct MissingRecord(String);

    #[derive(Default)]
    struct MemoryStore {
        records: HashMap<String, CombatantRecord>,
        written: RefCell<Vec<RecordMutation>>,
    }

    impl MemoryStore {
        fn with(mut self, id: &str, record: CombatantRecord) -> Self {
            self.records.insert(id.to_string(), record);
            self
        }
    }

    impl RecordStore for MemoryStore {
        type Error = MissingRecord;

        fn load_combatant(&self, id: &str) -> Result<CombatantRecord, Self::Error> {
            self.records
                .get(id)
                .cloned()
                .ok_or_else(|| MissingRecord(id.to_string()))
        }

        fn apply_mutations(&self, mutations: &[RecordMutation]) -> Result<(), Self::Error> {
            self.written.borrow_mut().extend_from_slice(mutations);
            Ok(())
        }
    }

    fn record(name: &str, health: i64, attack: i64) -> CombatantRecord {
        CombatantRecord {
            kind: CombatantKind::Ship,
            name: name.to_string(),
            health,
            max_health: 100,
            attack,
            defense: 5,
            speed: 8,
            crew: 30,
            morale: 50,
        }
    }

    fn request() -> BattleRequest {
        BattleRequest {
            challenger: String::from("santa-lucia"),
            defender: String::from("black-flag"),
            initiative: Initiative::SideAFirst,
            skill_a: 0,
            skill_b: 0,
            rewards: RewardTerms {
                level_a: 2,
                level_b: 4,
                gold_a: 500,
                gold_b: 30,
                stakes: 100,
                ..RewardTerms::default()
            },
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::default()
            .with("santa-lucia", record("Santa Lucia", 100, 30))
            .with("black-flag", record("Black Flag", 20, 10))
    }

    #[test]
    fn engine_settles_once_and_writes_back() {
        let mut engine = VoyageEngine::new(store());
        let battle = engine.open_battle(&request()).unwrap();
        assert_eq!(battle.phase(), BattlePhase::InProgress);

        let mut dice = ScriptedDice::new().chances([0.0]).values([0]);
        let (done, _) = advance_battle(&battle, ActionChoice::Attack, &mut dice).unwrap();
        let settled = engine.settle(1, &done).unwrap();
        assert_eq!(settled.outcome.winner, Some(Side::A));
        assert_eq!(settled.outcome.experience_awarded, 120);
        assert_eq!(settled.outcome.gold_transferred, 130);
        assert!(settled.mutations.contains(&RecordMutation::AddGold {
            id: String::from("black-flag"),
            amount: -30
        }));
        assert!(settled.mutations.contains(&RecordMutation::SetStatus {
            id: String::from("black-flag"),
            status: ShipStatus::Damaged
        }));
        assert_eq!(*engine.store.written.borrow(), settled.mutations);

        assert!(matches!(
            engine.settle(1, &done),
            Err(EngineError::Combat(CombatError::BattleAlreadyResolved))
        ));
        assert_eq!(engine.store.written.borrow().len(), settled.mutations.len());
    }

    #[test]
    fn missing_and_invalid_records_are_reported() {
        let engine = VoyageEngine::new(MemoryStore::default());
        assert!(matches!(
            engine.open_battle(&request()),
            Err(EngineError::Store(MissingRecord(_)))
        ));

        let engine = VoyageEngine::new(
            store().with("black-flag", record("Black Flag", 0, 10)),
        );
        assert!(matches!(
            engine.open_battle(&request()),
            Err(EngineError::Combat(CombatError::CombatantDown(Side::B)))
        ));
    }

    #[test]
    fn unfinished_battles_write_nothing() {
        let mut engine = VoyageEngine::new(store());
        let battle = engine.open_battle(&request()).unwrap();
        assert!(matches!(
            engine.settle(9, &battle),
            Err(EngineError::Combat(CombatError::NotFinished))
        ));
        assert!(engine.store.written.borrow().is_empty());
    }

    #[test]
    fn settlement_moves_gold_only_between_the_ships_that_fought() {
        let mut engine = VoyageEngine::new(store());
        let request = BattleRequest {
            rewards: RewardTerms {
                level_a: 1,
                level_b: 1,
                gold_a: 0,
                gold_b: 500,
                stakes: 200,
                ..RewardTerms::default()
            },
            ..request()
        };
        let battle = engine.open_battle(&request).unwrap();
        assert_eq!(battle.config().record_id(Side::B), "black-flag");

        let mut dice = ScriptedDice::new().chances([0.0]).values([0]);
        let (done, _) = advance_battle(&battle, ActionChoice::Attack, &mut dice).unwrap();
        let settled = engine.settle(3, &done).unwrap();

        let credited: i64 = settled
            .mutations
            .iter()
            .filter_map(|m| match m {
                RecordMutation::AddGold { amount, .. } => Some(*amount),
                _ => None,
            })
            .sum();
        assert_eq!(credited, 200);
        assert!(settled.mutations.contains(&RecordMutation::AddGold {
            id: String::from("santa-lucia"),
            amount: 300
        }));
        assert!(settled.mutations.contains(&RecordMutation::AddGold {
            id: String::from("black-flag"),
            amount: -100
        }));
        for mutation in &settled.mutations {
            let id = match mutation {
                RecordMutation::SetHealth { id, .. }
                | RecordMutation::AddGold { id, .. }
                | RecordMutation::AddExperience { id, .. }
                | RecordMutation::SetStatus { id, .. } => id.as_str(),
            };
            assert!(id == "santa-lucia" || id == "black-flag", "stray write to {id}");
        }
    }

    #[test]
    fn battles_without_record_ids_are_not_settled() {
        let mut engine = VoyageEngine::new(store());
        let loose = start_battle(&BattleState::new(
            CombatantState::from_record(&record("Santa Lucia", 100, 30)).unwrap(),
            CombatantState::from_record(&record("Black Flag", 20, 10)).unwrap(),
            BattleConfig::default(),
        ))
        .unwrap();
        let mut dice = ScriptedDice::new().chances([0.0]).values([0]);
        let (done, _) = advance_battle(&loose, ActionChoice::Attack, &mut dice).unwrap();
        assert!(matches!(engine.settle(4, &done), Err(EngineError::Unbound)));
        assert!(engine.store.written.borrow().is_empty());
        assert!(!engine.ledger.is_settled(4));
    }
}
