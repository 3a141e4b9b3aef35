use std::collections::BTreeMap;

use dlg_core::{DialogueError, DlgValue};
use serde::{Deserialize, Serialize};

use crate::host::{CharacterStats, GameStateMutator, GameStateQuery};
use crate::state::actor_values::{ActorValueTable, CharacterModel};

/// Plain in-memory game state, serializable so tools can load and compare it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryGameState {
    pub flags: BTreeMap<String, bool>,
    pub variables: BTreeMap<String, DlgValue>,
    pub quests: BTreeMap<String, i64>,
    pub items: BTreeMap<String, i64>,
    pub affinities: BTreeMap<String, f64>,
    pub character: CharacterModel,
}

impl MemoryGameState {
    /// Parses a state document. The top level must be an object; serde would
    /// otherwise accept a sequence of fields in declaration order.
    pub fn from_json(source: &str) -> Result<Self, DialogueError> {
        let invalid = |error: serde_json::Error| {
            DialogueError::state("STATE_JSON_INVALID", format!("Invalid game state: {}", error))
        };
        let value: serde_json::Value = serde_json::from_str(source).map_err(invalid)?;
        if !value.is_object() {
            return Err(DialogueError::state(
                "STATE_JSON_INVALID",
                "Invalid game state: top level must be a JSON object.",
            ));
        }
        serde_json::from_value(value).map_err(invalid)
    }

    pub fn to_json(&self) -> Result<String, DialogueError> {
        serde_json::to_string_pretty(self).map_err(|error| {
            DialogueError::state(
                "STATE_JSON_INVALID",
                format!("Game state cannot be serialized: {}", error),
            )
        })
    }
}

impl GameStateQuery for MemoryGameState {
    fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    fn variable(&self, name: &str) -> Option<DlgValue> {
        self.variables.get(name).cloned()
    }

    fn actor_value(&self, name: &str) -> Result<DlgValue, DialogueError> {
        ActorValueTable::global().get(&self.character, name)
    }

    fn quest_stage(&self, name: &str) -> i64 {
        self.quests.get(name).copied().unwrap_or(0)
    }

    fn item_count(&self, name: &str) -> i64 {
        self.items.get(name).copied().unwrap_or(0)
    }

    fn affinity(&self, name: &str) -> f64 {
        self.affinities.get(name).copied().unwrap_or(0.0)
    }
}

impl GameStateMutator for MemoryGameState {
    fn set_flag(&mut self, name: &str, value: bool) {
        self.flags.insert(name.to_string(), value);
    }

    fn set_variable(&mut self, name: &str, value: DlgValue) {
        self.variables.insert(name.to_string(), value);
    }

    fn set_actor_value(&mut self, name: &str, value: DlgValue) -> Result<(), DialogueError> {
        ActorValueTable::global().set(&mut self.character, name, &value)
    }

    fn set_affinity(&mut self, name: &str, value: f64) {
        self.affinities.insert(name.to_string(), value);
    }

    fn give_item(&mut self, name: &str, count: i64) {
        if count <= 0 {
            return;
        }
        *self.items.entry(name.to_string()).or_insert(0) += count;
    }

    fn take_item(&mut self, name: &str, count: i64) -> bool {
        if count <= 0 {
            return true;
        }
        let held = self.item_count(name);
        if held < count {
            return false;
        }
        if held == count {
            self.items.remove(name);
        } else {
            self.items.insert(name.to_string(), held - count);
        }
        true
    }

    fn set_quest_stage(&mut self, name: &str, stage: i64) -> bool {
        let current = GameStateQuery::quest_stage(self, name);
        let regresses = if current < 0 {
            // Finished quests only accept a later finish stage.
            stage >= 0 || stage > current
        } else {
            stage >= 0 && stage < current
        };
        if regresses {
            log::debug!(
                "[state] quest \"{}\" stays at {} (requested {})",
                name,
                current,
                stage
            );
            return false;
        }
        self.quests.insert(name.to_string(), stage);
        true
    }
}

impl CharacterStats for MemoryGameState {
    fn stat(&self, name: &str) -> Option<f64> {
        self.character.stats.get(name).copied()
    }

    fn skill(&self, name: &str) -> Option<f64> {
        self.character.skills.get(name).copied()
    }

    fn actor_value_number(&self, name: &str) -> Option<f64> {
        self.actor_value(name).ok().and_then(|value| value.as_number())
    }
}
