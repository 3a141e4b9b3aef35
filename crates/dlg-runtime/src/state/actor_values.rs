use std::collections::BTreeMap;
use std::sync::OnceLock;

use dlg_core::{DialogueError, DlgValue};
use serde::{Deserialize, Serialize};

/// The player character as far as dialogue cares about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterModel {
    pub display_name: String,
    pub level: i64,
    pub experience: i64,
    pub health: f64,
    pub max_health: f64,
    pub energy: f64,
    pub max_energy: f64,
    pub money: i64,
    pub essential: bool,
    pub stats: BTreeMap<String, f64>,
    pub skills: BTreeMap<String, f64>,
}

impl Default for CharacterModel {
    fn default() -> Self {
        Self {
            display_name: "Player".to_string(),
            level: 1,
            experience: 0,
            health: 100.0,
            max_health: 100.0,
            energy: 100.0,
            max_energy: 100.0,
            money: 0,
            essential: false,
            stats: BTreeMap::new(),
            skills: BTreeMap::new(),
        }
    }
}

type Getter = fn(&CharacterModel) -> DlgValue;
type Setter = fn(&mut CharacterModel, &DlgValue) -> Result<(), String>;

struct ActorValueAccessor {
    get: Getter,
    set: Option<Setter>,
}

/// Named, typed accessors over `CharacterModel`, built once.
pub struct ActorValueTable {
    accessors: BTreeMap<&'static str, ActorValueAccessor>,
}

fn number(value: &DlgValue) -> Result<f64, String> {
    value
        .as_number()
        .filter(|number| number.is_finite())
        .ok_or_else(|| format!("expected number, found {}", value.type_name()))
}

fn integer(value: &DlgValue) -> Result<i64, String> {
    number(value).map(|number| number.round() as i64)
}

impl ActorValueTable {
    pub fn global() -> &'static ActorValueTable {
        static TABLE: OnceLock<ActorValueTable> = OnceLock::new();
        TABLE.get_or_init(ActorValueTable::build)
    }

    fn build() -> Self {
        let mut accessors = BTreeMap::new();

        register(
            &mut accessors,
            "DisplayName",
            |model| DlgValue::String(model.display_name.clone()),
            Some(|model, value| {
                model.display_name = value.to_text();
                Ok(())
            }),
        );
        register(
            &mut accessors,
            "Level",
            |model| DlgValue::from(model.level),
            Some(|model, value| {
                model.level = integer(value)?.max(1);
                Ok(())
            }),
        );
        register(
            &mut accessors,
            "Experience",
            |model| DlgValue::from(model.experience),
            Some(|model, value| {
                model.experience = integer(value)?.max(0);
                Ok(())
            }),
        );
        register(
            &mut accessors,
            "Health",
            |model| DlgValue::Number(model.health),
            Some(|model, value| {
                model.health = number(value)?.clamp(0.0, model.max_health);
                Ok(())
            }),
        );
        register(
            &mut accessors,
            "MaxHealth",
            |model| DlgValue::Number(model.max_health),
            Some(|model, value| {
                model.max_health = number(value)?.max(1.0);
                model.health = model.health.min(model.max_health);
                Ok(())
            }),
        );
        register(
            &mut accessors,
            "Energy",
            |model| DlgValue::Number(model.energy),
            Some(|model, value| {
                model.energy = number(value)?.clamp(0.0, model.max_energy);
                Ok(())
            }),
        );
        register(
            &mut accessors,
            "MaxEnergy",
            |model| DlgValue::Number(model.max_energy),
            Some(|model, value| {
                model.max_energy = number(value)?.max(0.0);
                model.energy = model.energy.min(model.max_energy);
                Ok(())
            }),
        );
        register(
            &mut accessors,
            "HealthFraction",
            |model| {
                if model.max_health > 0.0 {
                    DlgValue::Number(model.health / model.max_health)
                } else {
                    DlgValue::Number(0.0)
                }
            },
            None,
        );
        register(
            &mut accessors,
            "Money",
            |model| DlgValue::from(model.money),
            Some(|model, value| {
                model.money = integer(value)?;
                Ok(())
            }),
        );
        register(
            &mut accessors,
            "IsEssential",
            |model| DlgValue::Bool(model.essential),
            Some(|model, value| {
                model.essential = value.is_truthy();
                Ok(())
            }),
        );

        Self { accessors }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.accessors.keys().copied()
    }

    pub fn get(&self, model: &CharacterModel, name: &str) -> Result<DlgValue, DialogueError> {
        self.accessors
            .get(name)
            .map(|accessor| (accessor.get)(model))
            .ok_or_else(|| unknown(name))
    }

    pub fn set(
        &self,
        model: &mut CharacterModel,
        name: &str,
        value: &DlgValue,
    ) -> Result<(), DialogueError> {
        let accessor = self.accessors.get(name).ok_or_else(|| unknown(name))?;
        let Some(set) = accessor.set else {
            return Err(DialogueError::state(
                "STATE_ACTOR_VALUE_READONLY",
                format!("Actor value \"{}\" is read-only.", name),
            ));
        };
        set(model, value).map_err(|reason| {
            DialogueError::state(
                "STATE_ACTOR_VALUE_TYPE",
                format!("Actor value \"{}\": {}.", name, reason),
            )
        })
    }
}

fn register(
    accessors: &mut BTreeMap<&'static str, ActorValueAccessor>,
    name: &'static str,
    get: Getter,
    set: Option<Setter>,
) {
    accessors.insert(name, ActorValueAccessor { get, set });
}

fn unknown(name: &str) -> DialogueError {
    DialogueError::state(
        "STATE_ACTOR_VALUE_UNKNOWN",
        format!("Unknown actor value \"{}\".", name),
    )
}
