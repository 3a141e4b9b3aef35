pub mod config;
pub mod engine;
pub mod evaluator;
pub mod host;
pub mod macros;
pub mod microscript;
pub mod rhai_runner;
mod rng;
pub mod skill_check;
pub mod state;

pub use config::{DialogueConfig, PauseLevel};
pub use engine::{
    parse_destination, CompletionCallback, Destination, DialogueEngine, DialogueEngineOptions,
    EngineTick, FrameTimer,
};
pub use host::{
    CharacterStats, GameState, GameStateMutator, GameStateQuery, JsonLinesTraceSink, NoScripts,
    NullWorldHost, SceneSource, ScriptContext, ScriptRunner, TextMacroExpander, TraceSink,
    WorldHost,
};
pub use macros::TemplateMacroExpander;
pub use microscript::{DelayQueue, MicroscriptOutcome, PendingMicroscript};
pub use rhai_runner::RhaiScriptRunner;
pub use skill_check::SkillCheckResolver;
pub use state::{ActorValueTable, CharacterModel, MemoryGameState, SharedGameState};
