use std::sync::Arc;

use dlg_core::{
    CloseReason, DialogueError, DialogueScene, DialogueTrace, PresentedFrame, SessionState,
};

use crate::config::DialogueConfig;
use crate::host::{
    GameState, NoScripts, NullWorldHost, ScriptRunner, SceneSource, TextMacroExpander, TraceSink,
    WorldHost,
};
use crate::macros::TemplateMacroExpander;
use crate::microscript::DelayQueue;
use crate::skill_check::SkillCheckResolver;
use crate::state::MemoryGameState;

mod advance;
mod dispatch;
mod lifecycle;
mod present;
mod snapshot;
mod timer;

pub use dispatch::{parse_destination, Destination};
pub use timer::{EngineTick, FrameTimer};

/// Navigations one call may chain (blank frames, scene hops) before the
/// session is aborted.
const MAX_TRANSITIONS: usize = 10_000;

/// Runs when a session closes, exactly once. An `Err` is logged.
pub type CompletionCallback = Box<dyn FnOnce(&CloseReason) -> Result<(), DialogueError>>;

pub struct DialogueEngineOptions {
    pub scenes: Box<dyn SceneSource>,
    pub state: Option<Box<dyn GameState>>,
    pub scripts: Option<Box<dyn ScriptRunner>>,
    pub macros: Option<Box<dyn TextMacroExpander>>,
    pub world: Option<Box<dyn WorldHost>>,
    pub trace_sink: Option<Box<dyn TraceSink>>,
    pub random_seed: Option<u32>,
    pub config: DialogueConfig,
}

impl DialogueEngineOptions {
    pub fn new(scenes: Box<dyn SceneSource>) -> Self {
        Self {
            scenes,
            state: None,
            scripts: None,
            macros: None,
            world: None,
            trace_sink: None,
            random_seed: None,
            config: DialogueConfig::default(),
        }
    }
}

struct Session {
    scene: Arc<DialogueScene>,
    frame: String,
    state: SessionState,
    view: Option<PresentedFrame>,
    current_music: Option<String>,
    trace: DialogueTrace,
    timer: Option<FrameTimer>,
    callback: Option<CompletionCallback>,
}

impl Session {
    fn new(scene: Arc<DialogueScene>, callback: Option<CompletionCallback>) -> Self {
        let frame = scene.default_frame.clone();
        Self {
            scene,
            frame,
            state: SessionState::Idle,
            view: None,
            current_music: None,
            trace: DialogueTrace::new(),
            timer: None,
            callback,
        }
    }
}

/// Where navigation goes next, produced by advancing and consumed by the
/// transition loop.
enum Step {
    Present { scene: Arc<DialogueScene>, frame: String },
    Closed(CloseReason),
}

/// Frame-traversal state machine for one dialogue session at a time.
///
/// Single-threaded: the host drives it through `start`, `handle_event`
/// and `tick` from one thread.
pub struct DialogueEngine {
    scenes: Box<dyn SceneSource>,
    state: Box<dyn GameState>,
    scripts: Box<dyn ScriptRunner>,
    macros: Box<dyn TextMacroExpander>,
    world: Box<dyn WorldHost>,
    trace_sink: Option<Box<dyn TraceSink>>,
    config: DialogueConfig,
    resolver: SkillCheckResolver,
    delays: DelayQueue,
    initial_random_seed: u32,
    rng_state: u32,
    session: Option<Session>,
    last_close: Option<CloseReason>,
    last_trace: DialogueTrace,
}

impl DialogueEngine {
    pub fn new(options: DialogueEngineOptions) -> Result<Self, DialogueError> {
        let config = options.config;
        if !config.skill_check_difficulty.is_finite() || config.skill_check_difficulty <= 0.0 {
            return Err(DialogueError::session(
                "ENGINE_CONFIG_INVALID",
                format!(
                    "skillCheckDifficulty must be a positive number, got {}.",
                    config.skill_check_difficulty
                ),
            ));
        }
        let initial_random_seed = options.random_seed.unwrap_or(1);
        Ok(Self {
            scenes: options.scenes,
            state: options
                .state
                .unwrap_or_else(|| Box::new(MemoryGameState::default())),
            scripts: options.scripts.unwrap_or_else(|| Box::new(NoScripts)),
            macros: options
                .macros
                .unwrap_or_else(|| Box::new(TemplateMacroExpander)),
            world: options.world.unwrap_or_else(|| Box::new(NullWorldHost)),
            trace_sink: options.trace_sink,
            resolver: SkillCheckResolver::from_config(&config),
            config,
            delays: DelayQueue::new(),
            initial_random_seed,
            rng_state: initial_random_seed,
            session: None,
            last_close: None,
            last_trace: DialogueTrace::new(),
        })
    }

    pub fn config(&self) -> &DialogueConfig {
        &self.config
    }

    pub fn session_state(&self) -> SessionState {
        match &self.session {
            Some(session) => session.state,
            None if self.last_close.is_some() => SessionState::Closed,
            None => SessionState::Idle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// The frame on screen, if a session is presenting.
    pub fn current(&self) -> Option<&PresentedFrame> {
        self.session.as_ref().and_then(|session| session.view.as_ref())
    }

    pub fn current_scene(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.scene.name.as_str())
    }

    /// Trace of the running session, or of the last closed one.
    pub fn trace(&self) -> &DialogueTrace {
        match &self.session {
            Some(session) => &session.trace,
            None => &self.last_trace,
        }
    }

    pub fn last_close_reason(&self) -> Option<&CloseReason> {
        self.last_close.as_ref()
    }

    pub fn game_state(&self) -> &dyn GameState {
        self.state.as_ref()
    }

    pub fn game_state_mut(&mut self) -> &mut dyn GameState {
        self.state.as_mut()
    }

    pub fn delays(&self) -> &DelayQueue {
        &self.delays
    }

    pub fn rng_state(&self) -> u32 {
        self.rng_state
    }

    pub fn reset_rng(&mut self) {
        self.rng_state = self.initial_random_seed;
    }
}
