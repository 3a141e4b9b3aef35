use dlg_core::{DialogueError, DialogueOutput, SessionState};
use serde::{Deserialize, Serialize};

use super::DialogueEngine;
use crate::config::PauseLevel;
use crate::microscript::apply_now;

/// Elapsed time reported by the host since the previous tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineTick {
    pub real_seconds: f64,
    pub world_seconds: f64,
    pub pause: PauseLevel,
}

impl EngineTick {
    pub fn seconds(real_seconds: f64) -> Self {
        Self {
            real_seconds,
            world_seconds: real_seconds,
            pause: PauseLevel::Unpaused,
        }
    }

    pub fn paused(mut self, pause: PauseLevel) -> Self {
        self.pause = pause;
        self
    }
}

/// Countdown for a frame that auto-advances. At most one per session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTimer {
    remaining: f64,
}

impl FrameTimer {
    pub fn new(seconds: f64) -> Self {
        Self {
            remaining: seconds.max(0.0),
        }
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    /// Returns true once the countdown reaches zero.
    fn elapse(&mut self, seconds: f64) -> bool {
        self.remaining = (self.remaining - seconds.max(0.0)).max(0.0);
        self.remaining <= 0.0
    }
}

impl DialogueEngine {
    /// Advances clocks: applies due delayed microscripts, then runs the
    /// frame timer. Returns the new output when the timer fired.
    pub fn tick(&mut self, tick: EngineTick) -> Result<Option<DialogueOutput>, DialogueError> {
        let game_running = self.config.game_clock_running(tick.pause);

        for entry in self
            .delays
            .advance(tick.real_seconds, tick.world_seconds, game_running)
        {
            apply_now(
                &entry.node,
                self.state.as_mut(),
                self.scripts.as_mut(),
                &entry.context,
            );
        }

        if !game_running {
            return Ok(None);
        }
        let fired = match self.session.as_mut() {
            Some(session) if session.state == SessionState::Presenting => match session.timer.as_mut() {
                Some(timer) => timer.elapse(tick.real_seconds),
                None => false,
            },
            _ => false,
        };
        if !fired {
            return Ok(None);
        }

        log::debug!("[dialogue] frame timer elapsed");
        self.cancel_timer();
        self.advance_and_run(None).map(Some)
    }

    pub(super) fn cancel_timer(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.timer = None;
        }
    }

    pub fn timer_remaining(&self) -> Option<f64> {
        self.session
            .as_ref()
            .and_then(|session| session.timer.as_ref())
            .map(FrameTimer::remaining)
    }
}
