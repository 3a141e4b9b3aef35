use dlg_core::{
    DialogueError, DialogueOutput, FrameKind, SessionSnapshot, SessionState, SNAPSHOT_SCHEMA_V1,
};

use super::lifecycle::no_session;
use super::{CompletionCallback, DialogueEngine, FrameTimer, Session};
use crate::host::ScriptContext;

impl DialogueEngine {
    /// Captures the presenting session so a later process can resume it.
    pub fn snapshot(&self) -> Result<SessionSnapshot, DialogueError> {
        let session = self.session.as_ref().ok_or_else(no_session)?;
        if session.state != SessionState::Presenting {
            return Err(DialogueError::session(
                "ENGINE_SNAPSHOT_STATE",
                "Snapshots can only be taken while a frame is presented.",
            ));
        }
        Ok(SessionSnapshot {
            schema_version: SNAPSHOT_SCHEMA_V1.to_string(),
            scene: session.scene.name.clone(),
            frame: session.frame.clone(),
            current_music: session.current_music.clone(),
            trace: session.trace.clone(),
            rng_state: self.rng_state,
            timer_remaining: session.timer.map(|timer| timer.remaining()),
        })
    }

    /// Re-presents a snapshotted frame. Hooks do not run again and no trace
    /// node is appended; choice visibility is re-evaluated against the
    /// current game state.
    pub fn resume(
        &mut self,
        snapshot: SessionSnapshot,
        callback: Option<CompletionCallback>,
    ) -> Result<DialogueOutput, DialogueError> {
        if snapshot.schema_version != SNAPSHOT_SCHEMA_V1 {
            return Err(DialogueError::session(
                "ENGINE_SNAPSHOT_SCHEMA",
                format!(
                    "Unsupported snapshot schema \"{}\", expected \"{}\".",
                    snapshot.schema_version, SNAPSHOT_SCHEMA_V1
                ),
            ));
        }
        if self.session.is_some() {
            return Err(DialogueError::session(
                "ENGINE_SESSION_ACTIVE",
                "A dialogue session is already running; close it first.",
            ));
        }

        let scene = self.scenes.load_scene(&snapshot.scene)?;
        let frame = scene.frame(&snapshot.frame)?;
        if frame.kind == FrameKind::Blank {
            return Err(DialogueError::session(
                "ENGINE_SNAPSHOT_STATE",
                format!("{} is a blank frame and cannot be resumed.", frame.path()),
            ));
        }

        let mut session = Session::new(scene.clone(), callback);
        session.frame = frame.name.clone();
        session.current_music = snapshot.current_music.clone();
        session.trace = snapshot.trace;
        session.state = SessionState::Presenting;
        self.last_close = None;
        self.session = Some(session);
        self.rng_state = snapshot.rng_state;

        let context = ScriptContext::new(&scene.name, &frame.name);
        let view = self.build_view(frame, &context, snapshot.current_music.as_deref());

        if let Some(session) = self.session.as_mut() {
            session.timer = match (snapshot.timer_remaining, view.timer_seconds) {
                (Some(remaining), Some(_)) => Some(FrameTimer::new(remaining)),
                _ => None,
            };
            session.view = Some(view.clone());
        }
        log::debug!("[dialogue] resumed {}", frame.path());
        Ok(DialogueOutput::Frame { frame: view })
    }
}
