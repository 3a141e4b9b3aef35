use dlg_core::{
    CloseReason, DialogueError, DialogueOutput, ErrorKind, Frame, HookKind, SessionState,
};

use super::present::Presented;
use super::{CompletionCallback, DialogueEngine, Session, Step, MAX_TRANSITIONS};
use crate::host::ScriptContext;

impl DialogueEngine {
    /// Opens `scene` and presents `frame` (its default frame when `None`).
    pub fn start(
        &mut self,
        scene: &str,
        frame: Option<&str>,
        callback: Option<CompletionCallback>,
    ) -> Result<DialogueOutput, DialogueError> {
        if self.session.is_some() {
            return Err(DialogueError::session(
                "ENGINE_SESSION_ACTIVE",
                "A dialogue session is already running; close it first.",
            ));
        }
        let scene = self.scenes.load_scene(scene)?;
        log::debug!("[dialogue:{}] session start", scene.name);

        let frame = frame
            .map(str::to_string)
            .unwrap_or_else(|| scene.default_frame.clone());
        self.last_close = None;
        self.session = Some(Session::new(scene.clone(), callback));
        self.run_steps(Step::Present { scene, frame })
    }

    /// Ends the running session with `reason`. Returns false when there is
    /// nothing to close, so calling it twice is harmless.
    pub fn close_session(&mut self, reason: CloseReason) -> bool {
        let Some(mut session) = self.session.take() else {
            return false;
        };
        session.timer = None;
        session.state = SessionState::Closed;
        log::debug!(
            "[dialogue:{}] session closed: {:?}",
            session.scene.name,
            reason
        );

        if let Ok(frame) = session.scene.frame(&session.frame) {
            let context = ScriptContext::new(&session.scene.name, &frame.name);
            self.run_hook(frame, HookKind::OnClose, context);
        }

        self.last_trace = std::mem::take(&mut session.trace);
        self.last_close = Some(reason.clone());
        if let Some(callback) = session.callback.take() {
            if let Err(error) = callback(&reason) {
                log::error!("[dialogue] completion callback failed: {}", error);
            }
        }
        true
    }

    /// Closes the session on the host's behalf.
    pub fn cancel(&mut self) -> Result<DialogueOutput, DialogueError> {
        if !self.close_session(CloseReason::Cancelled) {
            return Err(no_session());
        }
        Ok(DialogueOutput::Closed {
            reason: CloseReason::Cancelled,
        })
    }

    pub(super) fn abort(&mut self, error: DialogueError) -> DialogueError {
        log::error!("[dialogue] session aborted: {}", error);
        self.close_session(CloseReason::Aborted {
            code: error.code.clone(),
        });
        error
    }

    /// Drives navigation until a frame is on screen or the session closed.
    pub(super) fn run_steps(&mut self, mut step: Step) -> Result<DialogueOutput, DialogueError> {
        for _ in 0..MAX_TRANSITIONS {
            let presented = match step {
                Step::Closed(reason) => return Ok(DialogueOutput::Closed { reason }),
                Step::Present { scene, frame } => self.present(scene, &frame),
            };
            step = match presented {
                Ok(Presented::Shown(frame)) => return Ok(DialogueOutput::Frame { frame }),
                Ok(Presented::AutoAdvance) => match self.advance(None) {
                    Ok(next) => next,
                    Err(error) => return Err(self.abort(error)),
                },
                Err(error) => return Err(self.abort(error)),
            };
        }
        Err(self.abort(DialogueError::session(
            "ENGINE_GUARD_EXCEEDED",
            format!(
                "Dialogue navigation exceeded {} transitions without presenting a frame.",
                MAX_TRANSITIONS
            ),
        )))
    }

    /// Runs a hook script. Failures are logged and never interrupt the
    /// caller.
    pub(super) fn run_hook(&mut self, frame: &Frame, hook: HookKind, context: ScriptContext) {
        let Some(name) = frame.scripts.get(hook) else {
            return;
        };
        let context = context.with_hook(hook);
        if let Err(error) = self.scripts.call(name, &context, None) {
            log::warn!(
                "[dialogue] {} script \"{}\" on {} failed ({:?}): {}",
                hook.name(),
                name,
                frame.path(),
                error.kind,
                error
            );
        }
    }
}

pub(super) fn no_session() -> DialogueError {
    DialogueError::session("ENGINE_NO_SESSION", "No dialogue session is running.")
}

/// Errors that end the session rather than just rejecting one call.
pub(super) fn is_fatal(error: &DialogueError) -> bool {
    matches!(error.kind, ErrorKind::FrameNotFound | ErrorKind::SceneNotFound)
}
