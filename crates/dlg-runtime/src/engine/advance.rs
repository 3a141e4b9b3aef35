use dlg_core::{
    CloseReason, DialogueError, DialogueEvent, DialogueOutput, DialogueTraceNode, FrameKind,
    HookKind, SessionState,
};

use super::lifecycle::{is_fatal, no_session};
use super::{DialogueEngine, Step};
use crate::evaluator::first_passing_rule;
use crate::host::ScriptContext;
use crate::microscript::execute;

impl DialogueEngine {
    pub fn handle_event(&mut self, event: DialogueEvent) -> Result<DialogueOutput, DialogueError> {
        match event {
            DialogueEvent::Choose { index } => self.advance_and_run(Some(index)),
            DialogueEvent::Continue => self.advance_and_run(None),
            DialogueEvent::Cancel => self.cancel(),
        }
    }

    /// Selects a choice by its index in the frame's declared list.
    pub fn choose(&mut self, index: usize) -> Result<DialogueOutput, DialogueError> {
        self.handle_event(DialogueEvent::Choose { index })
    }

    pub fn continue_frame(&mut self) -> Result<DialogueOutput, DialogueError> {
        self.handle_event(DialogueEvent::Continue)
    }

    pub(super) fn advance_and_run(
        &mut self,
        choice: Option<usize>,
    ) -> Result<DialogueOutput, DialogueError> {
        match self.advance(choice) {
            Ok(step) => self.run_steps(step),
            Err(error) if is_fatal(&error) => Err(self.abort(error)),
            Err(error) => Err(error),
        }
    }

    /// Leaves the current frame: resolves the destination, applies
    /// microscripts, records the trace and dispatches. `None` is the plain
    /// continue action, equivalent to choice 0 on non-choice frames.
    pub(super) fn advance(&mut self, choice: Option<usize>) -> Result<Step, DialogueError> {
        let (scene, frame_name) = {
            let session = self.session.as_ref().ok_or_else(no_session)?;
            if session.state != SessionState::Presenting {
                return Err(DialogueError::session(
                    "ENGINE_NOT_PRESENTING",
                    "The session is not waiting for input.",
                ));
            }
            (session.scene.clone(), session.frame.clone())
        };
        let frame = scene.frame(&frame_name)?;
        let context = ScriptContext::new(&scene.name, &frame.name);

        let selected = match (&frame.kind, choice) {
            (FrameKind::Choice(_), None) => {
                return Err(DialogueError::session(
                    "ENGINE_CHOICE_REQUIRED",
                    format!("{} waits for a choice.", frame.path()),
                ))
            }
            (FrameKind::Choice(choices), Some(index)) => {
                let offered = self
                    .current()
                    .and_then(|view| view.choice(index))
                    .map(|presented| (presented.locked, presented.text.clone()));
                match (choices.get(index), offered) {
                    (Some(node), Some((false, text))) => Some((index, node, text)),
                    (Some(_), Some((true, _))) => {
                        return Err(DialogueError::session(
                            "ENGINE_CHOICE_LOCKED",
                            format!("Choice {} on {} is locked.", index, frame.path()),
                        ))
                    }
                    _ => {
                        return Err(DialogueError::session(
                            "ENGINE_CHOICE_INDEX",
                            format!("Choice {} is not offered on {}.", index, frame.path()),
                        ))
                    }
                }
            }
            (_, Some(index)) if index != 0 => {
                return Err(DialogueError::session(
                    "ENGINE_CHOICE_INDEX",
                    format!("{} has no choices; only index 0 continues.", frame.path()),
                ))
            }
            (_, _) => None,
        };

        self.cancel_timer();
        if let Some(session) = self.session.as_mut() {
            session.state = SessionState::Advancing;
        }

        let destination = match selected {
            Some((index, node, text)) => {
                let context = context.clone().with_choice(index);
                let destination = if let Some(check) = &node.skill_check {
                    Some(
                        self.resolver
                            .evaluate_skill_check(check, self.state.as_ref(), &mut self.rng_state)
                            .to_string(),
                    )
                } else if let Some(next) = first_passing_rule(
                    &node.next_conditional,
                    self.state.as_mut(),
                    self.scripts.as_mut(),
                    &context,
                ) {
                    Some(next.to_string())
                } else {
                    node.next.clone()
                };

                for microscript in &node.next_microscript {
                    execute(
                        microscript,
                        self.state.as_mut(),
                        self.scripts.as_mut(),
                        &context,
                        &mut self.delays,
                    );
                }
                if self.config.execute_frame_microscripts_on_choice {
                    for microscript in &frame.microscripts {
                        execute(
                            microscript,
                            self.state.as_mut(),
                            self.scripts.as_mut(),
                            &context,
                            &mut self.delays,
                        );
                    }
                }

                self.record_trace(DialogueTraceNode {
                    path: frame.path(),
                    choice: Some(index),
                    speaker: None,
                    text: Some(text),
                    ignored: frame.options.trace_ignored(),
                });
                self.run_hook(frame, HookKind::OnChoice, context);
                destination
            }
            None => {
                let destination = match first_passing_rule(
                    &frame.next_conditional,
                    self.state.as_mut(),
                    self.scripts.as_mut(),
                    &context,
                ) {
                    Some(next) => Some(next.to_string()),
                    None => frame.next.clone(),
                };
                for microscript in &frame.microscripts {
                    execute(
                        microscript,
                        self.state.as_mut(),
                        self.scripts.as_mut(),
                        &context,
                        &mut self.delays,
                    );
                }
                if frame.kind != FrameKind::Blank {
                    let next_text = self
                        .current()
                        .map(|view| view.next_text.clone())
                        .unwrap_or_else(|| self.config.default_next_text.clone());
                    self.record_trace(DialogueTraceNode {
                        path: frame.path(),
                        choice: None,
                        speaker: None,
                        text: Some(next_text),
                        ignored: frame.options.trace_ignored(),
                    });
                }
                destination
            }
        };

        self.run_hook(frame, HookKind::OnUnpresent, context);

        match destination {
            Some(destination) => self.dispatch(&destination),
            None => {
                log::warn!(
                    "[dialogue] {} has no next destination; closing",
                    frame.path()
                );
                self.close_session(CloseReason::Returned);
                Ok(Step::Closed(CloseReason::Returned))
            }
        }
    }
}
