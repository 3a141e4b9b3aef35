use std::sync::Arc;

use dlg_core::{
    DialogueError, DialogueScene, DialogueTraceNode, Frame, FrameKind, HookKind, MusicDirective,
    PresentedChoice, PresentedFrame, PresentedKind, SessionState,
};

use super::lifecycle::no_session;
use super::{DialogueEngine, FrameTimer};
use crate::evaluator::evaluate;
use crate::host::ScriptContext;

pub(super) enum Presented {
    Shown(PresentedFrame),
    /// Blank frame: advance as if choice 0 was taken.
    AutoAdvance,
}

impl DialogueEngine {
    pub(super) fn present(
        &mut self,
        scene: Arc<DialogueScene>,
        frame_name: &str,
    ) -> Result<Presented, DialogueError> {
        let frame = scene.frame(frame_name)?;
        let context = ScriptContext::new(&scene.name, &frame.name);
        {
            let session = self.session.as_mut().ok_or_else(no_session)?;
            session.timer = None;
            session.view = None;
            session.scene = Arc::clone(&scene);
            session.frame = frame.name.clone();
            session.state = SessionState::Presenting;
        }
        log::debug!("[dialogue] present {}", frame.path());

        self.run_hook(frame, HookKind::BeforePresent, context.clone());

        if frame.kind == FrameKind::Blank {
            self.run_hook(frame, HookKind::OnPresent, context);
            return Ok(Presented::AutoAdvance);
        }

        let current_music = self
            .session
            .as_ref()
            .and_then(|session| session.current_music.clone());
        let view = self.build_view(frame, &context, current_music.as_deref());

        if let Some(session) = self.session.as_mut() {
            match &view.music {
                MusicDirective::Play { cue } => session.current_music = Some(cue.clone()),
                MusicDirective::Clear => session.current_music = None,
                MusicDirective::Unchanged => {}
            }
        }

        self.record_trace(DialogueTraceNode {
            path: frame.path(),
            choice: None,
            speaker: frame.options.trace_speaker.clone().or_else(|| view.speaker.clone()),
            text: frame
                .options
                .trace_text
                .clone()
                .or_else(|| Some(view.text.clone())),
            ignored: frame.options.trace_ignored(),
        });

        self.run_hook(frame, HookKind::OnPresent, context);

        if let Some(session) = self.session.as_mut() {
            session.timer = view.timer_seconds.map(FrameTimer::new);
            session.view = Some(view.clone());
        }
        Ok(Presented::Shown(view))
    }

    /// Resolves everything a host renders for `frame`, evaluating choice
    /// visibility. Runs no hooks and records no trace.
    pub(super) fn build_view(
        &mut self,
        frame: &Frame,
        context: &ScriptContext,
        current_music: Option<&str>,
    ) -> PresentedFrame {
        let speaker = frame
            .name_text
            .as_deref()
            .map(|template| self.macros.expand(template, self.state.as_ref()));
        let text = frame
            .text
            .as_deref()
            .map(|template| self.macros.expand(template, self.state.as_ref()))
            .unwrap_or_default();
        let next_text = match frame.next_text.as_deref() {
            Some(template) => self.macros.expand(template, self.state.as_ref()),
            None => self.config.default_next_text.clone(),
        };

        let music = match frame.music.as_deref() {
            None => MusicDirective::Unchanged,
            Some("") => MusicDirective::Clear,
            Some(cue) if Some(cue) == current_music => MusicDirective::Unchanged,
            Some(cue) => MusicDirective::Play {
                cue: cue.to_string(),
            },
        };

        let (kind, choices) = match &frame.kind {
            FrameKind::Choice(_) => (PresentedKind::Choice, self.visible_choices(frame, context)),
            FrameKind::Image(_) => (PresentedKind::Image, Vec::new()),
            FrameKind::Text(_) | FrameKind::Blank => (PresentedKind::Text, Vec::new()),
        };
        let timing = frame.kind.timing();

        PresentedFrame {
            scene: frame.scene_name.clone(),
            frame: frame.name.clone(),
            kind,
            speaker,
            text,
            next_text,
            background: frame.background.clone(),
            image: frame.image.clone(),
            position: frame.position,
            camera_direction: frame.camera_direction.clone(),
            music,
            choices,
            allow_skip: timing.map(|timing| timing.allow_skip).unwrap_or(true),
            hide_skip: timing.map(|timing| timing.hide_skip).unwrap_or(false),
            timer_seconds: timing
                .filter(|timing| timing.use_timer && timing.time_to_show > 0.0)
                .map(|timing| timing.time_to_show),
            options: frame.options.clone(),
        }
    }

    fn visible_choices(&mut self, frame: &Frame, context: &ScriptContext) -> Vec<PresentedChoice> {
        let mut visible = Vec::new();
        for (index, choice) in frame.choices().iter().enumerate() {
            let context = context.clone().with_choice(index);
            if let Some(show) = &choice.show_condition {
                if !evaluate(show, self.state.as_mut(), self.scripts.as_mut(), &context) {
                    continue;
                }
            }
            if let Some(hide) = &choice.hide_condition {
                if evaluate(hide, self.state.as_mut(), self.scripts.as_mut(), &context) {
                    continue;
                }
            }

            let mut text = self.macros.expand(&choice.text, self.state.as_ref());
            let mut locked = false;
            let mut skill_check = None;
            if let Some(check) = &choice.skill_check {
                let info = self.resolver.info(check, self.state.as_ref());
                if !info.possible {
                    if !self.config.show_impossible_checks {
                        continue;
                    }
                    locked = !self.config.attempt_impossible_checks;
                }
                text = self
                    .resolver
                    .decorate_choice_text(check, self.state.as_ref(), &text);
                skill_check = Some(info);
            }

            visible.push(PresentedChoice {
                index,
                text,
                locked,
                skill_check,
            });
        }
        if visible.is_empty() {
            log::warn!("[dialogue] {} has no visible choices", frame.path());
        }
        visible
    }

    pub(super) fn record_trace(&mut self, node: DialogueTraceNode) {
        if !self.config.trace_enabled {
            return;
        }
        if let Some(sink) = self.trace_sink.as_mut() {
            sink.append(&node);
        }
        if let Some(session) = self.session.as_mut() {
            session.trace.append(node);
        }
    }
}
