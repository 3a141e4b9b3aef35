use dlg_core::{DelayTimeType, DlgValue, MicroscriptAction, MicroscriptKind, MicroscriptNode};

use crate::host::{GameState, ScriptContext, ScriptRunner};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicroscriptOutcome {
    Applied,
    Scheduled,
    Ignored,
}

/// Applies `node`, or queues it when it carries a positive delay.
pub fn execute(
    node: &MicroscriptNode,
    state: &mut dyn GameState,
    scripts: &mut dyn ScriptRunner,
    context: &ScriptContext,
    delays: &mut DelayQueue,
) -> MicroscriptOutcome {
    if let Some(delay) = node.delay.filter(|delay| delay.seconds > 0.0 || delay.absolute) {
        delays.schedule(node.clone(), context.clone(), delay.seconds, delay.time_type, delay.absolute);
        return MicroscriptOutcome::Scheduled;
    }
    apply_now(node, state, scripts, context)
}

/// Applies `node` immediately, ignoring any delay. Malformed or failing
/// nodes are logged and leave state untouched.
pub fn apply_now(
    node: &MicroscriptNode,
    state: &mut dyn GameState,
    scripts: &mut dyn ScriptRunner,
    context: &ScriptContext,
) -> MicroscriptOutcome {
    let target = node.target.as_str();
    let value = node.value.as_ref();
    let number = value.and_then(DlgValue::as_number);
    let count = number.map(|number| number.round() as i64).unwrap_or(1);

    let applied = match (node.kind, node.action) {
        (MicroscriptKind::Flag, MicroscriptAction::Set) => {
            state.set_flag(target, value.map(DlgValue::is_truthy).unwrap_or(true));
            true
        }
        (MicroscriptKind::Flag, MicroscriptAction::Toggle) => {
            let current = state.flag(target);
            state.set_flag(target, !current);
            true
        }

        (MicroscriptKind::Variable, MicroscriptAction::Set) => {
            state.set_variable(target, value.cloned().unwrap_or(DlgValue::Bool(true)));
            true
        }
        (MicroscriptKind::Variable, MicroscriptAction::Toggle) => {
            let current = state.variable(target).map(|value| value.is_truthy()).unwrap_or(false);
            state.set_variable(target, DlgValue::Bool(!current));
            true
        }
        (MicroscriptKind::Variable, MicroscriptAction::Add) => {
            let current = state.variable(target).unwrap_or(DlgValue::Number(0.0));
            match value.and_then(|delta| current.add(delta)) {
                Some(sum) => {
                    state.set_variable(target, sum);
                    true
                }
                None => false,
            }
        }

        (MicroscriptKind::ActorValue, MicroscriptAction::Set) => match value {
            Some(value) => report(state.set_actor_value(target, value.clone()), node),
            None => false,
        },
        (MicroscriptKind::ActorValue, MicroscriptAction::Add) => {
            let current = state.actor_value(target);
            match (current, value) {
                (Ok(current), Some(delta)) => match current.add(delta) {
                    Some(sum) => report(state.set_actor_value(target, sum), node),
                    None => false,
                },
                (Err(error), _) => report(Err(error), node),
                (Ok(_), None) => false,
            }
        }
        (MicroscriptKind::ActorValue, MicroscriptAction::Toggle) => match state.actor_value(target) {
            Ok(current) => report(
                state.set_actor_value(target, DlgValue::Bool(!current.is_truthy())),
                node,
            ),
            Err(error) => report(Err(error), node),
        },

        (MicroscriptKind::Affinity, MicroscriptAction::Set) => match number {
            Some(number) => {
                state.set_affinity(target, number);
                true
            }
            None => false,
        },
        (MicroscriptKind::Affinity, MicroscriptAction::Add) => match number {
            Some(delta) => {
                let current = state.affinity(target);
                state.set_affinity(target, current + delta);
                true
            }
            None => false,
        },

        (MicroscriptKind::Item, MicroscriptAction::Give) => {
            state.give_item(target, count);
            true
        }
        (MicroscriptKind::Item, MicroscriptAction::Take) => {
            if !state.take_item(target, count) {
                log::debug!("[dialogue] not enough \"{}\" to take {}", target, count);
            }
            true
        }
        (MicroscriptKind::Item, MicroscriptAction::Add) => {
            if count >= 0 {
                state.give_item(target, count);
            } else {
                state.take_item(target, -count);
            }
            true
        }
        (MicroscriptKind::Item, MicroscriptAction::Set) => {
            let held = state.item_count(target);
            let wanted = count.max(0);
            if wanted > held {
                state.give_item(target, wanted - held);
            } else if wanted < held {
                state.take_item(target, held - wanted);
            }
            true
        }

        (MicroscriptKind::Quest, MicroscriptAction::Start) => {
            state.start_quest(target, number.map(|stage| stage as i64).unwrap_or(1));
            true
        }
        (MicroscriptKind::Quest, MicroscriptAction::Finish) => {
            state.finish_quest(target);
            true
        }
        (MicroscriptKind::Quest, MicroscriptAction::Set) => match number {
            Some(stage) => {
                state.set_quest_stage(target, stage as i64);
                true
            }
            None => false,
        },
        (MicroscriptKind::Quest, MicroscriptAction::Add) => {
            let current = state.quest_stage(target);
            state.set_quest_stage(target, current + count);
            true
        }

        (MicroscriptKind::Exec, _) => match scripts.call(target, context, value) {
            Ok(_) => true,
            Err(error) => {
                log::warn!(
                    "[dialogue] exec microscript \"{}\" at {}.{} failed: {}",
                    target,
                    context.scene,
                    context.frame,
                    error
                );
                return MicroscriptOutcome::Ignored;
            }
        },

        (MicroscriptKind::Unknown, _) => {
            log::warn!(
                "[dialogue] microscript on \"{}\" has no recognized kind; ignored",
                target
            );
            return MicroscriptOutcome::Ignored;
        }
        (kind, action) => {
            log::warn!(
                "[dialogue] microscript action {:?} is not supported for {:?} \"{}\"",
                action,
                kind,
                target
            );
            return MicroscriptOutcome::Ignored;
        }
    };

    if applied {
        MicroscriptOutcome::Applied
    } else {
        log::warn!(
            "[dialogue] microscript {:?} {:?} on \"{}\" had an unusable value {:?}",
            node.kind,
            node.action,
            target,
            node.value
        );
        MicroscriptOutcome::Ignored
    }
}

fn report(result: Result<(), dlg_core::DialogueError>, node: &MicroscriptNode) -> bool {
    match result {
        Ok(()) => true,
        Err(error) => {
            log::warn!("[dialogue] microscript on \"{}\" failed: {}", node.target, error);
            false
        }
    }
}

/// A microscript waiting for its clock.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMicroscript {
    pub node: MicroscriptNode,
    pub context: ScriptContext,
    pub time_type: DelayTimeType,
    pub deadline: f64,
    sequence: u64,
}

/// Delayed microscripts, each keyed to one of three clocks. The queue
/// belongs to the engine, not a session, so closing a dialogue does not
/// drop pending effects.
#[derive(Debug, Default)]
pub struct DelayQueue {
    game_time: f64,
    real_time: f64,
    world_time: f64,
    next_sequence: u64,
    pending: Vec<PendingMicroscript>,
}

impl DelayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self, time_type: DelayTimeType) -> f64 {
        match time_type {
            DelayTimeType::Game => self.game_time,
            DelayTimeType::Real => self.real_time,
            DelayTimeType::World => self.world_time,
        }
    }

    pub fn schedule(
        &mut self,
        node: MicroscriptNode,
        context: ScriptContext,
        seconds: f64,
        time_type: DelayTimeType,
        absolute: bool,
    ) {
        let deadline = if absolute {
            seconds
        } else {
            self.now(time_type) + seconds
        };
        log::debug!(
            "[dialogue] microscript on \"{}\" scheduled at {:?} {}",
            node.target,
            time_type,
            deadline
        );
        self.pending.push(PendingMicroscript {
            node,
            context,
            time_type,
            deadline,
            sequence: self.next_sequence,
        });
        self.next_sequence += 1;
    }

    /// Advances the clocks and drains every entry whose deadline passed,
    /// earliest first. The game clock only moves while `game_running`.
    pub fn advance(
        &mut self,
        real_seconds: f64,
        world_seconds: f64,
        game_running: bool,
    ) -> Vec<PendingMicroscript> {
        let real_seconds = real_seconds.max(0.0);
        self.real_time += real_seconds;
        self.world_time += world_seconds.max(0.0);
        if game_running {
            self.game_time += real_seconds;
        }

        let (mut due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|entry| entry.deadline <= self.now(entry.time_type));
        self.pending = waiting;
        due.sort_by(|left, right| {
            left.deadline
                .total_cmp(&right.deadline)
                .then(left.sequence.cmp(&right.sequence))
        });
        due
    }

    pub fn pending(&self) -> &[PendingMicroscript] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
