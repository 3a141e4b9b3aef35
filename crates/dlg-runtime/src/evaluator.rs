use dlg_core::{
    evaluate_comparison, ComparisonType, ConditionKind, ConditionNode, Conditional, DlgValue,
};

use crate::host::{GameState, ScriptContext, ScriptRunner};

/// Evaluates one predicate against live state.
///
/// `item` with `consume` removes the matched quantity from the inventory
/// when it passes; evaluating a consuming condition is a state change.
pub fn evaluate(
    conditional: &Conditional,
    state: &mut dyn GameState,
    scripts: &mut dyn ScriptRunner,
    context: &ScriptContext,
) -> bool {
    let target = conditional.target.as_str();
    match conditional.kind {
        ConditionKind::Flag => state.flag(target) == expected_truth(conditional),
        ConditionKind::NoFlag => state.flag(target) != expected_truth(conditional),
        ConditionKind::Variable => match state.variable(target) {
            Some(actual) => compare_or_truthy(&actual, conditional),
            None => compare_or_truthy(&DlgValue::Number(0.0), conditional),
        },
        ConditionKind::ActorValue => match state.actor_value(target) {
            Ok(actual) => compare_or_truthy(&actual, conditional),
            Err(error) => {
                log::warn!("[dialogue] condition on actor value failed: {}", error);
                false
            }
        },
        ConditionKind::Affinity => {
            let actual = DlgValue::Number(state.affinity(target));
            compare_with_default(&actual, conditional, ComparisonType::Greater, DlgValue::Number(0.0))
        }
        ConditionKind::Quest => evaluate_quest(conditional, state),
        ConditionKind::Item => evaluate_item(conditional, state),
        ConditionKind::Exec => match scripts.evaluate(target, context, conditional.value.as_ref()) {
            Ok(result) => result,
            Err(error) => {
                log::warn!(
                    "[dialogue] exec condition \"{}\" at {}.{} failed: {}",
                    target,
                    context.scene,
                    context.frame,
                    error
                );
                false
            }
        },
        ConditionKind::Unknown => {
            log::warn!(
                "[dialogue] unknown condition kind on \"{}\" at {}.{}; treated as false",
                target,
                context.scene,
                context.frame
            );
            false
        }
    }
}

/// True when every predicate holds; an empty list holds.
pub fn evaluate_all(
    conditions: &[Conditional],
    state: &mut dyn GameState,
    scripts: &mut dyn ScriptRunner,
    context: &ScriptContext,
) -> bool {
    conditions
        .iter()
        .all(|conditional| evaluate(conditional, state, scripts, context))
}

/// Tests rules from last-declared to first and returns the first passing
/// rule's destination.
pub fn first_passing_rule<'a>(
    rules: &'a [ConditionNode],
    state: &mut dyn GameState,
    scripts: &mut dyn ScriptRunner,
    context: &ScriptContext,
) -> Option<&'a str> {
    rules
        .iter()
        .rev()
        .find(|rule| evaluate_all(&rule.conditions, state, scripts, context))
        .map(|rule| rule.next.as_str())
}

fn expected_truth(conditional: &Conditional) -> bool {
    conditional
        .value
        .as_ref()
        .map(DlgValue::is_truthy)
        .unwrap_or(true)
}

fn compare_or_truthy(actual: &DlgValue, conditional: &Conditional) -> bool {
    match (conditional.comparison, conditional.value.as_ref()) {
        (Some(comparison), Some(expected)) => evaluate_comparison(actual, comparison, expected),
        (None, Some(expected)) => evaluate_comparison(actual, ComparisonType::Equal, expected),
        (_, None) => actual.is_truthy(),
    }
}

fn compare_with_default(
    actual: &DlgValue,
    conditional: &Conditional,
    default_comparison: ComparisonType,
    default_value: DlgValue,
) -> bool {
    let comparison = conditional.comparison.unwrap_or(default_comparison);
    let expected = conditional.value.clone().unwrap_or(default_value);
    evaluate_comparison(actual, comparison, &expected)
}

fn evaluate_quest(conditional: &Conditional, state: &mut dyn GameState) -> bool {
    let target = conditional.target.as_str();
    let stage = state.quest_stage(target);
    match conditional.comparison {
        Some(ComparisonType::Started) => (stage != 0) == expected_truth(conditional),
        Some(ComparisonType::Finished) => {
            state.is_quest_finished(target) == expected_truth(conditional)
        }
        None if conditional.value.is_none() => stage != 0,
        _ => compare_with_default(
            &DlgValue::from(stage),
            conditional,
            ComparisonType::GreaterEqual,
            DlgValue::Number(1.0),
        ),
    }
}

fn evaluate_item(conditional: &Conditional, state: &mut dyn GameState) -> bool {
    let target = conditional.target.as_str();
    let held = DlgValue::from(state.item_count(target));
    let passed = compare_with_default(
        &held,
        conditional,
        ComparisonType::GreaterEqual,
        DlgValue::Number(1.0),
    );
    if passed && conditional.comparison == Some(ComparisonType::Consume) {
        let quantity = conditional
            .value
            .as_ref()
            .and_then(DlgValue::as_number)
            .map(|count| count.round() as i64)
            .unwrap_or(1);
        if !state.take_item(target, quantity) {
            return false;
        }
        log::debug!("[dialogue] consumed {} x \"{}\"", quantity, target);
    }
    passed
}

#[cfg(test)]
mod evaluator_tests {
    use super::*;
    use crate::host::{GameStateMutator, GameStateQuery, NoScripts};
    use crate::state::MemoryGameState;
    use dlg_core::DialogueError;

    struct FixedScripts(Result<bool, &'static str>);

    impl ScriptRunner for FixedScripts {
        fn call(
            &mut self,
            name: &str,
            _context: &ScriptContext,
            _arg: Option<&DlgValue>,
        ) -> Result<DlgValue, DialogueError> {
            match self.0 {
                Ok(value) => Ok(DlgValue::Bool(value)),
                Err(message) => Err(DialogueError::script("SCRIPT_EVAL_ERROR", format!("{}: {}", name, message))),
            }
        }
    }

    fn check(conditional: &Conditional, state: &mut MemoryGameState) -> bool {
        evaluate(conditional, state, &mut NoScripts, &ScriptContext::new("s", "f"))
    }

    #[test]
    fn flag_and_noflag_are_negations() {
        let mut state = MemoryGameState::default();
        state.set_flag("met", true);
        assert!(check(&Conditional::new(ConditionKind::Flag, "met"), &mut state));
        assert!(!check(&Conditional::new(ConditionKind::NoFlag, "met"), &mut state));
        assert!(check(&Conditional::new(ConditionKind::NoFlag, "other"), &mut state));
    }

    #[test]
    fn variable_and_actor_value_use_shared_comparison() {
        let mut state = MemoryGameState::default();
        state.set_variable("gold", DlgValue::from("12"));
        let rich = Conditional::new(ConditionKind::Variable, "gold").compared(ComparisonType::GreaterEqual, 10.0);
        assert!(check(&rich, &mut state));
        let exact = Conditional::new(ConditionKind::Variable, "gold").compared(ComparisonType::Equal, 12i64);
        assert!(check(&exact, &mut state));

        let level = Conditional::new(ConditionKind::ActorValue, "Level").compared(ComparisonType::Less, 2i64);
        assert!(check(&level, &mut state));
        let unknown = Conditional::new(ConditionKind::ActorValue, "Charm").compared(ComparisonType::Less, 2i64);
        assert!(!check(&unknown, &mut state));
    }

    #[test]
    fn quest_started_finished_and_stage_comparison() {
        let mut state = MemoryGameState::default();
        let started = Conditional::new(ConditionKind::Quest, "rescue");
        assert!(!check(&started, &mut state));
        state.start_quest("rescue", 2);
        assert!(check(&started, &mut state));
        let at_least_two = Conditional::new(ConditionKind::Quest, "rescue").compared(ComparisonType::GreaterEqual, 2i64);
        assert!(check(&at_least_two, &mut state));
        let finished = Conditional::new(ConditionKind::Quest, "rescue").compared(ComparisonType::Finished, true);
        assert!(!check(&finished, &mut state));
        state.finish_quest("rescue");
        assert!(check(&finished, &mut state));
        assert!(check(&started, &mut state));
        let not_started = Conditional::new(ConditionKind::Quest, "rescue").compared(ComparisonType::Started, false);
        assert!(!check(&not_started, &mut state));
    }

    #[test]
    fn consume_removes_items_only_when_it_passes() {
        let mut state = MemoryGameState::default();
        state.give_item("potion", 3);
        let consume = Conditional::new(ConditionKind::Item, "potion").compared(ComparisonType::Consume, 2i64);
        assert!(check(&consume, &mut state));
        assert_eq!(state.item_count("potion"), 1);
        assert!(!check(&consume, &mut state));
        assert_eq!(state.item_count("potion"), 1);

        let has_any = Conditional::new(ConditionKind::Item, "potion");
        assert!(check(&has_any, &mut state));
        assert_eq!(state.item_count("potion"), 1);
    }

    #[test]
    fn affinity_defaults_to_positive() {
        let mut state = MemoryGameState::default();
        let liked = Conditional::new(ConditionKind::Affinity, "mira");
        assert!(!check(&liked, &mut state));
        state.set_affinity("mira", 15.0);
        assert!(check(&liked, &mut state));
        let close = Conditional::new(ConditionKind::Affinity, "mira").compared(ComparisonType::Greater, 20.0);
        assert!(!check(&close, &mut state));
    }

    #[test]
    fn exec_delegates_and_fails_closed() {
        let mut state = MemoryGameState::default();
        let exec = Conditional::new(ConditionKind::Exec, "is_night");
        let context = ScriptContext::new("s", "f");
        assert!(evaluate(&exec, &mut state, &mut FixedScripts(Ok(true)), &context));
        assert!(!evaluate(&exec, &mut state, &mut FixedScripts(Ok(false)), &context));
        assert!(!evaluate(&exec, &mut state, &mut FixedScripts(Err("boom")), &context));
        assert!(!evaluate(&exec, &mut state, &mut NoScripts, &context));
    }

    #[test]
    fn unknown_kind_fails_closed() {
        let mut state = MemoryGameState::default();
        assert!(!check(&Conditional::new(ConditionKind::Unknown, "x"), &mut state));
    }

    #[test]
    fn rules_are_tested_last_declared_first() {
        let mut state = MemoryGameState::default();
        state.set_flag("a", true);
        state.set_flag("c", true);
        let rule = |next: &str, flag: &str| ConditionNode {
            next: next.to_string(),
            conditions: vec![Conditional::new(ConditionKind::Flag, flag)],
        };
        let rules = vec![rule("A", "a"), rule("B", "b"), rule("C", "c")];
        let context = ScriptContext::new("s", "f");
        assert_eq!(
            first_passing_rule(&rules, &mut state, &mut NoScripts, &context),
            Some("C")
        );
        state.set_flag("c", false);
        assert_eq!(
            first_passing_rule(&rules, &mut state, &mut NoScripts, &context),
            Some("A")
        );
        state.set_flag("a", false);
        assert_eq!(first_passing_rule(&rules, &mut state, &mut NoScripts, &context), None);

        let vacuous = vec![ConditionNode {
            next: "always".to_string(),
            conditions: Vec::new(),
        }];
        assert_eq!(
            first_passing_rule(&vacuous, &mut state, &mut NoScripts, &context),
            Some("always")
        );
    }
}
