use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use dlg_core::{DialogueError, DlgValue};
use rhai::{Dynamic, Engine, EvalAltResult, ImmutableString, Position, Scope, AST, FLOAT, INT};

use crate::host::{GameStateMutator, GameStateQuery, ScriptContext, ScriptRunner};
use crate::rng::next_random_bounded;
use crate::state::SharedGameState;

const MAX_SCRIPT_OPERATIONS: u64 = 100_000;

/// Runs named Rhai scripts against a shared game state.
///
/// Every script sees `scene`, `frame`, `hook` (empty outside hooks),
/// `choice` (`-1` outside choices) and `arg` (`()` when absent), plus
/// `get_flag`, `set_flag`, `get_var`, `set_var`, `item_count`,
/// `give_item`, `quest_stage` and `random(n)`.
pub struct RhaiScriptRunner {
    engine: Engine,
    scripts: BTreeMap<String, AST>,
    rng_state: Rc<RefCell<u32>>,
}

impl RhaiScriptRunner {
    pub fn new(state: SharedGameState, random_seed: Option<u32>) -> Self {
        let rng_state = Rc::new(RefCell::new(random_seed.unwrap_or(1)));
        let mut engine = Engine::new();
        engine.set_strict_variables(true);
        engine.set_max_operations(MAX_SCRIPT_OPERATIONS);

        let handle = state.clone();
        engine.register_fn("get_flag", move |name: &str| -> bool { handle.flag(name) });
        let handle = state.clone();
        engine.register_fn("set_flag", move |name: &str, value: bool| {
            handle.borrow_mut().set_flag(name, value);
        });
        let handle = state.clone();
        engine.register_fn("get_var", move |name: &str| -> Dynamic {
            handle
                .variable(name)
                .map(|value| value_to_dynamic(&value))
                .unwrap_or(Dynamic::UNIT)
        });
        let handle = state.clone();
        engine.register_fn(
            "set_var",
            move |name: &str, value: Dynamic| -> Result<(), Box<EvalAltResult>> {
                let converted = dynamic_to_value(value).ok_or_else(|| {
                    runtime_error(format!("set_var(\"{}\") expects bool, number or string.", name))
                })?;
                handle.borrow_mut().set_variable(name, converted);
                Ok(())
            },
        );
        let handle = state.clone();
        engine.register_fn("item_count", move |name: &str| -> INT { handle.item_count(name) });
        let handle = state.clone();
        engine.register_fn("give_item", move |name: &str, count: INT| {
            handle.borrow_mut().give_item(name, count);
        });
        let handle = state;
        engine.register_fn("quest_stage", move |name: &str| -> INT { handle.quest_stage(name) });

        let rng_for_builtin = Rc::clone(&rng_state);
        engine.register_fn(
            "random",
            move |bound: INT| -> Result<INT, Box<EvalAltResult>> {
                if bound <= 0 || bound > INT::from(u32::MAX) {
                    return Err(runtime_error("random(n) expects a positive integer n.".to_string()));
                }
                let mut state = rng_for_builtin.borrow_mut();
                Ok(INT::from(next_random_bounded(&mut state, bound as u32)))
            },
        );

        Self {
            engine,
            scripts: BTreeMap::new(),
            rng_state,
        }
    }

    pub fn register(&mut self, name: &str, source: &str) -> Result<(), DialogueError> {
        // Strict variables resolve against the context names at compile time.
        let template = context_scope(&ScriptContext::default(), None);
        let ast = self.engine.compile_with_scope(&template, source).map_err(|error| {
            DialogueError::script(
                "SCRIPT_COMPILE_ERROR",
                format!("Script \"{}\" failed to compile: {}", name, error),
            )
        })?;
        self.scripts.insert(name.to_string(), ast);
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scripts.keys().map(String::as_str)
    }

    pub fn rng_state(&self) -> u32 {
        *self.rng_state.borrow()
    }

    fn run(
        &mut self,
        name: &str,
        context: &ScriptContext,
        arg: Option<&DlgValue>,
    ) -> Result<Option<DlgValue>, DialogueError> {
        let ast = self.scripts.get(name).ok_or_else(|| {
            DialogueError::script(
                "SCRIPT_NOT_FOUND",
                format!("Script \"{}\" is not registered.", name),
            )
        })?;

        let mut scope = context_scope(context, arg);
        let result = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, ast)
            .map_err(|error| {
                DialogueError::script(
                    "SCRIPT_EVAL_ERROR",
                    format!("Script \"{}\" failed: {}", name, error),
                )
            })?;
        Ok(dynamic_to_value(result))
    }
}

impl ScriptRunner for RhaiScriptRunner {
    fn call(
        &mut self,
        name: &str,
        context: &ScriptContext,
        arg: Option<&DlgValue>,
    ) -> Result<DlgValue, DialogueError> {
        Ok(self.run(name, context, arg)?.unwrap_or(DlgValue::Bool(true)))
    }

    fn evaluate(
        &mut self,
        name: &str,
        context: &ScriptContext,
        arg: Option<&DlgValue>,
    ) -> Result<bool, DialogueError> {
        match self.run(name, context, arg)? {
            Some(value) => Ok(value.is_truthy()),
            None => Err(DialogueError::script(
                "SCRIPT_RESULT_INVALID",
                format!("Script \"{}\" must return a value when used as a condition.", name),
            )),
        }
    }
}

fn context_scope(context: &ScriptContext, arg: Option<&DlgValue>) -> Scope<'static> {
    let mut scope = Scope::new();
    scope.push_dynamic("scene", Dynamic::from(context.scene.clone()));
    scope.push_dynamic("frame", Dynamic::from(context.frame.clone()));
    scope.push_dynamic(
        "hook",
        Dynamic::from(context.hook.map(|hook| hook.name()).unwrap_or("").to_string()),
    );
    scope.push_dynamic(
        "choice",
        Dynamic::from(context.choice.map(|index| index as INT).unwrap_or(-1)),
    );
    scope.push_dynamic("arg", arg.map(value_to_dynamic).unwrap_or(Dynamic::UNIT));
    scope
}

fn runtime_error(message: String) -> Box<EvalAltResult> {
    Box::new(EvalAltResult::ErrorRuntime(Dynamic::from(message), Position::NONE))
}

fn value_to_dynamic(value: &DlgValue) -> Dynamic {
    match value {
        DlgValue::Bool(value) => Dynamic::from_bool(*value),
        DlgValue::Number(value) => {
            if value.fract() == 0.0 && value.abs() < 9.0e15 {
                Dynamic::from_int(*value as INT)
            } else {
                Dynamic::from_float(*value as FLOAT)
            }
        }
        DlgValue::String(value) => Dynamic::from(value.clone()),
    }
}

fn dynamic_to_value(value: Dynamic) -> Option<DlgValue> {
    if value.is::<bool>() {
        return Some(DlgValue::Bool(value.cast::<bool>()));
    }
    if value.is::<INT>() {
        return Some(DlgValue::Number(value.cast::<INT>() as f64));
    }
    if value.is::<FLOAT>() {
        return Some(DlgValue::Number(value.cast::<FLOAT>()));
    }
    if value.is::<ImmutableString>() {
        return Some(DlgValue::String(value.cast::<ImmutableString>().to_string()));
    }
    None
}
