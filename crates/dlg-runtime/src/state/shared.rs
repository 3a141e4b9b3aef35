use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use dlg_core::{DialogueError, DlgValue};

use crate::host::{CharacterStats, GameStateMutator, GameStateQuery};
use crate::state::memory::MemoryGameState;

/// Cloneable handle so the engine and the script runner see one state.
/// Every trait call borrows for its own duration only.
#[derive(Debug, Clone, Default)]
pub struct SharedGameState {
    inner: Rc<RefCell<MemoryGameState>>,
}

impl SharedGameState {
    pub fn new(state: MemoryGameState) -> Self {
        Self {
            inner: Rc::new(RefCell::new(state)),
        }
    }

    pub fn borrow(&self) -> Ref<'_, MemoryGameState> {
        self.inner.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, MemoryGameState> {
        self.inner.borrow_mut()
    }

    pub fn snapshot(&self) -> MemoryGameState {
        self.inner.borrow().clone()
    }
}

impl GameStateQuery for SharedGameState {
    fn flag(&self, name: &str) -> bool {
        self.inner.borrow().flag(name)
    }

    fn variable(&self, name: &str) -> Option<DlgValue> {
        self.inner.borrow().variable(name)
    }

    fn actor_value(&self, name: &str) -> Result<DlgValue, DialogueError> {
        self.inner.borrow().actor_value(name)
    }

    fn quest_stage(&self, name: &str) -> i64 {
        self.inner.borrow().quest_stage(name)
    }

    fn item_count(&self, name: &str) -> i64 {
        self.inner.borrow().item_count(name)
    }

    fn affinity(&self, name: &str) -> f64 {
        self.inner.borrow().affinity(name)
    }
}

impl GameStateMutator for SharedGameState {
    fn set_flag(&mut self, name: &str, value: bool) {
        self.inner.borrow_mut().set_flag(name, value);
    }

    fn set_variable(&mut self, name: &str, value: DlgValue) {
        self.inner.borrow_mut().set_variable(name, value);
    }

    fn set_actor_value(&mut self, name: &str, value: DlgValue) -> Result<(), DialogueError> {
        self.inner.borrow_mut().set_actor_value(name, value)
    }

    fn set_affinity(&mut self, name: &str, value: f64) {
        self.inner.borrow_mut().set_affinity(name, value);
    }

    fn give_item(&mut self, name: &str, count: i64) {
        self.inner.borrow_mut().give_item(name, count);
    }

    fn take_item(&mut self, name: &str, count: i64) -> bool {
        self.inner.borrow_mut().take_item(name, count)
    }

    fn set_quest_stage(&mut self, name: &str, stage: i64) -> bool {
        self.inner.borrow_mut().set_quest_stage(name, stage)
    }
}

impl CharacterStats for SharedGameState {
    fn stat(&self, name: &str) -> Option<f64> {
        self.inner.borrow().stat(name)
    }

    fn skill(&self, name: &str) -> Option<f64> {
        self.inner.borrow().skill(name)
    }

    fn actor_value_number(&self, name: &str) -> Option<f64> {
        self.inner.borrow().actor_value_number(name)
    }
}

#[cfg(test)]
mod shared_tests {
    use super::*;

    #[test]
    fn clones_observe_the_same_state() {
        let state = SharedGameState::default();
        let mut writer = state.clone();
        writer.set_flag("door_open", true);
        writer.give_item("key", 2);
        assert!(state.flag("door_open"));
        assert_eq!(state.item_count("key"), 2);
        assert_eq!(state.snapshot().items.get("key"), Some(&2));
    }
}
