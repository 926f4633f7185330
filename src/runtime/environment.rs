use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::Value;

pub type EnvRef = Rc<RefCell<Environment>>;

/// One scope of variables. Slots keep declaration order so resolved lookups can
/// index directly; `None` marks a variable declared without a value.
#[derive(Default)]
pub struct Environment {
    slots: Vec<Option<Value>>,
    names: FxHashMap<String, usize>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn global() -> EnvRef {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn nested(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Self {
            enclosing: Some(Rc::clone(enclosing)),
            ..Self::default()
        }))
    }

    /// Defines `name` and returns its slot. Redefining a name reuses its slot.
    pub fn define(&mut self, name: &str, value: Option<Value>) -> usize {
        if let Some(&slot) = self.names.get(name) {
            self.slots[slot] = value;
            return slot;
        }
        let slot = self.slots.len();
        self.slots.push(value);
        self.names.insert(name.to_string(), slot);
        slot
    }

    /// Looks `name` up in this scope only. `Some(None)` means declared but never assigned.
    pub fn get(&self, name: &str) -> Option<Option<Value>> {
        let slot = *self.names.get(name)?;
        self.slots.get(slot).cloned()
    }

    /// Assigns to an existing name in this scope; returns false if it is not declared here.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        match self.names.get(name) {
            Some(&slot) => {
                self.slots[slot] = Some(value);
                true
            }
            None => false,
        }
    }

    pub fn get_slot(&self, slot: usize) -> Option<Option<Value>> {
        self.slots.get(slot).cloned()
    }

    pub fn set_slot(&mut self, slot: usize, value: Value) -> bool {
        match self.slots.get_mut(slot) {
            Some(entry) => {
                *entry = Some(value);
                true
            }
            None => false,
        }
    }

    pub fn enclosing(&self) -> Option<EnvRef> {
        self.enclosing.clone()
    }

    /// Walks `distance` links up the chain.
    pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
        let mut current = Rc::clone(env);
        for _ in 0..distance {
            let next = current.borrow().enclosing()?;
            current = next;
        }
        Some(current)
    }

    pub fn get_at(env: &EnvRef, distance: usize, slot: usize) -> Option<Option<Value>> {
        Self::ancestor(env, distance)?.borrow().get_slot(slot)
    }

    pub fn assign_at(env: &EnvRef, distance: usize, slot: usize, value: Value) -> bool {
        Self::ancestor(env, distance).is_some_and(|target| target.borrow_mut().set_slot(slot, value))
    }
}

impl fmt::Debug for Environment {
    // Closures make environment graphs cyclic, so only this scope's names are shown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.names.iter().collect::<Vec<_>>();
        names.sort_by_key(|(_, slot)| **slot);
        f.debug_struct("Environment")
            .field("names", &names.into_iter().map(|(name, _)| name).collect::<Vec<_>>())
            .field("has_enclosing", &self.enclosing.is_some())
            .finish()
    }
}
