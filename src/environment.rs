//! Persistent lexical environment
//!
//! An [`Environment`] is a chain of single-binding frames ending in the empty
//! chain. Extending allocates one new frame that points at the existing chain,
//! so the original environment is never changed and any number of closures and
//! call frames can share a tail. Cloning an environment is an `Rc` clone.
//!
//! The only mutation is [`Environment::modify`], which overwrites the slot of
//! an existing binding in place. `letrec` uses it to back-patch its bindings
//! after their initializers have been evaluated.
//!
//! Closures created inside `letrec` end up reachable from their own frame's
//! slot. That reference cycle is never collected; the interpreter accepts the
//! leak rather than carrying a cycle collector.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::ast::Value;

struct Frame {
    name: String,
    slot: RefCell<Value>,
    next: Environment,
}

#[derive(Clone, Default)]
pub struct Environment {
    head: Option<Rc<Frame>>,
}

impl Environment {
    /// The chain with zero bindings
    pub fn empty() -> Self {
        Environment { head: None }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Return a new chain with `name` bound to `value` in front of `self`
    #[must_use]
    pub fn extend(&self, name: impl Into<String>, value: Value) -> Environment {
        Environment {
            head: Some(Rc::new(Frame {
                name: name.into(),
                slot: RefCell::new(value),
                next: self.clone(),
            })),
        }
    }

    fn frames(&self) -> Frames<'_> {
        Frames {
            current: self.head.as_deref(),
        }
    }

    fn lookup_frame(&self, name: &str) -> Option<&Frame> {
        self.frames().find(|frame| frame.name == name)
    }

    /// Value of the nearest binding of `name`, or `None` if it is unbound
    pub fn find(&self, name: &str) -> Option<Value> {
        self.lookup_frame(name)
            .map(|frame| frame.slot.borrow().clone())
    }

    /// Whether `name` has a binding; never reads the slot
    pub fn is_bound(&self, name: &str) -> bool {
        self.lookup_frame(name).is_some()
    }

    /// Overwrite the slot of the nearest binding of `name`.
    ///
    /// Never creates a binding. Returns `false` when `name` is unbound, in
    /// which case nothing changes.
    pub fn modify(&self, name: &str, value: Value) -> bool {
        match self.lookup_frame(name) {
            Some(frame) => {
                *frame.slot.borrow_mut() = value;
                true
            }
            None => false,
        }
    }

    /// Visible bindings, nearest first, with shadowed names skipped
    pub fn bindings(&self) -> Vec<(String, Value)> {
        let mut seen = HashSet::new();
        self.frames()
            .filter(|frame| seen.insert(frame.name.as_str()))
            .map(|frame| (frame.name.clone(), frame.slot.borrow().clone()))
            .collect()
    }

    /// Whether both handles point at the same chain
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        match (&self.head, &other.head) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

struct Frames<'a> {
    current: Option<&'a Frame>,
}

impl<'a> Iterator for Frames<'a> {
    type Item = &'a Frame;

    fn next(&mut self) -> Option<&'a Frame> {
        let frame = self.current?;
        self.current = frame.next.head.as_deref();
        Some(frame)
    }
}

// Slots may hold closures that capture this very chain, so only names are printed.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.frames().map(|frame| frame.name.as_str()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let env = Environment::empty();
        assert!(env.is_empty());
        assert_eq!(env.find("x"), None);
        assert!(!env.is_bound("x"));
    }

    #[test]
    fn test_extend_is_non_destructive() {
        let base = Environment::empty().extend("x", Value::Integer(5));
        let inner = base.extend("x", Value::Integer(1));

        assert_eq!(inner.find("x"), Some(Value::Integer(1)));
        // the outer chain still sees its own binding
        assert_eq!(base.find("x"), Some(Value::Integer(5)));
        assert!(!base.ptr_eq(&inner));
    }

    #[test]
    fn test_lookup_walks_to_older_frames() {
        let env = Environment::empty()
            .extend("a", Value::Integer(1))
            .extend("b", Value::Boolean(true))
            .extend("c", Value::Void);
        assert_eq!(env.find("a"), Some(Value::Integer(1)));
        assert_eq!(env.find("b"), Some(Value::Boolean(true)));
        assert!(env.is_bound("c"));
        assert_eq!(env.find("d"), None);
    }

    #[test]
    fn test_modify_updates_nearest_slot_in_place() {
        let outer = Environment::empty().extend("f", Value::Integer(0));
        let inner = outer.extend("f", Value::Uninitialized);
        let shared = inner.clone();

        assert!(inner.modify("f", Value::Integer(42)));
        assert_eq!(shared.find("f"), Some(Value::Integer(42)));
        assert_eq!(outer.find("f"), Some(Value::Integer(0)));
    }

    #[test]
    fn test_modify_never_creates_bindings() {
        let env = Environment::empty().extend("x", Value::Integer(1));
        assert!(!env.modify("y", Value::Integer(2)));
        assert!(!env.is_bound("y"));
    }

    #[test]
    fn test_bindings_skip_shadowed_names() {
        let env = Environment::empty()
            .extend("x", Value::Integer(1))
            .extend("y", Value::Integer(2))
            .extend("x", Value::Integer(3));
        assert_eq!(
            env.bindings(),
            vec![
                ("x".to_owned(), Value::Integer(3)),
                ("y".to_owned(), Value::Integer(2)),
            ]
        );
    }

    #[test]
    fn test_debug_lists_names() {
        let env = Environment::empty()
            .extend("x", Value::Integer(1))
            .extend("y", Value::Integer(2));
        assert_eq!(format!("{env:?}"), r#"["y", "x"]"#);
    }
}
