//! Change notification for form controllers

use serde::Serialize;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::validation::Errors;

/// Point-in-time view of a controller's observable state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub value: Value,
    pub dirty: bool,
    pub valid: bool,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Errors>,
}

/// Callback invoked after a controller (or one of its descendants) changes
pub type Listener = Box<dyn Fn(&Snapshot)>;

/// Handle returned by `subscribe`, used to unsubscribe later.
///
/// Ids are unique across every controller on the thread, so an id from one
/// node never matches a listener on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

thread_local! {
    static NEXT_SUBSCRIPTION: Cell<u64> = Cell::new(0);
}

impl SubscriptionId {
    fn next() -> Self {
        NEXT_SUBSCRIPTION.with(|next| {
            let id = next.get();
            next.set(id + 1);
            Self(id)
        })
    }
}

/// Listener registry owned by a single controller
#[derive(Default)]
pub(crate) struct Listeners {
    entries: RefCell<Vec<(SubscriptionId, Rc<dyn Fn(&Snapshot)>)>>,
}

impl Listeners {
    pub(crate) fn subscribe(&self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.entries.borrow_mut().push((id, Rc::from(listener)));
        id
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        entries.len() != before
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Call every listener with a snapshot built on demand.
    ///
    /// The registry is not borrowed while listeners run, so a listener may
    /// subscribe or unsubscribe without panicking.
    pub(crate) fn emit(&self, snapshot: impl FnOnce() -> Snapshot) {
        let current: Vec<_> = self
            .entries
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        if current.is_empty() {
            return;
        }
        let snapshot = snapshot();
        for listener in current {
            listener(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> Snapshot {
        Snapshot {
            value: json!("abc"),
            dirty: true,
            valid: true,
            enabled: true,
            errors: None,
        }
    }

    #[test]
    fn test_emit_calls_every_listener() {
        let listeners = Listeners::default();
        let calls = Rc::new(Cell::new(0));
        for _ in 0..2 {
            let calls = Rc::clone(&calls);
            listeners.subscribe(Box::new(move |_: &Snapshot| calls.set(calls.get() + 1)));
        }

        listeners.emit(snapshot);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_emit_skips_snapshot_without_listeners() {
        let listeners = Listeners::default();
        listeners.emit(|| panic!("snapshot should not be built"));
    }

    #[test]
    fn test_unsubscribe_removes_only_that_listener() {
        let listeners = Listeners::default();
        let first = listeners.subscribe(Box::new(|_: &Snapshot| {}));
        let _second = listeners.subscribe(Box::new(|_: &Snapshot| {}));

        assert!(listeners.unsubscribe(first));
        assert!(!listeners.unsubscribe(first));
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let listeners = Listeners::default();
        let a = listeners.subscribe(Box::new(|_: &Snapshot| {}));
        let b = listeners.subscribe(Box::new(|_: &Snapshot| {}));
        assert_ne!(a, b);
    }

    #[test]
    fn test_ids_do_not_repeat_across_registries() {
        let a = Listeners::default();
        let b = Listeners::default();
        let from_a = a.subscribe(Box::new(|_: &Snapshot| {}));
        let from_b = b.subscribe(Box::new(|_: &Snapshot| {}));
        assert_ne!(from_a, from_b);
        assert!(!b.unsubscribe(from_a));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn test_snapshot_serialization_omits_absent_errors() {
        let json = serde_json::to_value(snapshot()).unwrap();
        assert_eq!(
            json,
            json!({"value": "abc", "dirty": true, "valid": true, "enabled": true})
        );
    }
}
