//! Single-value form field

use serde_json::Value;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use super::controller::{sealed::Node, Control, ControlKind, Controller, NodeCore};
use super::observe::{Listener, SubscriptionId};
use super::validation::{collect_errors, Errors, Validator};

/// Types a leaf can hold: anything clonable that converts to JSON
pub trait LeafValue: Clone + Into<Value> + 'static {}

impl<T: Clone + Into<Value> + 'static> LeafValue for T {}

/// State of a single field. Reached through a [`Leaf`] handle.
pub struct LeafNode<T> {
    value: RefCell<T>,
    pristine: Cell<bool>,
    core: NodeCore,
    validators: Vec<Validator<LeafNode<T>>>,
}

impl<T: LeafValue> LeafNode<T> {
    /// Typed copy of the current value
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Borrow the current value without cloning it
    pub fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.value.borrow())
    }

    pub fn pristine(&self) -> bool {
        self.pristine.get()
    }

    /// Record a user edit: set the value, mark dirty, re-validate upward
    pub fn update(&self, value: T) {
        *self.value.borrow_mut() = value;
        self.pristine.set(false);
        self.run_validators();
        self.notify();
    }

    /// Restore a clean baseline: set the value, mark pristine, re-validate upward
    pub fn reset(&self, value: T) {
        *self.value.borrow_mut() = value;
        self.pristine.set(true);
        self.run_validators();
        self.notify();
    }

    fn emit(&self) {
        self.core.listeners().emit(|| self.snapshot());
    }
}

impl<T: LeafValue> Controller for LeafNode<T> {
    fn kind(&self) -> ControlKind {
        ControlKind::Leaf
    }

    fn value(&self) -> Value {
        self.get().into()
    }

    fn errors(&self) -> Option<Errors> {
        self.core.errors()
    }

    fn dirty(&self) -> bool {
        !self.pristine.get()
    }

    fn valid(&self) -> bool {
        !self.core.has_errors()
    }

    fn enabled(&self) -> bool {
        self.core.enabled()
    }

    fn enable(&self) {
        if self.core.set_enabled(ControlKind::Leaf, true) {
            self.notify();
        }
    }

    fn disable(&self) {
        if self.core.set_enabled(ControlKind::Leaf, false) {
            self.notify();
        }
    }

    fn mark_as_dirty(&self) {
        self.apply_pristine(false);
        self.core.notify_parent();
    }

    fn mark_as_pristine(&self) {
        self.apply_pristine(true);
        self.core.notify_parent();
    }

    fn parent(&self) -> Option<Control> {
        self.core.parent()
    }

    fn run_validators(&self) {
        let errors = collect_errors(self, &self.validators);
        self.core.store_errors(ControlKind::Leaf, errors);
        self.core.revalidate_parent();
    }

    fn subscribe(&self, listener: Listener) -> SubscriptionId {
        self.core.listeners().subscribe(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.core.listeners().unsubscribe(id)
    }
}

impl<T: LeafValue> Node for LeafNode<T> {
    fn set_parent(&self, parent: Weak<dyn Controller>) {
        self.core.set_parent(parent);
    }

    fn notify(&self) {
        self.emit();
        self.core.notify_parent();
    }

    fn apply_pristine(&self, pristine: bool) {
        self.pristine.set(pristine);
        self.emit();
    }

    fn child(&self, _segment: &str) -> Option<Control> {
        None
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

impl<T: LeafValue + fmt::Debug> fmt::Debug for LeafNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafNode")
            .field("value", &*self.value.borrow())
            .field("pristine", &self.pristine.get())
            .field("enabled", &self.core.enabled())
            .field("errors", &self.core.errors())
            .finish()
    }
}

/// Handle to a single-value field. Clones share the same field.
pub struct Leaf<T>(Rc<LeafNode<T>>);

impl<T: LeafValue> Leaf<T> {
    pub fn new(initial: T) -> Self {
        Self::with_validators(initial, Vec::new())
    }

    /// Create a field; validators run once immediately
    pub fn with_validators(initial: T, validators: Vec<Validator<LeafNode<T>>>) -> Self {
        let node = Rc::new(LeafNode {
            value: RefCell::new(initial),
            pristine: Cell::new(true),
            core: NodeCore::new(),
            validators,
        });
        node.run_validators();
        Self(node)
    }

    pub(crate) fn from_node(node: Rc<LeafNode<T>>) -> Self {
        Self(node)
    }

    pub fn to_control(&self) -> Control {
        Control(self.0.clone())
    }
}

impl<T> Clone for Leaf<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> Deref for Leaf<T> {
    type Target = LeafNode<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: LeafValue + fmt::Debug> fmt::Debug for Leaf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl<T: LeafValue> From<Leaf<T>> for Control {
    fn from(leaf: Leaf<T>) -> Self {
        Control(leaf.0)
    }
}
