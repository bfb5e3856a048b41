//! The capability set shared by every node in a form tree

use serde_json::Value;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use super::array::{Array, ArrayNode};
use super::group::{Group, GroupNode};
use super::leaf::{Leaf, LeafNode, LeafValue};
use super::observe::{Listener, Listeners, Snapshot, SubscriptionId};
use super::validation::Errors;
use crate::error::{FormError, FormResult};
use sealed::Node;

/// Which variant a controller is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Leaf,
    Group,
    Array,
}

impl ControlKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ControlKind::Leaf => "leaf",
            ControlKind::Group => "group",
            ControlKind::Array => "array",
        }
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) mod sealed {
    use super::{Control, Controller};
    use std::any::Any;
    use std::rc::{Rc, Weak};

    /// Tree plumbing used while claiming, notifying and walking nodes.
    /// Not nameable outside this crate.
    pub trait Node {
        /// Called by group and array constructors when they claim a child
        fn set_parent(&self, parent: Weak<dyn Controller>);

        /// Emit to this node's listeners, then to every ancestor's
        fn notify(&self);

        /// Set the pristine flag on this node and all descendants, emitting
        /// to each of their listeners but not to ancestors
        fn apply_pristine(&self, pristine: bool);

        /// Direct child addressed by a key or index
        fn child(&self, segment: &str) -> Option<Control>;

        fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
    }
}

/// Common contract of leaf, group and array controllers.
///
/// All derived reads (`value`, `dirty`, `valid`) are computed from current
/// state on every call, so they always reflect the latest mutation. The
/// trait is sealed: only the controllers in this crate implement it, and
/// the tree plumbing behind it is out of reach.
///
/// ```compile_fail
/// use formtree::{Controller, Leaf};
///
/// let leaf = Leaf::new(1);
/// leaf.to_control().apply_pristine(true);
/// ```
pub trait Controller: Any + Node {
    fn kind(&self) -> ControlKind;

    /// Current value as JSON: leaf value, object for groups, array for arrays
    fn value(&self) -> Value;

    /// Errors reported by validators registered on this node only
    fn errors(&self) -> Option<Errors>;

    fn dirty(&self) -> bool;

    /// No own errors and every enabled child valid
    fn valid(&self) -> bool;

    fn enabled(&self) -> bool;
    fn enable(&self);
    fn disable(&self);

    fn mark_as_dirty(&self);
    fn mark_as_pristine(&self);

    /// The group or array this node belongs to, if it is still alive
    fn parent(&self) -> Option<Control>;

    /// Re-run this node's validators, then its ancestors'
    fn run_validators(&self);

    fn subscribe(&self, listener: Listener) -> SubscriptionId;
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            value: self.value(),
            dirty: self.dirty(),
            valid: self.valid(),
            enabled: self.enabled(),
            errors: self.errors(),
        }
    }
}

/// Type-erased handle to any controller
#[derive(Clone)]
pub struct Control(pub(crate) Rc<dyn Controller>);

impl Control {
    /// True when both handles point at the same node
    pub fn ptr_eq(&self, other: &Control) -> bool {
        self.addr() == other.addr()
    }

    fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn as_leaf<T: LeafValue>(&self) -> Option<Leaf<T>> {
        Rc::clone(&self.0)
            .into_any()
            .downcast::<LeafNode<T>>()
            .ok()
            .map(Leaf::from_node)
    }

    pub fn as_group(&self) -> Option<Group> {
        Rc::clone(&self.0)
            .into_any()
            .downcast::<GroupNode>()
            .ok()
            .map(Group::from_node)
    }

    pub fn as_array(&self) -> Option<Array> {
        Rc::clone(&self.0)
            .into_any()
            .downcast::<ArrayNode>()
            .ok()
            .map(Array::from_node)
    }

    /// Resolve a dot-separated path of group keys and array indices
    ///
    /// ```
    /// use formtree::{Array, Controller, Group, Leaf};
    /// use serde_json::json;
    ///
    /// fn main() -> formtree::FormResult<()> {
    ///     let first_step = Group::new([("birthday", Leaf::new("1988-01-01").into())])?;
    ///     let phones = Array::new([Leaf::new("123").into(), Leaf::new("456").into()])?;
    ///     let form = Group::new([("first_step", first_step.into()), ("phones", phones.into())])?;
    ///
    ///     let birthday = form.to_control().find("first_step.birthday")?;
    ///     assert_eq!(birthday.value(), json!("1988-01-01"));
    ///     let second = form.to_control().find("phones.1")?;
    ///     assert_eq!(second.value(), json!("456"));
    ///     assert!(form.to_control().find("phones.2").is_err());
    ///     Ok(())
    /// }
    /// ```
    pub fn find(&self, path: &str) -> FormResult<Control> {
        let mut current = self.clone();
        let mut walked = String::new();
        for segment in path.split('.') {
            if !walked.is_empty() {
                walked.push('.');
            }
            walked.push_str(segment);
            current = current.child(segment).ok_or_else(|| FormError::NotFound {
                path: walked.clone(),
            })?;
        }
        Ok(current)
    }

    pub fn leaf<T: LeafValue>(&self, path: &str) -> FormResult<Leaf<T>> {
        self.find(path)?.as_leaf().ok_or_else(|| FormError::TypeMismatch {
            path: path.to_string(),
            expected: "leaf of the requested type",
        })
    }

    pub fn group(&self, path: &str) -> FormResult<Group> {
        self.find(path)?.as_group().ok_or_else(|| FormError::TypeMismatch {
            path: path.to_string(),
            expected: "group",
        })
    }

    pub fn array(&self, path: &str) -> FormResult<Array> {
        self.find(path)?.as_array().ok_or_else(|| FormError::TypeMismatch {
            path: path.to_string(),
            expected: "array",
        })
    }
}

impl Deref for Control {
    type Target = dyn Controller;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Control")
            .field("kind", &self.kind())
            .field("value", &self.value())
            .field("enabled", &self.enabled())
            .finish()
    }
}

/// Reject children that already have a live parent or appear twice.
pub(crate) fn ensure_unowned<'a>(
    children: impl IntoIterator<Item = (String, &'a Control)>,
) -> FormResult<()> {
    let mut seen = HashSet::new();
    for (at, ctrl) in children {
        if ctrl.parent().is_some() || !seen.insert(ctrl.addr()) {
            tracing::warn!(at = %at, "refusing to claim a control that is already owned");
            return Err(FormError::AlreadyOwned { at });
        }
    }
    Ok(())
}

/// State every controller variant carries
pub(crate) struct NodeCore {
    enabled: Cell<bool>,
    errors: RefCell<Option<Errors>>,
    parent: RefCell<Option<Weak<dyn Controller>>>,
    listeners: Listeners,
}

impl NodeCore {
    pub(crate) fn new() -> Self {
        Self {
            enabled: Cell::new(true),
            errors: RefCell::new(None),
            parent: RefCell::new(None),
            listeners: Listeners::default(),
        }
    }

    pub(crate) fn enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Returns whether the flag actually changed
    pub(crate) fn set_enabled(&self, kind: ControlKind, enabled: bool) -> bool {
        if self.enabled.replace(enabled) == enabled {
            return false;
        }
        tracing::debug!(kind = %kind, enabled, "controller toggled");
        true
    }

    pub(crate) fn errors(&self) -> Option<Errors> {
        self.errors.borrow().clone()
    }

    pub(crate) fn has_errors(&self) -> bool {
        self.errors.borrow().is_some()
    }

    pub(crate) fn store_errors(&self, kind: ControlKind, errors: Option<Errors>) {
        let count = errors.as_ref().map_or(0, |e| e.len());
        tracing::trace!(kind = %kind, errors = count, "validation pass");
        let was_clean = self.errors.replace(errors).is_none();
        if was_clean != (count == 0) {
            tracing::debug!(kind = %kind, errors = count, "own validity changed");
        }
    }

    pub(crate) fn parent(&self) -> Option<Control> {
        self.parent
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Control)
    }

    pub(crate) fn set_parent(&self, parent: Weak<dyn Controller>) {
        *self.parent.borrow_mut() = Some(parent);
    }

    pub(crate) fn revalidate_parent(&self) {
        if let Some(parent) = self.parent() {
            parent.run_validators();
        }
    }

    pub(crate) fn notify_parent(&self) {
        if let Some(parent) = self.parent() {
            parent.notify();
        }
    }

    pub(crate) fn listeners(&self) -> &Listeners {
        &self.listeners
    }
}
