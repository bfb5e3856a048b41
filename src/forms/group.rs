//! Keyed collection of child controllers

use indexmap::IndexMap;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use super::array::Array;
use super::controller::{ensure_unowned, sealed::Node, Control, ControlKind, Controller, NodeCore};
use super::leaf::{Leaf, LeafValue};
use super::observe::{Listener, SubscriptionId};
use super::validation::{collect_errors, Errors, Validator};
use crate::error::{FormError, FormResult};

/// State of a keyed group. Reached through a [`Group`] handle.
///
/// Validators registered on a group see the whole node, so they can read
/// any child through [`GroupNode::get`] or [`GroupNode::ctrls`].
pub struct GroupNode {
    ctrls: IndexMap<String, Control>,
    core: NodeCore,
    validators: Vec<Validator<GroupNode>>,
}

impl GroupNode {
    /// Children in insertion order
    pub fn ctrls(&self) -> &IndexMap<String, Control> {
        &self.ctrls
    }

    pub fn get(&self, key: &str) -> Option<&Control> {
        self.ctrls.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.ctrls.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ctrls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ctrls.is_empty()
    }

    fn enabled_children(&self) -> impl Iterator<Item = &Control> {
        self.ctrls.values().filter(|ctrl| ctrl.enabled())
    }

    fn emit(&self) {
        self.core.listeners().emit(|| self.snapshot());
    }
}

impl Controller for GroupNode {
    fn kind(&self) -> ControlKind {
        ControlKind::Group
    }

    fn value(&self) -> Value {
        Value::Object(
            self.ctrls
                .iter()
                .map(|(key, ctrl)| (key.clone(), ctrl.value()))
                .collect(),
        )
    }

    fn errors(&self) -> Option<Errors> {
        self.core.errors()
    }

    fn dirty(&self) -> bool {
        self.enabled_children().any(|ctrl| ctrl.dirty())
    }

    fn valid(&self) -> bool {
        !self.core.has_errors() && self.enabled_children().all(|ctrl| ctrl.valid())
    }

    fn enabled(&self) -> bool {
        self.core.enabled()
    }

    fn enable(&self) {
        if self.core.set_enabled(ControlKind::Group, true) {
            self.notify();
        }
    }

    fn disable(&self) {
        if self.core.set_enabled(ControlKind::Group, false) {
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
        self.core.store_errors(ControlKind::Group, errors);
        self.core.revalidate_parent();
    }

    fn subscribe(&self, listener: Listener) -> SubscriptionId {
        self.core.listeners().subscribe(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.core.listeners().unsubscribe(id)
    }
}

impl Node for GroupNode {
    fn set_parent(&self, parent: Weak<dyn Controller>) {
        self.core.set_parent(parent);
    }

    fn notify(&self) {
        self.emit();
        self.core.notify_parent();
    }

    fn apply_pristine(&self, pristine: bool) {
        for ctrl in self.ctrls.values() {
            ctrl.apply_pristine(pristine);
        }
        self.emit();
    }

    fn child(&self, segment: &str) -> Option<Control> {
        self.ctrls.get(segment).cloned()
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

impl fmt::Debug for GroupNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupNode")
            .field("ctrls", &self.ctrls)
            .field("enabled", &self.core.enabled())
            .field("errors", &self.core.errors())
            .finish()
    }
}

/// Handle to a keyed group. Clones share the same group.
#[derive(Clone)]
pub struct Group(Rc<GroupNode>);

impl Group {
    pub fn new<K: Into<String>>(
        children: impl IntoIterator<Item = (K, Control)>,
    ) -> FormResult<Self> {
        Self::with_validators(children, Vec::new())
    }

    /// Claim every child, then run the group's validators once.
    ///
    /// Fails on a repeated key, a key containing `.` (it could never be
    /// reached by [`Control::find`]) or a child that already has a parent.
    pub fn with_validators<K: Into<String>>(
        children: impl IntoIterator<Item = (K, Control)>,
        validators: Vec<Validator<GroupNode>>,
    ) -> FormResult<Self> {
        let mut ctrls = IndexMap::new();
        for (key, ctrl) in children {
            let key = key.into();
            if key.contains('.') {
                tracing::warn!(key = %key, "group key contains a path separator");
                return Err(FormError::InvalidKey { key });
            }
            if ctrls.contains_key(&key) {
                tracing::warn!(key = %key, "duplicate key in group");
                return Err(FormError::DuplicateKey { key });
            }
            ctrls.insert(key, ctrl);
        }
        ensure_unowned(ctrls.iter().map(|(key, ctrl)| (key.clone(), ctrl)))?;

        let node = Rc::new(GroupNode {
            ctrls,
            core: NodeCore::new(),
            validators,
        });
        let parent = Rc::downgrade(&node) as Weak<dyn Controller>;
        for ctrl in node.ctrls.values() {
            ctrl.set_parent(parent.clone());
        }
        node.run_validators();
        Ok(Self(node))
    }

    pub(crate) fn from_node(node: Rc<GroupNode>) -> Self {
        Self(node)
    }

    pub fn to_control(&self) -> Control {
        Control(self.0.clone())
    }

    /// See [`Control::find`]
    pub fn find(&self, path: &str) -> FormResult<Control> {
        self.to_control().find(path)
    }

    pub fn leaf<T: LeafValue>(&self, path: &str) -> FormResult<Leaf<T>> {
        self.to_control().leaf(path)
    }

    pub fn group(&self, path: &str) -> FormResult<Group> {
        self.to_control().group(path)
    }

    pub fn array(&self, path: &str) -> FormResult<Array> {
        self.to_control().array(path)
    }
}

impl Deref for Group {
    type Target = GroupNode;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl From<Group> for Control {
    fn from(group: Group) -> Self {
        Control(group.0)
    }
}
