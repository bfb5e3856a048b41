//! Ordered collection of child controllers

use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use super::controller::{ensure_unowned, sealed::Node, Control, ControlKind, Controller, NodeCore};
use super::group::Group;
use super::leaf::{Leaf, LeafValue};
use super::observe::{Listener, SubscriptionId};
use super::validation::{collect_errors, Errors, Validator};
use crate::error::FormResult;

/// State of an ordered array. Reached through an [`Array`] handle.
pub struct ArrayNode {
    ctrls: Vec<Control>,
    core: NodeCore,
    validators: Vec<Validator<ArrayNode>>,
}

impl ArrayNode {
    pub fn ctrls(&self) -> &[Control] {
        &self.ctrls
    }

    pub fn at(&self, index: usize) -> Option<&Control> {
        self.ctrls.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Control> {
        self.ctrls.iter()
    }

    pub fn len(&self) -> usize {
        self.ctrls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ctrls.is_empty()
    }

    fn enabled_children(&self) -> impl Iterator<Item = &Control> {
        self.ctrls.iter().filter(|ctrl| ctrl.enabled())
    }

    fn emit(&self) {
        self.core.listeners().emit(|| self.snapshot());
    }
}

impl Controller for ArrayNode {
    fn kind(&self) -> ControlKind {
        ControlKind::Array
    }

    fn value(&self) -> Value {
        Value::Array(self.ctrls.iter().map(|ctrl| ctrl.value()).collect())
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
        if self.core.set_enabled(ControlKind::Array, true) {
            self.notify();
        }
    }

    fn disable(&self) {
        if self.core.set_enabled(ControlKind::Array, false) {
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
        self.core.store_errors(ControlKind::Array, errors);
        self.core.revalidate_parent();
    }

    fn subscribe(&self, listener: Listener) -> SubscriptionId {
        self.core.listeners().subscribe(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.core.listeners().unsubscribe(id)
    }
}

impl Node for ArrayNode {
    fn set_parent(&self, parent: Weak<dyn Controller>) {
        self.core.set_parent(parent);
    }

    fn notify(&self) {
        self.emit();
        self.core.notify_parent();
    }

    fn apply_pristine(&self, pristine: bool) {
        for ctrl in &self.ctrls {
            ctrl.apply_pristine(pristine);
        }
        self.emit();
    }

    fn child(&self, segment: &str) -> Option<Control> {
        let index: usize = segment.parse().ok()?;
        self.ctrls.get(index).cloned()
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

impl fmt::Debug for ArrayNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayNode")
            .field("ctrls", &self.ctrls)
            .field("enabled", &self.core.enabled())
            .field("errors", &self.core.errors())
            .finish()
    }
}

/// Handle to an ordered array. Clones share the same array.
#[derive(Clone)]
pub struct Array(Rc<ArrayNode>);

impl Array {
    pub fn new(children: impl IntoIterator<Item = Control>) -> FormResult<Self> {
        Self::with_validators(children, Vec::new())
    }

    /// Claim every child, then run the array's validators once.
    ///
    /// Fails when a child already has a parent or is listed twice.
    pub fn with_validators(
        children: impl IntoIterator<Item = Control>,
        validators: Vec<Validator<ArrayNode>>,
    ) -> FormResult<Self> {
        let ctrls: Vec<Control> = children.into_iter().collect();
        ensure_unowned(
            ctrls
                .iter()
                .enumerate()
                .map(|(index, ctrl)| (index.to_string(), ctrl)),
        )?;

        let node = Rc::new(ArrayNode {
            ctrls,
            core: NodeCore::new(),
            validators,
        });
        let parent = Rc::downgrade(&node) as Weak<dyn Controller>;
        for ctrl in &node.ctrls {
            ctrl.set_parent(parent.clone());
        }
        node.run_validators();
        Ok(Self(node))
    }

    pub(crate) fn from_node(node: Rc<ArrayNode>) -> Self {
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

impl Deref for Array {
    type Target = ArrayNode;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl From<Array> for Control {
    fn from(array: Array) -> Self {
        Control(array.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{error, max_length, required, validator, Snapshot};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::Cell;

    fn phones(values: &[&str]) -> (Array, Vec<Leaf<String>>) {
        let leaves: Vec<Leaf<String>> = values
            .iter()
            .map(|v| Leaf::with_validators(v.to_string(), vec![required()]))
            .collect();
        let array = Array::new(leaves.iter().map(Leaf::to_control)).unwrap();
        (array, leaves)
    }

    #[test]
    fn test_value_is_ordered() {
        let (array, _) = phones(&["1", "2", "3"]);
        assert_eq!(array.value(), json!(["1", "2", "3"]));
        assert_eq!(array.len(), 3);
    }

    #[test]
    fn test_update_touches_only_its_index() {
        let (array, leaves) = phones(&["1", "2", "3"]);
        leaves[1].update("two".to_string());
        assert_eq!(array.value(), json!(["1", "two", "3"]));
        assert_eq!(array.at(1).unwrap().value(), json!("two"));
    }

    #[test]
    fn test_dirty_iff_enabled_child_dirty() {
        let (array, leaves) = phones(&["1", "2"]);
        assert!(!array.dirty());

        leaves[0].update("x".to_string());
        assert!(array.dirty());

        leaves[0].disable();
        assert!(!array.dirty());

        leaves[0].enable();
        array.mark_as_pristine();
        assert!(!array.dirty());
        assert!(array.iter().all(|ctrl| !ctrl.dirty()));
    }

    #[test]
    fn test_valid_aggregates_enabled_children() {
        let (array, leaves) = phones(&["1", ""]);
        assert!(!array.valid());

        leaves[1].disable();
        assert!(array.valid());

        leaves[1].enable();
        leaves[1].update("2".to_string());
        assert!(array.valid());
    }

    #[test]
    fn test_cross_element_validator() {
        let unique = validator(|array: &ArrayNode| {
            let values = array.value();
            let items = values.as_array()?;
            let distinct = items
                .iter()
                .enumerate()
                .all(|(i, item)| !items[..i].contains(item));
            let count = array.ctrls().iter().filter(|c| c.enabled()).count();
            (!distinct && count > 1).then(|| error("duplicate", true))
        });
        let leaves = [Leaf::new("a".to_string()), Leaf::new("a".to_string())];
        let array =
            Array::with_validators(leaves.iter().map(Leaf::to_control), vec![unique]).unwrap();
        assert!(!array.valid());
        assert_eq!(array.errors(), Some(error("duplicate", true)));

        leaves[1].update("b".to_string());
        assert!(array.valid());
        assert!(array.errors().is_none());
    }

    #[test]
    fn test_built_in_validator_on_array_value() {
        let array = Array::with_validators(
            [Leaf::new(1).into(), Leaf::new(2).into(), Leaf::new(3).into()],
            vec![max_length(2)],
        )
        .unwrap();
        assert_eq!(
            array.errors(),
            Some(error("max_length", json!({"required": 2, "actual": 3})))
        );
    }

    #[test]
    fn test_array_inside_group_propagates() {
        let (array, leaves) = phones(&[""]);
        let form = Group::new([("phones", array.into())]).unwrap();
        assert!(!form.valid());

        leaves[0].update("555".to_string());
        assert!(form.valid());
        assert_eq!(form.value(), json!({"phones": ["555"]}));
        assert_eq!(form.leaf::<String>("phones.0").unwrap().get(), "555");
    }

    #[test]
    fn test_child_segment_must_be_index() {
        let (array, _) = phones(&["1"]);
        assert!(array.find("0").is_ok());
        assert!(array.find("first").is_err());
        assert!(array.find("-1").is_err());
    }

    #[test]
    fn test_disable_array_notifies_listeners() {
        let (array, _) = phones(&[""]);
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        array.subscribe(Box::new(move |snapshot: &Snapshot| {
            assert!(!snapshot.enabled);
            counter.set(counter.get() + 1);
        }));
        array.disable();
        array.disable();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_empty_array() {
        let array = Array::new(Vec::new()).unwrap();
        assert!(array.is_empty());
        assert!(array.valid());
        assert_eq!(array.value(), json!([]));
    }
}
