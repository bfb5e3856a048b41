//! Form tree: leaf fields, keyed groups and ordered arrays
//!
//! Parents own their children; children keep a weak link back to the
//! parent, used only to re-run the parent's validators and to forward
//! change notifications. Every derived read is recomputed on access.

mod array;
mod controller;
mod group;
mod leaf;
mod observe;
mod validation;

pub use array::{Array, ArrayNode};
pub use controller::{Control, ControlKind, Controller};
pub use group::{Group, GroupNode};
pub use leaf::{Leaf, LeafNode, LeafValue};
pub use observe::{Listener, Snapshot, SubscriptionId};
pub use validation::{
    error, max, max_length, min, min_length, required, validator, Errors, Validator,
};
