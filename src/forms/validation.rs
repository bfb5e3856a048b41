//! Validators and error maps
//!
//! A validator looks at the controller it is registered on and reports
//! zero or more named errors. Validators never inspect children's own
//! validators; composite validity is derived from children on read.

use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::controller::Controller;

/// Error kind -> arbitrary detail
pub type Errors = BTreeMap<String, Value>;

/// Validator over a subject controller of type `S`
pub type Validator<S> = Box<dyn Fn(&S) -> Option<Errors>>;

/// Box a closure as a [`Validator`]
pub fn validator<S, F>(f: F) -> Validator<S>
where
    S: ?Sized + 'static,
    F: Fn(&S) -> Option<Errors> + 'static,
{
    Box::new(f)
}

/// Build an error map with a single entry
pub fn error(kind: impl Into<String>, detail: impl Into<Value>) -> Errors {
    let mut errors = Errors::new();
    errors.insert(kind.into(), detail.into());
    errors
}

/// Run validators in registration order; later keys overwrite earlier ones.
pub(crate) fn collect_errors<S: ?Sized>(
    subject: &S,
    validators: &[Validator<S>],
) -> Option<Errors> {
    let mut merged = Errors::new();
    for validate in validators {
        if let Some(found) = validate(subject) {
            merged.extend(found);
        }
    }
    // An empty map is "no errors", not a failure: `valid` stays true even
    // when a validator returns `Some(Errors::new())`.
    if merged.is_empty() {
        None
    } else {
        Some(merged)
    }
}

/// Length used by the length validators: chars for strings, items for arrays
fn measured_len(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// Fails when the value is null, `""`, `[]` or `{}`
pub fn required<S>() -> Validator<S>
where
    S: Controller + ?Sized,
{
    validator(|subject: &S| {
        let empty = match subject.value() {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
            _ => false,
        };
        empty.then(|| error("required", true))
    })
}

pub fn min_length<S>(min: usize) -> Validator<S>
where
    S: Controller + ?Sized,
{
    validator(move |subject: &S| {
        let actual = measured_len(&subject.value())?;
        (actual < min).then(|| error("min_length", json!({"required": min, "actual": actual})))
    })
}

pub fn max_length<S>(max: usize) -> Validator<S>
where
    S: Controller + ?Sized,
{
    validator(move |subject: &S| {
        let actual = measured_len(&subject.value())?;
        (actual > max).then(|| error("max_length", json!({"required": max, "actual": actual})))
    })
}

/// Fails for numbers below `min`; non-numbers pass
pub fn min<S>(min: f64) -> Validator<S>
where
    S: Controller + ?Sized,
{
    validator(move |subject: &S| {
        let actual = subject.value().as_f64()?;
        (actual < min).then(|| error("min", json!({"min": min, "actual": actual})))
    })
}

/// Fails for numbers above `max`; non-numbers pass
pub fn max<S>(max: f64) -> Validator<S>
where
    S: Controller + ?Sized,
{
    validator(move |subject: &S| {
        let actual = subject.value().as_f64()?;
        (actual > max).then(|| error("max", json!({"max": max, "actual": actual})))
    })
}
