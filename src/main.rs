//! formtree demo - replays a scripted session against a sign-up form
//!
//! Usage: `formtree-demo [script.json]`. Each step's resulting form
//! snapshot is printed to stdout as one JSON line.

mod config;

use anyhow::{bail, Result};
use config::{DemoScript, Step};
use formtree::{
    error, max, min, min_length, required, validator, Array, Controller, Group, GroupNode, Leaf,
    LeafValue, Snapshot,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formtree=info,formtree_demo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let script_path = std::env::args_os().nth(1).map(PathBuf::from);
    let script = DemoScript::load(script_path.as_deref())?;

    let form = sign_up_form()?;
    form.subscribe(Box::new(|snapshot: &Snapshot| {
        tracing::debug!(
            valid = snapshot.valid,
            dirty = snapshot.dirty,
            "form changed"
        );
    }));

    print_snapshot("initial", &form)?;
    for step in &script.steps {
        let label = step.label();
        tracing::info!("Applying {label}");
        apply(&form, step)?;
        print_snapshot(&label, &form)?;
    }

    Ok(())
}

/// Name, age, country and phone numbers, with a cross-field rule that
/// Chinese residents give both first and last name.
fn sign_up_form() -> Result<Group> {
    let phones = Array::new([Leaf::with_validators(String::new(), vec![required()]).into()])?;
    let form = Group::with_validators(
        [
            (
                "name",
                Leaf::with_validators(String::new(), vec![required(), min_length(2)]).into(),
            ),
            (
                "age",
                Leaf::with_validators(0_i64, vec![min(18.0), max(120.0)]).into(),
            ),
            (
                "country",
                Leaf::with_validators("china".to_string(), vec![required()]).into(),
            ),
            ("phones", phones.into()),
        ],
        vec![validator(|form: &GroupNode| {
            let name = form.get("name")?.value();
            let country = form.get("country")?.value();
            let words = name.as_str()?.split_whitespace().count();
            (country == "china" && words < 2).then(|| error("first_and_second_name", true))
        })],
    )?;
    Ok(form)
}

fn apply(form: &Group, step: &Step) -> Result<()> {
    match step {
        Step::Update { path, value } => set_value(form, path, value.clone(), false),
        Step::Reset { path, value } => set_value(form, path, value.clone(), true),
        Step::Enable { path } => {
            form.find(path)?.enable();
            Ok(())
        }
        Step::Disable { path } => {
            form.find(path)?.disable();
            Ok(())
        }
        Step::MarkAsPristine { path: Some(path) } => {
            form.find(path)?.mark_as_pristine();
            Ok(())
        }
        Step::MarkAsPristine { path: None } => {
            form.mark_as_pristine();
            Ok(())
        }
    }
}

/// Write a JSON value into whichever typed leaf lives at `path`
fn set_value(form: &Group, path: &str, value: Value, reset: bool) -> Result<()> {
    let ctrl = form.find(path)?;
    if let Some(leaf) = ctrl.as_leaf::<String>() {
        write_leaf(&leaf, value, reset)
    } else if let Some(leaf) = ctrl.as_leaf::<i64>() {
        write_leaf(&leaf, value, reset)
    } else {
        bail!("{path} is not a leaf (found {})", ctrl.kind())
    }
}

fn write_leaf<T>(leaf: &Leaf<T>, value: Value, reset: bool) -> Result<()>
where
    T: LeafValue + DeserializeOwned,
{
    let value: T = serde_json::from_value(value)?;
    if reset {
        leaf.reset(value);
    } else {
        leaf.update(value);
    }
    Ok(())
}

fn print_snapshot(label: &str, form: &Group) -> Result<()> {
    let line = serde_json::to_string(&form.snapshot())?;
    println!("{label}: {line}");
    Ok(())
}
