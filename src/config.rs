//! Script configuration for the demo binary

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

/// One scripted interaction with the form, addressed by dot path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Update { path: String, value: Value },
    Reset { path: String, value: Value },
    Enable { path: String },
    Disable { path: String },
    /// Without a path the whole form is marked pristine
    MarkAsPristine {
        #[serde(default)]
        path: Option<String>,
    },
}

impl Step {
    /// Short label printed next to each snapshot
    pub fn label(&self) -> String {
        match self {
            Step::Update { path, value } => format!("update {path} = {value}"),
            Step::Reset { path, value } => format!("reset {path} = {value}"),
            Step::Enable { path } => format!("enable {path}"),
            Step::Disable { path } => format!("disable {path}"),
            Step::MarkAsPristine { path: Some(path) } => format!("mark_as_pristine {path}"),
            Step::MarkAsPristine { path: None } => "mark_as_pristine".to_string(),
        }
    }
}

/// Sequence of steps replayed against the sign-up form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoScript {
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Default for DemoScript {
    fn default() -> Self {
        Self {
            steps: vec![
                Step::Update {
                    path: "name".to_string(),
                    value: json!("edvard"),
                },
                Step::Update {
                    path: "age".to_string(),
                    value: json!(30),
                },
                Step::Update {
                    path: "phones.0".to_string(),
                    value: json!("555-0100"),
                },
                Step::Update {
                    path: "name".to_string(),
                    value: json!("edvard chen"),
                },
                Step::Disable {
                    path: "phones".to_string(),
                },
                Step::MarkAsPristine { path: None },
            ],
        }
    }
}

impl DemoScript {
    /// Load a script from a JSON file, or the built-in script without a path
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        let script: DemoScript = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse script {}", path.display()))?;
        Ok(script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_script_is_not_empty() {
        let script = DemoScript::default();
        assert_eq!(script.steps.len(), 6);
        assert_eq!(script.steps[5], Step::MarkAsPristine { path: None });
    }

    #[test]
    fn test_deserialize_tagged_steps() {
        let json = r#"{"steps": [
            {"op": "update", "path": "name", "value": "Tom"},
            {"op": "disable", "path": "phones"},
            {"op": "mark_as_pristine"}
        ]}"#;
        let parsed: DemoScript = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.steps,
            vec![
                Step::Update {
                    path: "name".to_string(),
                    value: json!("Tom"),
                },
                Step::Disable {
                    path: "phones".to_string(),
                },
                Step::MarkAsPristine { path: None },
            ]
        );
    }

    #[test]
    fn test_deserialize_from_empty_json() {
        let parsed: DemoScript = serde_json::from_str("{}").unwrap();
        assert!(parsed.steps.is_empty());
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        let json = r#"{"steps": [{"op": "explode", "path": "name"}]}"#;
        assert!(serde_json::from_str::<DemoScript>(json).is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let script = DemoScript::default();
        let json = serde_json::to_string(&script).unwrap();
        let parsed: DemoScript = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, script);
    }

    #[test]
    fn test_load_without_path_returns_default() {
        let script = DemoScript::load(None).unwrap();
        assert_eq!(script, DemoScript::default());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = DemoScript::load(Some(Path::new("/nonexistent/formtree/script.json")));
        assert!(result.is_err());
    }

    #[test]
    fn test_step_labels() {
        let step = Step::Update {
            path: "age".to_string(),
            value: json!(30),
        };
        assert_eq!(step.label(), "update age = 30");
        assert_eq!(
            Step::MarkAsPristine {
                path: Some("phones".to_string())
            }
            .label(),
            "mark_as_pristine phones"
        );
    }
}
