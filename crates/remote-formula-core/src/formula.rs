//! Formula catalog and command payload types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Context, ExecutionId};

/// Tag prefix of inputs that reference a stored credential.
pub const CREDENTIAL_PREFIX: &str = "CREDENTIAL_";

/// Kind tag of a formula input.
///
/// Serialized as the wire tags `text`, `bool` and `password`. Tags starting
/// with `CREDENTIAL_` name a stored credential. Tags this client does not know
/// are preserved verbatim so they round-trip to the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InputKind {
    /// Free text, or a selection when choices are declared.
    Text,
    /// Yes/no; the value is `"true"` or `"false"`.
    Boolean,
    /// Hidden entry; still sent in plaintext.
    Password,
    /// Reference to a credential saved beforehand, e.g. `CREDENTIAL_GITHUB`.
    /// Never prompted for; the server resolves it.
    Credential(String),
    /// Unrecognized tag.
    Other(String),
}

impl InputKind {
    /// Wire tag for this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Boolean => "bool",
            Self::Password => "password",
            Self::Credential(tag) | Self::Other(tag) => tag,
        }
    }
}

impl From<String> for InputKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "text" => Self::Text,
            "bool" | "boolean" => Self::Boolean,
            "password" => Self::Password,
            _ if tag.starts_with(CREDENTIAL_PREFIX) => Self::Credential(tag),
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for InputKind {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<InputKind> for String {
    fn from(kind: InputKind) -> Self {
        match kind {
            InputKind::Credential(tag) | InputKind::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared input of a formula.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputSpec {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub kind: InputKind,
    /// Enumerated choices, if the input is a selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl InputSpec {
    /// Default value, treating an empty string as absent.
    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref().filter(|d| !d.is_empty())
    }

    /// Declared choices, treating an empty list as absent.
    #[must_use]
    pub fn choices(&self) -> Option<&[String]> {
        self.items.as_deref().filter(|items| !items.is_empty())
    }
}

/// Remotely cataloged, parameterized command template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormulaDescriptor {
    pub command: String,
    #[serde(default)]
    pub inputs: Vec<InputSpec>,
}

/// Catalog returned by `GET /formulas`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormulaCatalog {
    #[serde(default)]
    pub contexts: Vec<Context>,
    #[serde(default)]
    pub formulas: Vec<FormulaDescriptor>,
}

impl FormulaCatalog {
    /// Context names in server order.
    #[must_use]
    pub fn context_names(&self) -> Vec<String> {
        self.contexts.iter().map(|c| c.name.clone()).collect()
    }

    /// Formula commands in server order.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.formulas.iter().map(|f| f.command.clone()).collect()
    }

    /// Find a formula by its command.
    #[must_use]
    pub fn formula(&self, command: &str) -> Option<&FormulaDescriptor> {
        self.formulas.iter().find(|f| f.command == command)
    }
}

/// Collected value for one input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputValue {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: InputKind,
    /// Absent for credential references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl InputValue {
    /// Create an input value.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: impl Into<InputKind>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            value: Some(value.into()),
        }
    }
}

/// Command payload posted to `/commands`.
///
/// The id is generated client-side before the network call and is the join
/// key for every later status poll.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmittedCommand {
    pub id: ExecutionId,
    pub command: String,
    pub inputs: Vec<InputValue>,
}

impl SubmittedCommand {
    /// Build a command for `formula` with a freshly generated id.
    #[must_use]
    pub fn new(formula: &FormulaDescriptor, inputs: Vec<InputValue>) -> Self {
        Self {
            id: ExecutionId::generate(),
            command: formula.command.clone(),
            inputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_kind_tags() {
        assert_eq!(InputKind::from("text"), InputKind::Text);
        assert_eq!(InputKind::from("bool"), InputKind::Boolean);
        assert_eq!(InputKind::from("boolean"), InputKind::Boolean);
        assert_eq!(InputKind::from("password"), InputKind::Password);
        assert_eq!(InputKind::Boolean.as_str(), "bool");
        assert_eq!(
            InputKind::from("CREDENTIAL_GITHUB"),
            InputKind::Credential("CREDENTIAL_GITHUB".into())
        );
    }

    #[test]
    fn test_credential_reference_has_no_value() {
        let decoded: InputValue =
            serde_json::from_str(r#"{"name":"gh","type":"CREDENTIAL_GITHUB"}"#).unwrap();
        assert_eq!(decoded.kind, InputKind::Credential("CREDENTIAL_GITHUB".into()));
        assert!(decoded.value.is_none());

        let json = serde_json::to_value(&decoded).unwrap();
        assert_eq!(json, serde_json::json!({"name": "gh", "type": "CREDENTIAL_GITHUB"}));
    }

    #[test]
    fn test_unknown_kind_is_preserved() {
        let spec: InputSpec =
            serde_json::from_str(r#"{"name":"f","label":"File","type":"path"}"#).unwrap();
        assert_eq!(spec.kind, InputKind::Other("path".into()));

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["type"], "path");
        assert!(json.get("items").is_none());
    }

    #[test]
    fn test_catalog_decode() {
        let body = r#"{
            "contexts": [{"name": "dev"}, {"name": "prod"}],
            "formulas": [{
                "command": "deploy app",
                "inputs": [
                    {"name": "env", "label": "Env", "type": "text", "items": ["qa", "prod"]},
                    {"name": "verbose", "label": "Verbose", "type": "bool", "default": "false"}
                ]
            }]
        }"#;
        let catalog: FormulaCatalog = serde_json::from_str(body).unwrap();
        assert_eq!(catalog.context_names(), vec!["dev", "prod"]);
        assert_eq!(catalog.commands(), vec!["deploy app"]);

        let formula = catalog.formula("deploy app").unwrap();
        assert_eq!(formula.inputs[0].choices().map(<[String]>::len), Some(2));
        assert_eq!(formula.inputs[1].default_value(), Some("false"));
        assert!(catalog.formula("missing").is_none());
    }

    #[test]
    fn test_empty_default_is_absent() {
        let spec = InputSpec {
            name: "n".into(),
            label: "N".into(),
            kind: InputKind::Text,
            items: Some(vec![]),
            default: Some(String::new()),
        };
        assert!(spec.default_value().is_none());
        assert!(spec.choices().is_none());
    }

    #[test]
    fn test_submitted_command_ids_are_unique() {
        let formula = FormulaDescriptor {
            command: "echo".into(),
            inputs: vec![],
        };
        let a = SubmittedCommand::new(&formula, vec![]);
        let b = SubmittedCommand::new(&formula, vec![]);
        assert_ne!(a.id, b.id);
        assert_eq!(a.command, "echo");
    }
}
