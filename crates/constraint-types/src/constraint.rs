use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// Constraint parameter payload.
///
/// Keys are kept ordered so that equality, hashing into fingerprints and rendering are
/// deterministic. Values stay open-ended; their shape is checked against the template's
/// parameter schema.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Parameters(BTreeMap<String, JsonValue>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<K: Into<String>>(mut self, key: K, value: JsonValue) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn insert<K: Into<String>>(&mut self, key: K, value: JsonValue) -> Option<JsonValue> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        self.0.iter()
    }

    /// JSON object view, used for schema validation and by evaluators.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(self.0.clone().into_iter().collect())
    }
}

impl FromIterator<(String, JsonValue)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (String, JsonValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Store key of a constraint: `(kind, name)`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintKey {
    pub kind: String,
    pub name: String,
}

impl fmt::Display for ConstraintKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// A named, parameterized instantiation of a template's kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Constraint {
    pub kind: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    pub parameters: Parameters,
}

impl Constraint {
    pub fn new<K: Into<String>, N: Into<String>>(kind: K, name: N) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            parameters: Parameters::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn key(&self) -> ConstraintKey {
        ConstraintKey {
            kind: self.kind.clone(),
            name: self.name.clone(),
        }
    }
}
