// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Application descriptors, the unit a supervisor launches

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::path::PathBuf;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::ValidationError;

/// A single environment value as declared in the ecosystem source
#[derive(Clone, Debug, PartialEq)]
pub enum EnvValue {
    String(String),
    Integer(i64),
    Float(f64),
    /// Anything that is not a scalar; never valid, kept so it can be reported
    Unsupported(Value),
}

impl EnvValue {
    /// Converts a parsed json value, preserving integer vs. float
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(s) => EnvValue::String(s),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    EnvValue::Integer(i)
                } else if n.is_f64() {
                    // is_f64 guarantees as_f64
                    n.as_f64()
                        .map(EnvValue::Float)
                        .unwrap_or(EnvValue::Unsupported(Value::Number(n)))
                } else {
                    // u64 beyond i64::MAX
                    EnvValue::Unsupported(Value::Number(n))
                }
            }
            other => EnvValue::Unsupported(other),
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, EnvValue::Unsupported(_))
    }

    /// Name of the value's type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            EnvValue::String(_) => "string",
            EnvValue::Integer(_) => "integer",
            EnvValue::Float(_) => "float",
            EnvValue::Unsupported(value) => json_type_name(value),
        }
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_u64() => "out of range integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Renders the value exactly as the child process will see it in its environment
impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::String(s) => f.write_str(s),
            EnvValue::Integer(i) => write!(f, "{}", i),
            EnvValue::Float(v) => write!(f, "{}", v),
            EnvValue::Unsupported(value) => write!(f, "{}", value),
        }
    }
}

impl Serialize for EnvValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EnvValue::String(s) => serializer.serialize_str(s),
            EnvValue::Integer(i) => serializer.serialize_i64(*i),
            EnvValue::Float(v) => serializer.serialize_f64(*v),
            EnvValue::Unsupported(value) => value.serialize(serializer),
        }
    }
}

impl From<&str> for EnvValue {
    fn from(s: &str) -> Self {
        EnvValue::String(s.to_string())
    }
}

impl From<String> for EnvValue {
    fn from(s: String) -> Self {
        EnvValue::String(s)
    }
}

impl From<i64> for EnvValue {
    fn from(i: i64) -> Self {
        EnvValue::Integer(i)
    }
}

impl From<f64> for EnvValue {
    fn from(v: f64) -> Self {
        EnvValue::Float(v)
    }
}

/// Environment for one app, keyed by variable name
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EnvMap(BTreeMap<String, EnvValue>);

impl EnvMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous value if the key was already set
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<EnvValue>) -> Option<EnvValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&EnvValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, EnvValue> {
        self.0.iter()
    }

    /// The `KEY=VALUE` pairs to inject into a child process
    pub fn to_env_vars(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a EnvMap {
    type Item = (&'a String, &'a EnvValue);
    type IntoIter = btree_map::Iter<'a, String, EnvValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<EnvValue>> std::iter::FromIterator<(K, V)> for EnvMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// How to launch one process
///
/// Built once from the ecosystem source and read-only afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AppDescriptor {
    pub name: String,
    pub script: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    pub env: EnvMap,
}

impl AppDescriptor {
    pub fn new(name: impl Into<String>, script: impl Into<PathBuf>, env: EnvMap) -> Self {
        Self {
            name: name.into(),
            script: script.into(),
            interpreter: None,
            args: Vec::new(),
            cwd: None,
            env,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate(self)
    }
}

/// Checks the descriptor's fields without touching the filesystem
///
/// Whether `script` exists and can be executed is decided at launch time.
pub fn validate(descriptor: &AppDescriptor) -> Result<(), ValidationError> {
    let app = descriptor.name.as_str();

    if app.trim().is_empty() {
        return Err(ValidationError::new(app, "name", "must not be empty"));
    }

    if descriptor.script.as_os_str().is_empty() {
        return Err(ValidationError::new(app, "script", "must not be empty"));
    }

    if let Some(ref interpreter) = descriptor.interpreter {
        if interpreter.trim().is_empty() {
            return Err(ValidationError::new(app, "interpreter", "must not be empty when set"));
        }
    }

    for (key, value) in &descriptor.env {
        if key.is_empty() {
            return Err(ValidationError::new(app, "env", "variable names must not be empty"));
        }

        if key.contains('=') || key.contains('\0') {
            return Err(ValidationError::new(
                app,
                format!("env.{}", key),
                "variable names must not contain '=' or NUL",
            ));
        }

        match value {
            EnvValue::Unsupported(_) => {
                return Err(ValidationError::new(
                    app,
                    format!("env.{}", key),
                    format!(
                        "expected a string, integer or float, found {}",
                        value.type_name()
                    ),
                ))
            }
            EnvValue::String(s) if s.contains('\0') => {
                return Err(ValidationError::new(
                    app,
                    format!("env.{}", key),
                    "value must not contain NUL",
                ))
            }
            _ => (),
        }
    }

    Ok(())
}
