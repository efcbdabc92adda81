// SPDX-License-Identifier: Apache-2.0

//! Dynamic values produced by expression evaluation.

use std::collections::BTreeMap;
use std::fmt::Display;

/// All values an expression can produce or consume.
///
/// Maps are ordered so the canonical textual form is stable across runs.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Nil/absent value
    #[default]
    Nil,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point
    Float(f64),
    /// String value
    String(String),
    /// Bytes literal (e.g. 0xC0FFEE) or bytes-typed attribute
    Bytes(Vec<u8>),
    /// List of values
    List(Vec<Value>),
    /// Map of string keys to values
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn bytes(b: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(b.into())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Nil => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::String(hex::encode(b)),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Canonical textual form: this is the single place value-to-string
/// conversion is defined, and downstream attribute contents depend on it
/// staying stable.
impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Nil => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(d) if d.is_finite() => write!(f, "{}", serde_json::json!(d)),
            Value::Float(d) => write!(f, "{}", d),
            Value::String(s) => f.write_str(s),
            Value::Bytes(b) => f.write_str(&hex::encode(b)),
            Value::List(_) | Value::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}
