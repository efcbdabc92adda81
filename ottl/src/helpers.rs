// SPDX-License-Identifier: Apache-2.0

//! Helper utilities for integrators implementing [`crate::PathContext`].

use crate::ast::IndexExpr;
use crate::value::Value;
use crate::{BoxError, Result};

/// Applies a sequence of index expressions to a value.
///
/// Supports indexing into [`Value::List`] with [`IndexExpr::Int`], into
/// [`Value::Map`] with [`IndexExpr::String`], and into [`Value::String`]
/// with a character index. Any other combination is an error, as is an
/// out-of-bounds index or a missing map key.
pub fn apply_indexes(value: Value, indexes: &[IndexExpr]) -> Result<Value> {
    let mut current = value;
    for index in indexes {
        current = match (&current, index) {
            (Value::List(list), IndexExpr::Int(i)) => list
                .get(*i)
                .cloned()
                .ok_or_else(|| -> BoxError { format!("index {} out of bounds", i).into() })?,
            (Value::Map(map), IndexExpr::String(key)) => map
                .get(key)
                .cloned()
                .ok_or_else(|| -> BoxError { format!("key {:?} not found", key).into() })?,
            (Value::String(s), IndexExpr::Int(i)) => s
                .chars()
                .nth(*i)
                .map(|c| Value::string(c.to_string()))
                .ok_or_else(|| -> BoxError { format!("index {} out of bounds", i).into() })?,
            _ => return Err(format!("cannot index {:?} with {:?}", current, index).into()),
        };
    }
    Ok(current)
}
