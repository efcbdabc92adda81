// SPDX-License-Identifier: Apache-2.0

//! Standard converter library.
//!
//! Integrators extend the set through [`Parser::register_converter`]; the
//! factories here cover the general-purpose string and collection helpers.

use std::sync::Arc;

use regex::Regex;

use crate::value::Value;
use crate::{BoundFn, ConverterFactory, Expr, Parser, Result};

/// Registers the standard converters on a parser.
pub fn register_standard(parser: &mut Parser) {
    parser.register_converter(Arc::new(ConcatFactory));
    parser.register_converter(Arc::new(IsMatchFactory));
    parser.register_converter(Arc::new(LenFactory));
    parser.register_converter(Arc::new(ToUpperCaseFactory));
    parser.register_converter(Arc::new(ToLowerCaseFactory));
}

fn expect_args(name: &str, args: &[Expr], count: usize) -> Result<()> {
    if args.len() != count {
        return Err(format!("{} expects {} argument(s), got {}", name, count, args.len()).into());
    }
    Ok(())
}

/// `Concat(values, delimiter)` — stringifies each element of `values` with
/// the canonical form (nil becomes the empty string) and joins them.
pub struct ConcatFactory;

impl ConverterFactory for ConcatFactory {
    fn name(&self) -> &'static str {
        "Concat"
    }

    fn bind(&self, mut args: Vec<Expr>) -> Result<BoundFn> {
        expect_args("Concat", &args, 2)?;
        let delimiter = args.pop().expect("arity checked");
        let values = args.pop().expect("arity checked");

        Ok(Arc::new(move |ctx| {
            let delimiter = match delimiter.eval(ctx)? {
                Value::String(s) => s,
                other => return Err(format!("Concat delimiter is {:?}, expected a string", other).into()),
            };
            let items = match values.eval(ctx)? {
                Value::List(items) => items,
                other => return Err(format!("Concat values is {:?}, expected a list", other).into()),
            };
            let parts: Vec<String> = items.iter().map(Value::to_string).collect();
            Ok(Value::String(parts.join(&delimiter)))
        }))
    }
}

/// `IsMatch(target, pattern)` — regex match; the pattern must be a string
/// literal and is compiled once at parse time.
pub struct IsMatchFactory;

impl ConverterFactory for IsMatchFactory {
    fn name(&self) -> &'static str {
        "IsMatch"
    }

    fn bind(&self, mut args: Vec<Expr>) -> Result<BoundFn> {
        expect_args("IsMatch", &args, 2)?;
        let pattern = args.pop().expect("arity checked");
        let target = args.pop().expect("arity checked");

        let pattern = match pattern {
            Expr::Literal(Value::String(p)) => p,
            _ => return Err("IsMatch pattern must be a string literal".into()),
        };
        let regex = Regex::new(&pattern).map_err(|e| format!("invalid pattern: {}", e))?;

        Ok(Arc::new(move |ctx| {
            let value = target.eval(ctx)?;
            if value.is_nil() {
                return Err("IsMatch target is nil".into());
            }
            Ok(Value::Bool(regex.is_match(&value.to_string())))
        }))
    }
}

/// `Len(value)` — length of a string (bytes), list, map, or bytes value.
pub struct LenFactory;

impl ConverterFactory for LenFactory {
    fn name(&self) -> &'static str {
        "Len"
    }

    fn bind(&self, mut args: Vec<Expr>) -> Result<BoundFn> {
        expect_args("Len", &args, 1)?;
        let target = args.pop().expect("arity checked");

        Ok(Arc::new(move |ctx| {
            let len = match target.eval(ctx)? {
                Value::String(s) => s.len(),
                Value::Bytes(b) => b.len(),
                Value::List(items) => items.len(),
                Value::Map(entries) => entries.len(),
                other => return Err(format!("Len is not defined for {:?}", other).into()),
            };
            Ok(Value::Int(len as i64))
        }))
    }
}

/// `ToUpperCase(value)` — canonical string form, uppercased.
pub struct ToUpperCaseFactory;

impl ConverterFactory for ToUpperCaseFactory {
    fn name(&self) -> &'static str {
        "ToUpperCase"
    }

    fn bind(&self, mut args: Vec<Expr>) -> Result<BoundFn> {
        expect_args("ToUpperCase", &args, 1)?;
        let target = args.pop().expect("arity checked");

        Ok(Arc::new(move |ctx| {
            let value = target.eval(ctx)?;
            if value.is_nil() {
                return Err("ToUpperCase target is nil".into());
            }
            Ok(Value::String(value.to_string().to_uppercase()))
        }))
    }
}

/// `ToLowerCase(value)` — canonical string form, lowercased.
pub struct ToLowerCaseFactory;

impl ConverterFactory for ToLowerCaseFactory {
    fn name(&self) -> &'static str {
        "ToLowerCase"
    }

    fn bind(&self, mut args: Vec<Expr>) -> Result<BoundFn> {
        expect_args("ToLowerCase", &args, 1)?;
        let target = args.pop().expect("arity checked");

        Ok(Arc::new(move |ctx| {
            let value = target.eval(ctx)?;
            if value.is_nil() {
                return Err("ToLowerCase target is nil".into());
            }
            Ok(Value::String(value.to_string().to_lowercase()))
        }))
    }
}
