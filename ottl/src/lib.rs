// SPDX-License-Identifier: Apache-2.0

//! Embedded transformation language for telemetry pipelines.
//!
//! Expressions come in two flavors: boolean *conditions* (rule predicates)
//! and *value productions* (expressions whose result becomes an attribute or
//! a name). Both are parsed once at startup and evaluated many times per
//! second against a read-only [`PathContext`] supplied by the integrator.
//!
//! Converters (`UpperCamelCase` functions) are bound at parse time through a
//! [`ConverterFactory`] registry, so unknown names, arity mistakes, and
//! malformed literal arguments all fail before any telemetry flows.
//!
//! ```ignore
//! let mut parser = Parser::with_standard_converters();
//! parser.register_path("attributes");
//!
//! let cond = parser.parse_condition(r#"attributes["http.method"] != nil"#)?;
//! let value = parser.parse_value(r#"Concat([attributes["http.method"], "/x"], " ")"#)?;
//!
//! if cond.eval(&ctx)? {
//!     let name = value.eval(&ctx)?.to_string();
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

mod ast;
mod bind;
pub mod converters;
mod eval;
mod grammar;
mod lexer;
mod ops;
mod value;

pub mod helpers;

pub use ast::{CompOp, IndexExpr, MathOp};
pub use eval::{Condition, Expr, ValueExpression};
pub use value::Value;

/// Standard error type for the library.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Standard result type for the library.
pub type Result<T> = std::result::Result<T, BoxError>;

/// Read-only access to the data an expression runs against.
///
/// `path` is the full dotted path as written in the expression (for example
/// `"resource.attributes"`); `indexes` are the trailing `["key"]` / `[0]`
/// accessors. Integrators resolve a missing map key to [`Value::Nil`] rather
/// than an error so that `!= nil` conditions behave as expected.
pub trait PathContext {
    fn resolve(&self, path: &str, indexes: &[IndexExpr]) -> Result<Value>;
}

/// A converter bound to its arguments, ready to evaluate.
pub type BoundFn = Arc<dyn Fn(&dyn PathContext) -> Result<Value> + Send + Sync>;

/// Factory for a named converter.
///
/// `bind` receives the already-compiled argument expressions and returns the
/// evaluation closure. Factories inspect literal arguments here (compiling a
/// regex, validating arity) so the work happens once at parse time.
pub trait ConverterFactory: Send + Sync {
    fn name(&self) -> &'static str;

    fn bind(&self, args: Vec<Expr>) -> Result<BoundFn>;
}

/// Expression parser with a converter registry, an enum table, and the set
/// of paths the integrator exposes.
pub struct Parser {
    converters: HashMap<&'static str, Arc<dyn ConverterFactory>>,
    enums: HashMap<String, i64>,
    paths: HashSet<String>,
}

impl Parser {
    /// An empty parser: no converters, no enums, no paths.
    pub fn new() -> Self {
        Self {
            converters: HashMap::new(),
            enums: HashMap::new(),
            paths: HashSet::new(),
        }
    }

    /// A parser preloaded with the standard converter library.
    pub fn with_standard_converters() -> Self {
        let mut parser = Self::new();
        converters::register_standard(&mut parser);
        parser
    }

    /// Registers a converter factory, replacing any previous factory with
    /// the same name.
    pub fn register_converter(&mut self, factory: Arc<dyn ConverterFactory>) {
        self.converters.insert(factory.name(), factory);
    }

    /// Registers an enum constant usable as a bare `UPPER_IDENT` literal.
    pub fn register_enum(&mut self, name: impl Into<String>, value: i64) {
        self.enums.insert(name.into(), value);
    }

    /// Declares a path root (for example `attributes`) as resolvable. Paths
    /// not declared here are parse-time errors.
    pub fn register_path(&mut self, path: impl Into<String>) {
        self.paths.insert(path.into());
    }

    /// Parses a boolean condition.
    pub fn parse_condition(&self, expression: &str) -> Result<Condition> {
        let tokens = lexer::tokenize(expression)?;
        let ast = run_parser(grammar::condition_entry(), &tokens)?;
        let cond = bind::bind_bool(self, ast)?;
        Ok(Condition::new(cond))
    }

    /// Parses a value production.
    pub fn parse_value(&self, expression: &str) -> Result<ValueExpression> {
        let tokens = lexer::tokenize(expression)?;
        let ast = run_parser(grammar::value_entry(), &tokens)?;
        let expr = bind::bind_value(self, ast)?;
        Ok(ValueExpression::new(expr))
    }

    pub(crate) fn converter(&self, name: &str) -> Option<&Arc<dyn ConverterFactory>> {
        self.converters.get(name)
    }

    pub(crate) fn enum_value(&self, name: &str) -> Option<i64> {
        self.enums.get(name).copied()
    }

    pub(crate) fn has_path(&self, path: &str) -> bool {
        self.paths.contains(path)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

fn run_parser<'a, O>(
    parser: impl chumsky::Parser<'a, &'a [lexer::Token<'a>], O, grammar::Extra<'a>>,
    tokens: &'a [lexer::Token<'a>],
) -> Result<O> {
    use chumsky::Parser as _;

    parser.parse(tokens).into_result().map_err(|errs| {
        let rendered: Vec<String> = errs.iter().map(|e| format!("{:?}", e)).collect();
        format!("parse error: {}", rendered.join("; ")).into()
    })
}
