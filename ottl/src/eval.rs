// SPDX-License-Identifier: Apache-2.0

//! Bound (executable) expressions and their evaluation.

use std::collections::BTreeMap;
use std::fmt;

use crate::ast::{CompOp, IndexExpr, MathOp};
use crate::value::Value;
use crate::{helpers, ops, BoundFn, PathContext, Result};

/// A value expression with converters, enums, and paths resolved.
///
/// Factories receive their arguments in this form and may inspect literal
/// variants at bind time; everything else is evaluated through
/// [`Expr::eval`] on demand, which is what makes converter arguments lazy.
#[derive(Clone)]
pub enum Expr {
    Literal(Value),
    Path {
        path: String,
        indexes: Vec<IndexExpr>,
    },
    List(Vec<Expr>),
    Map(Vec<(String, Expr)>),
    Call {
        name: String,
        func: BoundFn,
        indexes: Vec<IndexExpr>,
    },
    Negate(Box<Expr>),
    Binary {
        left: Box<Expr>,
        op: MathOp,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn eval(&self, ctx: &dyn PathContext) -> Result<Value> {
        match self {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Path { path, indexes } => ctx.resolve(path, indexes),
            Expr::List(items) => {
                let values: Result<Vec<Value>> = items.iter().map(|e| e.eval(ctx)).collect();
                Ok(Value::List(values?))
            }
            Expr::Map(entries) => {
                let mut map = BTreeMap::new();
                for (key, expr) in entries {
                    map.insert(key.clone(), expr.eval(ctx)?);
                }
                Ok(Value::Map(map))
            }
            Expr::Call { func, indexes, .. } => {
                let value = func.as_ref()(ctx)?;
                helpers::apply_indexes(value, indexes)
            }
            Expr::Negate(inner) => match inner.eval(ctx)? {
                Value::Int(i) => Ok(Value::Int(-i)),
                Value::Float(f) => Ok(Value::Float(-f)),
                other => Err(format!("cannot negate {:?}", other).into()),
            },
            Expr::Binary { left, op, right } => {
                ops::math_op(&left.eval(ctx)?, *op, &right.eval(ctx)?)
            }
        }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            Expr::Path { path, indexes } => f
                .debug_struct("Path")
                .field("path", path)
                .field("indexes", indexes)
                .finish(),
            Expr::List(items) => f.debug_tuple("List").field(items).finish(),
            Expr::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            Expr::Call { name, indexes, .. } => f
                .debug_struct("Call")
                .field("name", name)
                .field("indexes", indexes)
                .finish(),
            Expr::Negate(inner) => f.debug_tuple("Negate").field(inner).finish(),
            Expr::Binary { left, op, right } => f
                .debug_struct("Binary")
                .field("left", left)
                .field("op", op)
                .field("right", right)
                .finish(),
        }
    }
}

/// A bound boolean expression.
#[derive(Clone)]
pub(crate) enum Cond {
    Literal(bool),
    Comparison {
        left: Expr,
        op: CompOp,
        right: Expr,
    },
    Call {
        name: String,
        func: BoundFn,
        indexes: Vec<IndexExpr>,
    },
    Path {
        path: String,
        indexes: Vec<IndexExpr>,
    },
    Not(Box<Cond>),
    And(Box<Cond>, Box<Cond>),
    Or(Box<Cond>, Box<Cond>),
}

impl Cond {
    fn eval(&self, ctx: &dyn PathContext) -> Result<bool> {
        match self {
            Cond::Literal(b) => Ok(*b),
            Cond::Comparison { left, op, right } => {
                ops::compare(&left.eval(ctx)?, *op, &right.eval(ctx)?)
            }
            Cond::Call {
                name,
                func,
                indexes,
            } => match helpers::apply_indexes(func.as_ref()(ctx)?, indexes)? {
                Value::Bool(b) => Ok(b),
                other => {
                    Err(format!("converter {} returned {:?}, expected a boolean", name, other).into())
                }
            },
            Cond::Path { path, indexes } => match ctx.resolve(path, indexes)? {
                Value::Bool(b) => Ok(b),
                other => Err(format!("path {} resolved to {:?}, expected a boolean", path, other).into()),
            },
            Cond::Not(inner) => Ok(!inner.eval(ctx)?),
            Cond::And(left, right) => {
                if !left.eval(ctx)? {
                    return Ok(false);
                }
                right.eval(ctx)
            }
            Cond::Or(left, right) => {
                if left.eval(ctx)? {
                    return Ok(true);
                }
                right.eval(ctx)
            }
        }
    }
}

impl fmt::Debug for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cond::Literal(b) => f.debug_tuple("Literal").field(b).finish(),
            Cond::Comparison { left, op, right } => f
                .debug_struct("Comparison")
                .field("left", left)
                .field("op", op)
                .field("right", right)
                .finish(),
            Cond::Call { name, indexes, .. } => f
                .debug_struct("Call")
                .field("name", name)
                .field("indexes", indexes)
                .finish(),
            Cond::Path { path, indexes } => f
                .debug_struct("Path")
                .field("path", path)
                .field("indexes", indexes)
                .finish(),
            Cond::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
            Cond::And(left, right) => f.debug_tuple("And").field(left).field(right).finish(),
            Cond::Or(left, right) => f.debug_tuple("Or").field(left).field(right).finish(),
        }
    }
}

/// A compiled boolean condition.
#[derive(Debug)]
pub struct Condition(Cond);

impl Condition {
    pub(crate) fn new(cond: Cond) -> Self {
        Self(cond)
    }

    pub fn eval(&self, ctx: &dyn PathContext) -> Result<bool> {
        self.0.eval(ctx)
    }
}

/// A compiled value production.
#[derive(Debug)]
pub struct ValueExpression(Expr);

impl ValueExpression {
    pub(crate) fn new(expr: Expr) -> Self {
        Self(expr)
    }

    pub fn eval(&self, ctx: &dyn PathContext) -> Result<Value> {
        self.0.eval(ctx)
    }
}
