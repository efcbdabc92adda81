// SPDX-License-Identifier: Apache-2.0

//! Binding pass: resolves converters, enums, and paths against the parser's
//! registries, turning the raw AST into executable expressions. All "unknown
//! name" style failures happen here, at parse time.

use crate::ast;
use crate::ast::IndexExpr;
use crate::eval::{Cond, Expr};
use crate::value::Value;
use crate::{BoundFn, BoxError, Parser, Result};

pub(crate) fn bind_value(parser: &Parser, expr: ast::ValueExpr) -> Result<Expr> {
    match expr {
        ast::ValueExpr::Literal(value) => Ok(Expr::Literal(value)),
        ast::ValueExpr::Path(path) => {
            let (path, indexes) = bind_path(parser, path)?;
            Ok(Expr::Path { path, indexes })
        }
        ast::ValueExpr::EnumName(name) => match parser.enum_value(&name) {
            Some(value) => Ok(Expr::Literal(Value::Int(value))),
            None => Err(format!("unknown enum: {}", name).into()),
        },
        ast::ValueExpr::List(items) => {
            let items: Result<Vec<Expr>> =
                items.into_iter().map(|i| bind_value(parser, i)).collect();
            Ok(Expr::List(items?))
        }
        ast::ValueExpr::Map(entries) => {
            let entries: Result<Vec<(String, Expr)>> = entries
                .into_iter()
                .map(|(k, v)| Ok((k, bind_value(parser, v)?)))
                .collect();
            Ok(Expr::Map(entries?))
        }
        ast::ValueExpr::Call(call) => {
            let (name, func, indexes) = bind_call(parser, call)?;
            Ok(Expr::Call {
                name,
                func,
                indexes,
            })
        }
        ast::ValueExpr::Math(math) => bind_math(parser, *math),
    }
}

pub(crate) fn bind_bool(parser: &Parser, expr: ast::BoolExpr) -> Result<Cond> {
    match expr {
        ast::BoolExpr::Literal(value) => Ok(Cond::Literal(value)),
        ast::BoolExpr::Comparison { left, op, right } => Ok(Cond::Comparison {
            left: bind_value(parser, left)?,
            op,
            right: bind_value(parser, right)?,
        }),
        ast::BoolExpr::Converter(call) => {
            let (name, func, indexes) = bind_call(parser, call)?;
            Ok(Cond::Call {
                name,
                func,
                indexes,
            })
        }
        ast::BoolExpr::Path(path) => {
            let (path, indexes) = bind_path(parser, path)?;
            Ok(Cond::Path { path, indexes })
        }
        ast::BoolExpr::Not(inner) => Ok(Cond::Not(Box::new(bind_bool(parser, *inner)?))),
        ast::BoolExpr::And(left, right) => Ok(Cond::And(
            Box::new(bind_bool(parser, *left)?),
            Box::new(bind_bool(parser, *right)?),
        )),
        ast::BoolExpr::Or(left, right) => Ok(Cond::Or(
            Box::new(bind_bool(parser, *left)?),
            Box::new(bind_bool(parser, *right)?),
        )),
    }
}

fn bind_math(parser: &Parser, math: ast::MathExpr) -> Result<Expr> {
    match math {
        ast::MathExpr::Primary(value) => bind_value(parser, value),
        ast::MathExpr::Negate(inner) => Ok(Expr::Negate(Box::new(bind_math(parser, *inner)?))),
        ast::MathExpr::Binary { left, op, right } => Ok(Expr::Binary {
            left: Box::new(bind_math(parser, *left)?),
            op,
            right: Box::new(bind_math(parser, *right)?),
        }),
    }
}

fn bind_path(parser: &Parser, path: ast::PathExpr) -> Result<(String, Vec<IndexExpr>)> {
    let full_path = path.full_path();
    if !parser.has_path(&full_path) {
        return Err(format!("unknown path: {}", full_path).into());
    }
    Ok((full_path, path.indexes))
}

fn bind_call(
    parser: &Parser,
    call: ast::FunctionCall,
) -> Result<(String, BoundFn, Vec<IndexExpr>)> {
    let factory = match parser.converter(&call.name) {
        Some(factory) => factory.clone(),
        None => return Err(format!("unknown converter: {}", call.name).into()),
    };

    let args: Result<Vec<Expr>> = call
        .args
        .into_iter()
        .map(|a| bind_value(parser, a))
        .collect();

    let func = factory
        .bind(args?)
        .map_err(|e| -> BoxError { format!("{}: {}", call.name, e).into() })?;

    Ok((call.name, func, call.indexes))
}
