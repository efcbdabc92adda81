// SPDX-License-Identifier: Apache-2.0

//! Rule compilation: expressions are parsed once at startup, rules are
//! stable-sorted by priority, and every failure names the offending rule.

use opentelemetry_proto::tonic::trace::v1::span::SpanKind;
use ottl::{Condition, ValueExpression};

use super::config::{RuleConfig, SpanProcessingConfig};
use super::context::{parse_span_kind, register_span_context};
use super::error::{Error, Result};
use super::functions::register_semconv_converters;

#[derive(Debug)]
pub(crate) struct CompiledRule {
    pub id: String,
    pub priority: i32,
    pub span_kinds: Vec<SpanKind>,
    pub condition: Condition,
    pub operation_name: ValueExpression,
    pub operation_type: Option<ValueExpression>,
}

impl CompiledRule {
    /// An empty kind filter matches any kind. Spans of unspecified kind
    /// only ever match the empty filter.
    pub fn matches_kind(&self, kind: SpanKind) -> bool {
        if self.span_kinds.is_empty() {
            return true;
        }
        if kind == SpanKind::Unspecified {
            return false;
        }
        self.span_kinds.contains(&kind)
    }
}

/// A parser loaded with the standard converters, the domain converters,
/// and the span evaluation context.
pub(crate) fn span_parser() -> ottl::Parser {
    let mut parser = ottl::Parser::with_standard_converters();
    register_semconv_converters(&mut parser);
    register_span_context(&mut parser);
    parser
}

/// Compiles and sorts the configured rules. The config must have been
/// validated first so ids are unique and expressions are non-empty.
pub(crate) fn compile_rules(config: &SpanProcessingConfig) -> Result<Vec<CompiledRule>> {
    let parser = span_parser();

    let mut rules = Vec::with_capacity(config.rules.len());
    for rule in &config.rules {
        rules.push(compile_rule(&parser, rule)?);
    }

    // Stable sort: insertion order breaks priority ties.
    rules.sort_by_key(|r| r.priority);
    Ok(rules)
}

fn compile_rule(parser: &ottl::Parser, rule: &RuleConfig) -> Result<CompiledRule> {
    let rule_error = |message: String| Error::Rule {
        id: rule.id.clone(),
        message,
    };

    let mut span_kinds = Vec::with_capacity(rule.span_kind.len());
    for name in &rule.span_kind {
        match parse_span_kind(name) {
            Some(kind) => span_kinds.push(kind),
            None => return Err(rule_error(format!("unknown span kind {:?}", name))),
        }
    }

    let condition = parser
        .parse_condition(&rule.condition)
        .map_err(|e| rule_error(format!("invalid condition: {}", e)))?;

    let operation_name = parser
        .parse_value(&rule.operation_name)
        .map_err(|e| rule_error(format!("invalid operation_name: {}", e)))?;

    let operation_type = match rule.operation_type.as_deref() {
        Some(source) if !source.is_empty() => Some(
            parser
                .parse_value(source)
                .map_err(|e| rule_error(format!("invalid operation_type: {}", e)))?,
        ),
        _ => None,
    };

    Ok(CompiledRule {
        id: rule.id.clone(),
        priority: rule.priority,
        span_kinds,
        condition,
        operation_name,
        operation_type,
    })
}
