// SPDX-License-Identifier: Apache-2.0

//! Expression evaluation context over a span.

use opentelemetry_proto::tonic::common::v1::{InstrumentationScope, KeyValue};
use opentelemetry_proto::tonic::resource::v1::Resource;
use opentelemetry_proto::tonic::trace::v1::span::SpanKind;
use opentelemetry_proto::tonic::trace::v1::Span;
use ottl::{helpers, IndexExpr, PathContext, Value};

use crate::otlp::attr;

/// Paths expressions may read. Span fields and the span attribute bag are
/// the hot ones; resource and scope are exposed read-only.
const SPAN_PATHS: [&str; 8] = [
    "name",
    "kind",
    "status.code",
    "attributes",
    "resource.attributes",
    "instrumentation_scope.name",
    "instrumentation_scope.version",
    "instrumentation_scope.attributes",
];

/// Registers the span paths and the span-kind enum constants on a parser.
pub(crate) fn register_span_context(parser: &mut ottl::Parser) {
    for path in SPAN_PATHS {
        parser.register_path(path);
    }
    for (name, kind) in [
        ("SPAN_KIND_UNSPECIFIED", SpanKind::Unspecified),
        ("SPAN_KIND_INTERNAL", SpanKind::Internal),
        ("SPAN_KIND_SERVER", SpanKind::Server),
        ("SPAN_KIND_CLIENT", SpanKind::Client),
        ("SPAN_KIND_PRODUCER", SpanKind::Producer),
        ("SPAN_KIND_CONSUMER", SpanKind::Consumer),
    ] {
        parser.register_enum(name, kind as i64);
    }
}

/// Maps a config-level span kind name to the OTLP kind.
pub(crate) fn parse_span_kind(name: &str) -> Option<SpanKind> {
    match name {
        "unspecified" => Some(SpanKind::Unspecified),
        "internal" => Some(SpanKind::Internal),
        "server" => Some(SpanKind::Server),
        "client" => Some(SpanKind::Client),
        "producer" => Some(SpanKind::Producer),
        "consumer" => Some(SpanKind::Consumer),
        _ => None,
    }
}

/// Read-only view of one span and its enclosing scope and resource, handed
/// to every expression evaluation.
pub(crate) struct SpanContext<'a> {
    pub span: &'a Span,
    pub scope: Option<&'a InstrumentationScope>,
    pub resource: Option<&'a Resource>,
}

impl PathContext for SpanContext<'_> {
    fn resolve(&self, path: &str, indexes: &[IndexExpr]) -> ottl::Result<Value> {
        let value = match path {
            "name" => Value::String(self.span.name.clone()),
            "kind" => Value::Int(self.span.kind as i64),
            "status.code" => self
                .span
                .status
                .as_ref()
                .map(|s| Value::Int(s.code as i64))
                .unwrap_or(Value::Nil),
            "attributes" => return resolve_attributes(&self.span.attributes, indexes),
            "resource.attributes" => {
                let attributes = self
                    .resource
                    .map(|r| r.attributes.as_slice())
                    .unwrap_or(&[]);
                return resolve_attributes(attributes, indexes);
            }
            "instrumentation_scope.name" => self
                .scope
                .map(|s| Value::String(s.name.clone()))
                .unwrap_or(Value::Nil),
            "instrumentation_scope.version" => self
                .scope
                .map(|s| Value::String(s.version.clone()))
                .unwrap_or(Value::Nil),
            "instrumentation_scope.attributes" => {
                let attributes = self.scope.map(|s| s.attributes.as_slice()).unwrap_or(&[]);
                return resolve_attributes(attributes, indexes);
            }
            other => return Err(format!("unknown path: {}", other).into()),
        };
        helpers::apply_indexes(value, indexes)
    }
}

fn resolve_attributes(attributes: &[KeyValue], indexes: &[IndexExpr]) -> ottl::Result<Value> {
    match indexes.first() {
        // Missing keys resolve to nil so conditions can test for presence.
        Some(IndexExpr::String(key)) => {
            let value = attr::get_attribute_value(attributes, key);
            helpers::apply_indexes(value, &indexes[1..])
        }
        Some(IndexExpr::Int(_)) => Err("attributes must be indexed by key".into()),
        None => Ok(attr::attributes_to_map(attributes)),
    }
}
