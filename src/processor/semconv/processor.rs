// SPDX-License-Identifier: Apache-2.0

//! Span evaluator and pipeline adapter.

use std::time::Instant;

use opentelemetry::metrics::Meter;
use opentelemetry_proto::tonic::common::v1::InstrumentationScope;
use opentelemetry_proto::tonic::logs::v1::ResourceLogs;
use opentelemetry_proto::tonic::metrics::v1::ResourceMetrics;
use opentelemetry_proto::tonic::resource::v1::Resource;
use opentelemetry_proto::tonic::trace::v1::span::SpanKind;
use opentelemetry_proto::tonic::trace::v1::{ResourceSpans, Span};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::cardinality::CardinalityTracker;
use super::config::{Config, ProcessingMode};
use super::context::SpanContext;
use super::error::Result;
use super::rule::{compile_rules, CompiledRule};
use super::telemetry::{
    ProcessorTelemetry, ERROR_TYPE_PROCESSING, ERROR_TYPE_VALIDATION, SIGNAL_LOGS, SIGNAL_METRICS,
    SIGNAL_TRACES,
};
use crate::otlp::attr;
use crate::processor::{batch_span_count, Capabilities, SignalProcessor};

/// The semconv processor: compiled rules, telemetry handles, and the
/// optional cardinality tracker. Shared immutably across concurrent batch
/// evaluations.
pub struct SemconvProcessor {
    config: Config,
    rules: Vec<CompiledRule>,
    telemetry: ProcessorTelemetry,
    tracker: Option<CardinalityTracker>,
}

/// Outcome of the rule loop for one span, applied after evaluation so the
/// span is only borrowed mutably once a winner is known.
struct RuleMatch {
    rule_id: String,
    operation_name: String,
    operation_type: String,
}

impl SemconvProcessor {
    /// Validates the configuration and compiles the rule set. Without a
    /// meter the processor runs with telemetry disabled.
    pub fn new(mut config: Config, meter: Option<&Meter>) -> Result<Self> {
        let telemetry = match meter {
            Some(meter) => ProcessorTelemetry::new(meter),
            None => ProcessorTelemetry::noop(),
        };

        if let Err(e) = config.validate() {
            telemetry.record_error(ERROR_TYPE_VALIDATION);
            return Err(e);
        }

        let rules = if config.span_processing.enabled {
            match compile_rules(&config.span_processing) {
                Ok(rules) => rules,
                Err(e) => {
                    telemetry.record_error(ERROR_TYPE_VALIDATION);
                    return Err(e);
                }
            }
        } else {
            Vec::new()
        };

        let tracker = config.benchmark.then(CardinalityTracker::new);

        Ok(Self {
            config,
            rules,
            telemetry,
            tracker,
        })
    }

    /// Runs the rule loop for one span and applies the winning rule.
    fn evaluate_span(
        &self,
        span: &mut Span,
        scope: Option<&InstrumentationScope>,
        resource: Option<&Resource>,
    ) {
        let sp = &self.config.span_processing;

        // Upstream instrumentation wins: a span that already carries the
        // operation name attribute is left untouched.
        if attr::has_attribute(&span.attributes, &sp.operation_name_attribute) {
            return;
        }

        if let Some(tracker) = &self.tracker {
            if tracker.observe_original(&span.name) {
                self.telemetry.inc_unique_span_names();
            }
        }

        let kind = span.kind();
        let matched = {
            let ctx = SpanContext {
                span,
                scope,
                resource,
            };
            self.find_match(&ctx, kind)
        };

        let Some(matched) = matched else {
            return;
        };

        match sp.mode {
            ProcessingMode::Enrich => {
                attr::put_string_attribute(
                    &mut span.attributes,
                    &sp.operation_name_attribute,
                    &matched.operation_name,
                );
            }
            ProcessingMode::Enforce => {
                attr::put_string_attribute(
                    &mut span.attributes,
                    &sp.operation_name_attribute,
                    &matched.operation_name,
                );
                if sp.preserve_original_name && span.name != matched.operation_name {
                    let original = span.name.clone();
                    attr::put_string_attribute(
                        &mut span.attributes,
                        &sp.original_name_attribute,
                        &original,
                    );
                }
                span.name = matched.operation_name.clone();
            }
        }

        // The type attribute is only ever filled in, never overwritten.
        if !matched.operation_type.is_empty()
            && !attr::has_attribute(&span.attributes, &sp.operation_type_attribute)
        {
            attr::put_string_attribute(
                &mut span.attributes,
                &sp.operation_type_attribute,
                &matched.operation_type,
            );
        }

        self.telemetry
            .record_enforced(&matched.rule_id, &matched.operation_type, sp.mode);

        if let Some(tracker) = &self.tracker {
            if tracker.observe_produced(&matched.operation_name) {
                self.telemetry.inc_unique_operation_names();
            }
        }
    }

    /// First matching rule wins: lowest priority, insertion order on ties.
    /// A rule whose condition or operation_name fails to evaluate is
    /// skipped, never fatal.
    fn find_match(&self, ctx: &SpanContext<'_>, kind: SpanKind) -> Option<RuleMatch> {
        for rule in &self.rules {
            if !rule.matches_kind(kind) {
                continue;
            }

            match rule.condition.eval(ctx) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    debug!(rule_id = %rule.id, error = %e, "condition evaluation failed, skipping rule");
                    self.telemetry.record_error(ERROR_TYPE_PROCESSING);
                    continue;
                }
            }

            let operation_name = match rule.operation_name.eval(ctx) {
                Ok(value) => value.to_string(),
                Err(e) => {
                    debug!(rule_id = %rule.id, error = %e, "operation_name evaluation failed, skipping rule");
                    self.telemetry.record_error(ERROR_TYPE_PROCESSING);
                    continue;
                }
            };

            let operation_type = match &rule.operation_type {
                None => String::new(),
                Some(expr) => match expr.eval(ctx) {
                    Ok(value) => value.to_string(),
                    Err(e) => {
                        debug!(rule_id = %rule.id, error = %e, "operation_type evaluation failed, leaving type empty");
                        String::new()
                    }
                },
            };

            return Some(RuleMatch {
                rule_id: rule.id.clone(),
                operation_name,
                operation_type,
            });
        }
        None
    }

    fn record_benchmark_counts(&self) {
        let Some(tracker) = &self.tracker else {
            return;
        };
        let (original, reduced) = tracker.counts();
        self.telemetry.record_name_counts(original, reduced);
        if original > 0 {
            let reduction_pct = 100.0 * (1.0 - reduced as f64 / original as f64);
            info!(
                original_span_names = original,
                operation_names = reduced,
                reduction_pct = format!("{:.1}", reduction_pct),
                "span name cardinality"
            );
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_micros() as f64 / 1000.0
}

impl SignalProcessor for SemconvProcessor {
    fn capabilities(&self) -> Capabilities {
        Capabilities { mutates_data: true }
    }

    fn process_traces(&self, batch: &mut [ResourceSpans], cancel: &CancellationToken) {
        if !self.config.enabled {
            return;
        }

        let start = Instant::now();
        let span_count = batch_span_count(batch) as u64;

        if self.config.span_processing.enabled {
            'batch: for resource_spans in batch.iter_mut() {
                let ResourceSpans {
                    resource,
                    scope_spans,
                    ..
                } = resource_spans;
                let resource = resource.as_ref();

                for scope_spans in scope_spans.iter_mut() {
                    let scope = scope_spans.scope.as_ref();
                    for span in scope_spans.spans.iter_mut() {
                        // Remaining spans pass through untouched once the
                        // host gives up on the batch.
                        if cancel.is_cancelled() {
                            debug!("cancellation requested, passing remaining spans through");
                            break 'batch;
                        }
                        self.evaluate_span(span, scope, resource);
                    }
                }
            }
        }

        if span_count > 0 {
            self.telemetry
                .record_spans_processed(span_count, SIGNAL_TRACES);
        }
        self.record_benchmark_counts();
        self.telemetry
            .record_duration_ms(elapsed_ms(start), SIGNAL_TRACES);
    }

    fn process_metrics(&self, _batch: &mut [ResourceMetrics], _cancel: &CancellationToken) {
        if !self.config.enabled {
            return;
        }
        let start = Instant::now();
        self.telemetry
            .record_duration_ms(elapsed_ms(start), SIGNAL_METRICS);
    }

    fn process_logs(&self, _batch: &mut [ResourceLogs], _cancel: &CancellationToken) {
        if !self.config.enabled {
            return;
        }
        let start = Instant::now();
        self.telemetry
            .record_duration_ms(elapsed_ms(start), SIGNAL_LOGS);
    }

    fn shutdown(&self) {
        if let Some(tracker) = &self.tracker {
            tracker.clear();
        }
        debug!("semconv processor shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::semconv::config::{RuleConfig, SpanProcessingConfig};

    fn span(name: &str, kind: SpanKind, attributes: &[(&str, &str)]) -> Span {
        Span {
            name: name.to_string(),
            kind: kind as i32,
            attributes: attributes
                .iter()
                .map(|(k, v)| attr::string_attribute(k, v))
                .collect(),
            ..Default::default()
        }
    }

    fn http_rule() -> RuleConfig {
        RuleConfig {
            id: "http_route".to_string(),
            priority: 100,
            condition: r#"attributes["http.method"] != nil and attributes["http.route"] != nil"#
                .to_string(),
            operation_name:
                r#"Concat([attributes["http.method"], attributes["http.route"]], " ")"#.to_string(),
            operation_type: Some(r#""http""#.to_string()),
            ..Default::default()
        }
    }

    fn processor(mode: ProcessingMode, preserve: bool, rules: Vec<RuleConfig>) -> SemconvProcessor {
        let config = Config {
            enabled: true,
            benchmark: false,
            span_processing: SpanProcessingConfig {
                enabled: true,
                mode,
                preserve_original_name: preserve,
                rules,
                ..Default::default()
            },
        };
        SemconvProcessor::new(config, None).unwrap()
    }

    fn attr_value(span: &Span, key: &str) -> Option<String> {
        attr::find_attribute(&span.attributes, key).map(|kv| {
            match attr::to_value(kv.value.as_ref().unwrap()) {
                ottl::Value::String(s) => s,
                other => other.to_string(),
            }
        })
    }

    #[test]
    fn enrich_adds_attributes_only() {
        let p = processor(ProcessingMode::Enrich, false, vec![http_rule()]);
        let mut span = span(
            "whatever",
            SpanKind::Server,
            &[("http.method", "GET"), ("http.route", "/users/{id}")],
        );

        p.evaluate_span(&mut span, None, None);

        assert_eq!(span.name, "whatever");
        assert_eq!(attr_value(&span, "operation.name").as_deref(), Some("GET /users/{id}"));
        assert_eq!(attr_value(&span, "operation.type").as_deref(), Some("http"));
    }

    #[test]
    fn enforce_replaces_name_and_preserves_original() {
        let p = processor(ProcessingMode::Enforce, true, vec![http_rule()]);
        let mut span = span(
            "GET /users/42",
            SpanKind::Server,
            &[("http.method", "GET"), ("http.route", "/users/{id}")],
        );

        p.evaluate_span(&mut span, None, None);

        assert_eq!(span.name, "GET /users/{id}");
        assert_eq!(attr_value(&span, "operation.name").as_deref(), Some("GET /users/{id}"));
        assert_eq!(attr_value(&span, "name.original").as_deref(), Some("GET /users/42"));
        assert_eq!(attr_value(&span, "operation.type").as_deref(), Some("http"));
    }

    #[test]
    fn enforce_skips_original_when_name_unchanged() {
        let p = processor(ProcessingMode::Enforce, true, vec![http_rule()]);
        let mut span = span(
            "GET /users/{id}",
            SpanKind::Server,
            &[("http.method", "GET"), ("http.route", "/users/{id}")],
        );

        p.evaluate_span(&mut span, None, None);

        assert_eq!(span.name, "GET /users/{id}");
        assert_eq!(attr_value(&span, "name.original"), None);
    }

    #[test]
    fn existing_operation_name_short_circuits() {
        let p = processor(ProcessingMode::Enforce, true, vec![http_rule()]);
        let mut span = span(
            "orig",
            SpanKind::Server,
            &[
                ("http.method", "GET"),
                ("http.route", "/a"),
                ("operation.name", "pre"),
                ("operation.type", "pre"),
            ],
        );
        let before = span.clone();

        p.evaluate_span(&mut span, None, None);

        assert_eq!(span, before);
    }

    #[test]
    fn existing_operation_type_is_never_overwritten() {
        let p = processor(ProcessingMode::Enforce, false, vec![http_rule()]);
        let mut span = span(
            "orig",
            SpanKind::Server,
            &[
                ("http.method", "PUT"),
                ("http.route", "/a"),
                ("operation.type", "pre-existing"),
            ],
        );

        p.evaluate_span(&mut span, None, None);

        assert_eq!(span.name, "PUT /a");
        assert_eq!(attr_value(&span, "operation.type").as_deref(), Some("pre-existing"));
    }

    #[test]
    fn priority_tie_breaks_by_insertion_order() {
        let alpha = RuleConfig {
            id: "alpha".to_string(),
            priority: 100,
            condition: "true".to_string(),
            operation_name: r#""A""#.to_string(),
            ..Default::default()
        };
        let beta = RuleConfig {
            id: "beta".to_string(),
            priority: 100,
            condition: "true".to_string(),
            operation_name: r#""B""#.to_string(),
            ..Default::default()
        };

        let p = processor(ProcessingMode::Enforce, false, vec![alpha, beta]);
        let mut span = span("orig", SpanKind::Internal, &[]);
        p.evaluate_span(&mut span, None, None);

        assert_eq!(span.name, "A");
    }

    #[test]
    fn kind_filter_rejects_mismatched_span() {
        let mut rule = http_rule();
        rule.span_kind = vec!["server".to_string()];
        let p = processor(ProcessingMode::Enforce, false, vec![rule]);

        let mut span = span(
            "orig",
            SpanKind::Client,
            &[("http.method", "GET"), ("http.route", "/a")],
        );
        p.evaluate_span(&mut span, None, None);

        assert_eq!(span.name, "orig");
        assert_eq!(attr_value(&span, "operation.name"), None);
    }

    #[test]
    fn failing_rule_is_skipped_and_next_rule_applies() {
        // ParseSQL over a missing attribute errors at evaluation time.
        let failing = RuleConfig {
            id: "failing".to_string(),
            priority: 1,
            condition: r#"ParseSQL(attributes["db.statement"]) != nil"#.to_string(),
            operation_name: r#"ParseSQL(attributes["db.statement"])"#.to_string(),
            ..Default::default()
        };
        let fallback = RuleConfig {
            id: "fallback".to_string(),
            priority: 2,
            condition: "true".to_string(),
            operation_name: r#""fallback-op""#.to_string(),
            ..Default::default()
        };

        let p = processor(ProcessingMode::Enforce, false, vec![failing, fallback]);
        let mut span = span("orig", SpanKind::Internal, &[]);
        p.evaluate_span(&mut span, None, None);

        assert_eq!(span.name, "fallback-op");
    }

    #[test]
    fn no_matching_rule_leaves_span_untouched() {
        let p = processor(ProcessingMode::Enforce, true, vec![http_rule()]);
        let mut span = span("orig", SpanKind::Server, &[("unrelated", "x")]);
        let before = span.clone();

        p.evaluate_span(&mut span, None, None);

        assert_eq!(span, before);
    }

    #[test]
    fn first_non_nil_bridges_attribute_conventions() {
        let rule = RuleConfig {
            id: "methods".to_string(),
            condition:
                r#"FirstNonNil([attributes["http.request.method"], attributes["http.method"]]) != nil"#
                    .to_string(),
            operation_name:
                r#"FirstNonNil([attributes["http.request.method"], attributes["http.method"]])"#
                    .to_string(),
            ..Default::default()
        };
        let p = processor(ProcessingMode::Enforce, false, vec![rule]);

        let mut span1 = span(
            "orig",
            SpanKind::Server,
            &[("http.request.method", "GET"), ("http.method", "POST")],
        );
        p.evaluate_span(&mut span1, None, None);
        assert_eq!(span1.name, "GET");

        let mut span2 = span("orig", SpanKind::Server, &[("http.method", "POST")]);
        p.evaluate_span(&mut span2, None, None);
        assert_eq!(span2.name, "POST");

        let mut span3 = span("orig", SpanKind::Server, &[]);
        p.evaluate_span(&mut span3, None, None);
        assert_eq!(span3.name, "orig");
    }

    #[test]
    fn resource_attributes_are_readable_and_untouched() {
        let rule = RuleConfig {
            id: "svc".to_string(),
            condition: r#"resource.attributes["service.name"] == "checkout""#.to_string(),
            operation_name: r#"Concat([resource.attributes["service.name"], name], ":")"#
                .to_string(),
            ..Default::default()
        };
        let p = processor(ProcessingMode::Enforce, false, vec![rule]);

        let resource = Resource {
            attributes: vec![attr::string_attribute("service.name", "checkout")],
            ..Default::default()
        };
        let mut span = span("op", SpanKind::Server, &[]);
        p.evaluate_span(&mut span, None, Some(&resource));

        assert_eq!(span.name, "checkout:op");
        assert_eq!(resource.attributes.len(), 1);
    }

    #[test]
    fn non_string_results_use_canonical_stringification() {
        let rule = RuleConfig {
            id: "retries".to_string(),
            condition: r#"attributes["retries"] != nil"#.to_string(),
            operation_name: r#"attributes["retries"]"#.to_string(),
            ..Default::default()
        };
        let p = processor(ProcessingMode::Enforce, false, vec![rule]);

        let mut span = span("orig", SpanKind::Internal, &[]);
        span.attributes.push(opentelemetry_proto::tonic::common::v1::KeyValue {
            key: "retries".to_string(),
            value: Some(opentelemetry_proto::tonic::common::v1::AnyValue {
                value: Some(
                    opentelemetry_proto::tonic::common::v1::any_value::Value::IntValue(3),
                ),
            }),
        });

        p.evaluate_span(&mut span, None, None);
        assert_eq!(span.name, "3");
    }

    #[test]
    fn disabled_processor_is_a_pass_through() {
        let mut config = Config {
            enabled: false,
            ..Default::default()
        };
        config.span_processing.enabled = true;
        config.span_processing.rules = vec![http_rule()];
        let p = SemconvProcessor::new(config, None).unwrap();

        let mut batch = vec![ResourceSpans {
            scope_spans: vec![opentelemetry_proto::tonic::trace::v1::ScopeSpans {
                spans: vec![span(
                    "orig",
                    SpanKind::Server,
                    &[("http.method", "GET"), ("http.route", "/a")],
                )],
                ..Default::default()
            }],
            ..Default::default()
        }];
        let before = batch.clone();

        p.process_traces(&mut batch, &CancellationToken::new());
        assert_eq!(batch, before);
    }

    #[test]
    fn cancelled_batch_passes_remaining_spans_through() {
        let p = processor(ProcessingMode::Enforce, false, vec![http_rule()]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut batch = vec![ResourceSpans {
            scope_spans: vec![opentelemetry_proto::tonic::trace::v1::ScopeSpans {
                spans: vec![span(
                    "orig",
                    SpanKind::Server,
                    &[("http.method", "GET"), ("http.route", "/a")],
                )],
                ..Default::default()
            }],
            ..Default::default()
        }];
        let before = batch.clone();

        p.process_traces(&mut batch, &cancel);
        assert_eq!(batch, before);
    }

    #[test]
    fn benchmark_tracker_counts_distinct_names() {
        let rule = RuleConfig {
            id: "url_path".to_string(),
            condition: r#"attributes["url.path"] != nil"#.to_string(),
            operation_name:
                r#"Concat([attributes["http.method"], NormalizePath(attributes["url.path"])], " ")"#
                    .to_string(),
            ..Default::default()
        };
        let config = Config {
            enabled: true,
            benchmark: true,
            span_processing: SpanProcessingConfig {
                enabled: true,
                mode: ProcessingMode::Enforce,
                rules: vec![rule],
                ..Default::default()
            },
        };
        let p = SemconvProcessor::new(config, None).unwrap();

        let mut spans = Vec::new();
        for _ in 0..5 {
            spans.push(span(
                "GET /users/12345/profile",
                SpanKind::Server,
                &[("http.method", "GET"), ("url.path", "/users/12345/profile")],
            ));
        }
        for _ in 0..3 {
            spans.push(span(
                "GET /users/67890/profile",
                SpanKind::Server,
                &[("http.method", "GET"), ("url.path", "/users/67890/profile")],
            ));
        }
        let mut batch = vec![ResourceSpans {
            scope_spans: vec![opentelemetry_proto::tonic::trace::v1::ScopeSpans {
                spans,
                ..Default::default()
            }],
            ..Default::default()
        }];

        p.process_traces(&mut batch, &CancellationToken::new());

        for span in &batch[0].scope_spans[0].spans {
            assert_eq!(span.name, "GET /users/{id}/profile");
        }
        // Two distinct originals collapsed into one operation name.
        assert_eq!(p.tracker.as_ref().unwrap().counts(), (2, 1));

        // Counts survive further batches of already-seen names.
        let mut batch = vec![ResourceSpans {
            scope_spans: vec![opentelemetry_proto::tonic::trace::v1::ScopeSpans {
                spans: vec![span(
                    "GET /users/12345/profile",
                    SpanKind::Server,
                    &[("http.method", "GET"), ("url.path", "/users/12345/profile")],
                )],
                ..Default::default()
            }],
            ..Default::default()
        }];
        p.process_traces(&mut batch, &CancellationToken::new());
        assert_eq!(p.tracker.as_ref().unwrap().counts(), (2, 1));
    }

    #[test]
    fn invalid_rule_fails_construction() {
        let mut rule = http_rule();
        rule.condition = r#"Bogus(attributes["x"])"#.to_string();
        let config = Config {
            enabled: true,
            span_processing: SpanProcessingConfig {
                enabled: true,
                rules: vec![rule],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(SemconvProcessor::new(config, None).is_err());
    }
}
