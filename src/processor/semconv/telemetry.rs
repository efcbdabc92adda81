// SPDX-License-Identifier: Apache-2.0

//! Instrument handles for the processor. Metric names are pinned: the
//! shipped dashboards and the monitor script look them up verbatim.

use opentelemetry::metrics::Meter;
use opentelemetry::KeyValue;

use super::config::ProcessingMode;
use crate::telemetry::{
    Counter, Gauge, Histogram, ProcessorCounter, ProcessorGauge, ProcessorHistogram,
};

pub(crate) const SIGNAL_TRACES: &str = "traces";
pub(crate) const SIGNAL_METRICS: &str = "metrics";
pub(crate) const SIGNAL_LOGS: &str = "logs";

pub(crate) const ERROR_TYPE_VALIDATION: &str = "validation";
pub(crate) const ERROR_TYPE_PROCESSING: &str = "processing";

const DURATION_BOUNDARIES: [f64; 9] = [0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 50.0, 100.0];

pub(crate) struct ProcessorTelemetry {
    spans_processed: ProcessorCounter<u64>,
    span_names_enforced: ProcessorCounter<u64>,
    processing_duration: ProcessorHistogram<f64>,
    errors: ProcessorCounter<u64>,
    original_span_name_count: ProcessorGauge<u64>,
    reduced_span_name_count: ProcessorGauge<u64>,
    unique_span_names_total: ProcessorCounter<u64>,
    unique_operation_names_total: ProcessorCounter<u64>,
}

impl ProcessorTelemetry {
    pub fn new(meter: &Meter) -> Self {
        Self {
            spans_processed: ProcessorCounter::OTELCounter(
                meter
                    .u64_counter("processor_semconv_spans_processed")
                    .with_description("Telemetry items run through the processor")
                    .build(),
            ),
            span_names_enforced: ProcessorCounter::OTELCounter(
                meter
                    .u64_counter("processor_semconv_span_names_enforced")
                    .with_description("Spans matched by a rule, by rule id")
                    .build(),
            ),
            processing_duration: ProcessorHistogram::OTELHistogram(
                meter
                    .f64_histogram("processor_semconv_processing_duration")
                    .with_description("Per-batch processing duration")
                    .with_unit("ms")
                    .with_boundaries(DURATION_BOUNDARIES.to_vec())
                    .build(),
            ),
            errors: ProcessorCounter::OTELCounter(
                meter
                    .u64_counter("processor_semconv_errors")
                    .with_description("Errors by type")
                    .build(),
            ),
            original_span_name_count: ProcessorGauge::OTELGauge(
                meter
                    .u64_gauge("processor_semconv_original_span_name_count")
                    .with_description("Distinct original span names observed")
                    .build(),
            ),
            reduced_span_name_count: ProcessorGauge::OTELGauge(
                meter
                    .u64_gauge("processor_semconv_reduced_span_name_count")
                    .with_description("Distinct operation names produced")
                    .build(),
            ),
            unique_span_names_total: ProcessorCounter::OTELCounter(
                meter
                    .u64_counter("processor_semconv_unique_span_names_total")
                    .with_description("Monotonic count of first-seen span names")
                    .build(),
            ),
            unique_operation_names_total: ProcessorCounter::OTELCounter(
                meter
                    .u64_counter("processor_semconv_unique_operation_names_total")
                    .with_description("Monotonic count of first-seen operation names")
                    .build(),
            ),
        }
    }

    /// All instruments disabled; used when the host provides no meter.
    pub fn noop() -> Self {
        Self {
            spans_processed: ProcessorCounter::NoOpCounter,
            span_names_enforced: ProcessorCounter::NoOpCounter,
            processing_duration: ProcessorHistogram::NoOpHistogram,
            errors: ProcessorCounter::NoOpCounter,
            original_span_name_count: ProcessorGauge::NoOpGauge,
            reduced_span_name_count: ProcessorGauge::NoOpGauge,
            unique_span_names_total: ProcessorCounter::NoOpCounter,
            unique_operation_names_total: ProcessorCounter::NoOpCounter,
        }
    }

    pub fn record_spans_processed(&self, count: u64, signal: &'static str) {
        self.spans_processed
            .add(count, &[KeyValue::new("signal_type", signal)]);
    }

    pub fn record_duration_ms(&self, duration_ms: f64, signal: &'static str) {
        self.processing_duration
            .record(duration_ms, &[KeyValue::new("signal_type", signal)]);
    }

    pub fn record_enforced(&self, rule_id: &str, operation_type: &str, mode: ProcessingMode) {
        self.span_names_enforced.add(
            1,
            &[
                KeyValue::new("rule_id", rule_id.to_string()),
                KeyValue::new("operation_type", operation_type.to_string()),
                KeyValue::new("mode", mode.as_str()),
            ],
        );
    }

    pub fn record_error(&self, error_type: &'static str) {
        self.errors
            .add(1, &[KeyValue::new("error_type", error_type)]);
    }

    pub fn record_name_counts(&self, original: u64, reduced: u64) {
        self.original_span_name_count.record(original, &[]);
        self.reduced_span_name_count.record(reduced, &[]);
    }

    pub fn inc_unique_span_names(&self) {
        self.unique_span_names_total.add(1, &[]);
    }

    pub fn inc_unique_operation_names(&self) {
        self.unique_operation_names_total.add(1, &[]);
    }
}
