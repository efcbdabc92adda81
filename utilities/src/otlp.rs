use chrono::Utc;
use opentelemetry_proto::tonic::collector::logs::v1::ExportLogsServiceRequest;
use opentelemetry_proto::tonic::collector::metrics::v1::ExportMetricsServiceRequest;
use opentelemetry_proto::tonic::collector::trace::v1::ExportTraceServiceRequest;
use opentelemetry_proto::tonic::common::v1::any_value::Value::StringValue;
use opentelemetry_proto::tonic::common::v1::{AnyValue, InstrumentationScope, KeyValue};
use opentelemetry_proto::tonic::logs::v1::{LogRecord, ResourceLogs, ScopeLogs};
use opentelemetry_proto::tonic::metrics::v1::metric::Data;
use opentelemetry_proto::tonic::metrics::v1::number_data_point::Value;
use opentelemetry_proto::tonic::metrics::v1::{
    Gauge, Metric, NumberDataPoint, ResourceMetrics, ScopeMetrics,
};
use opentelemetry_proto::tonic::resource::v1::Resource;
use opentelemetry_proto::tonic::trace::v1;
use opentelemetry_proto::tonic::trace::v1::span::SpanKind;
use opentelemetry_proto::tonic::trace::v1::{ResourceSpans, ScopeSpans, Status};

const SCHEMA_URL: &str = "https://opentelemetry.io/schemas/1.21.0";

pub struct FakeOTLP;

impl FakeOTLP {
    pub fn trace_service_request() -> ExportTraceServiceRequest {
        Self::trace_service_request_with_spans(1, 1)
    }

    pub fn trace_service_request_with_spans(
        num_res_spans: usize,
        num_spans: usize,
    ) -> ExportTraceServiceRequest {
        let mut exp = ExportTraceServiceRequest {
            resource_spans: Vec::with_capacity(num_res_spans),
        };
        for _i in 0..num_res_spans {
            let spans = (0..num_spans)
                .map(|_| Self::span("foo", SpanKind::Internal, &[("http.method", "POST")]))
                .collect();
            exp.resource_spans.push(Self::resource_spans(spans));
        }
        exp
    }

    /// A resource group wrapping the given spans in a single scope, with
    /// realistic resource and scope attributes.
    pub fn resource_spans(spans: Vec<v1::Span>) -> ResourceSpans {
        let scope_spans = ScopeSpans {
            scope: Some(InstrumentationScope {
                name: "scope".to_string(),
                version: "0.0.1".to_string(),
                attributes: vec![string_attr("module", "api")],
                dropped_attributes_count: 0,
            }),
            spans,
            schema_url: SCHEMA_URL.to_string(),
        };
        ResourceSpans {
            resource: Some(Resource {
                attributes: vec![
                    string_attr("service.name", "test-service"),
                    string_attr("telemetry.sdk.version", "1.13.0"),
                    string_attr("telemetry.sdk.name", "open-telemetry"),
                    string_attr("k8s.pod.uid", "dc2c3e55-0dfb-4fda-854c-f7a1e5f88fd6"),
                ],
                dropped_attributes_count: 0,
            }),
            scope_spans: vec![scope_spans],
            schema_url: SCHEMA_URL.to_string(),
        }
    }

    /// A span with the given name, kind, and string attributes.
    pub fn span(name: &str, kind: SpanKind, attributes: &[(&str, &str)]) -> v1::Span {
        let now_ns = Utc::now().timestamp_nanos_opt().unwrap();
        let finish_ns = now_ns + 1_000_000;
        v1::Span {
            trace_id: vec![1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
            span_id: vec![2, 2, 2, 2, 2, 2, 2, 2],
            trace_state: "rojo=00f067aa0ba902b7".to_string(),
            parent_span_id: vec![1, 1, 1, 1, 1, 1, 1, 1],
            flags: 0,
            name: name.to_string(),
            kind: kind.into(),
            start_time_unix_nano: now_ns as u64,
            end_time_unix_nano: finish_ns as u64,
            attributes: attributes.iter().map(|(k, v)| string_attr(k, v)).collect(),
            dropped_attributes_count: 0,
            events: vec![],
            dropped_events_count: 0,
            links: vec![],
            dropped_links_count: 0,
            status: Some(Status::default()),
        }
    }

    pub fn metrics_service_request() -> ExportMetricsServiceRequest {
        let now_ns = Utc::now().timestamp_nanos_opt().unwrap();
        let dp = vec![NumberDataPoint {
            attributes: vec![],
            start_time_unix_nano: now_ns as u64,
            time_unix_nano: now_ns as u64,
            exemplars: vec![],
            flags: 0,
            value: Some(Value::AsDouble(100.0)),
        }];
        let metric = Metric {
            name: "test-metric".to_string(),
            description: "An example OTLP Metric".to_string(),
            unit: "".to_string(),
            metadata: vec![],
            data: Some(Data::Gauge(Gauge { data_points: dp })),
        };
        ExportMetricsServiceRequest {
            resource_metrics: vec![ResourceMetrics {
                resource: Some(Resource {
                    attributes: vec![string_attr("service.name", "test-service")],
                    dropped_attributes_count: 0,
                }),
                scope_metrics: vec![ScopeMetrics {
                    scope: None,
                    metrics: vec![metric],
                    schema_url: SCHEMA_URL.to_string(),
                }],
                schema_url: SCHEMA_URL.to_string(),
            }],
        }
    }

    pub fn logs_service_request() -> ExportLogsServiceRequest {
        let now_ns = Utc::now().timestamp_nanos_opt().unwrap();
        let log = LogRecord {
            time_unix_nano: now_ns as u64,
            observed_time_unix_nano: now_ns as u64,
            severity_number: 0,
            severity_text: "WARNING".to_string(),
            body: Some(AnyValue {
                value: Some(StringValue("This is a log message".to_string())),
            }),
            attributes: vec![],
            dropped_attributes_count: 0,
            flags: 0,
            trace_id: vec![],
            span_id: vec![],
            event_name: "".to_string(),
        };
        ExportLogsServiceRequest {
            resource_logs: vec![ResourceLogs {
                resource: Some(Resource {
                    attributes: vec![string_attr("service.name", "test-service")],
                    dropped_attributes_count: 0,
                }),
                scope_logs: vec![ScopeLogs {
                    scope: None,
                    log_records: vec![log],
                    schema_url: SCHEMA_URL.to_string(),
                }],
                schema_url: SCHEMA_URL.to_string(),
            }],
        }
    }
}

pub fn string_attr(key: &str, value: &str) -> KeyValue {
    KeyValue {
        key: key.to_string(),
        value: Some(AnyValue {
            value: Some(StringValue(value.to_string())),
        }),
    }
}
