// SPDX-License-Identifier: Apache-2.0

//! Processor contract expected by the host pipeline.

pub mod semconv;

use opentelemetry_proto::tonic::logs::v1::ResourceLogs;
use opentelemetry_proto::tonic::metrics::v1::ResourceMetrics;
use opentelemetry_proto::tonic::trace::v1::ResourceSpans;
use tokio_util::sync::CancellationToken;

/// What a processor is allowed to do to the payloads flowing through it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub mutates_data: bool,
}

/// A pipeline stage invoked once per batch for each signal.
///
/// Batches arrive concurrently from multiple upstream stages, so
/// implementations must be callable from multiple threads at once. The
/// cancellation token is consulted between items as an optimization; a
/// cancelled batch is passed through, never half-processed and dropped.
pub trait SignalProcessor: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    fn process_traces(&self, batch: &mut [ResourceSpans], cancel: &CancellationToken);

    fn process_metrics(&self, batch: &mut [ResourceMetrics], cancel: &CancellationToken);

    fn process_logs(&self, batch: &mut [ResourceLogs], cancel: &CancellationToken);

    /// Releases per-instance state. Called once when the pipeline drains.
    fn shutdown(&self) {}
}

/// Total number of spans in a trace batch, across all resource and scope
/// groups.
pub fn batch_span_count(batch: &[ResourceSpans]) -> usize {
    batch
        .iter()
        .flat_map(|rs| &rs.scope_spans)
        .map(|ss| ss.spans.len())
        .sum()
}
