// SPDX-License-Identifier: Apache-2.0

//! Span-name cardinality processor.
//!
//! Rewrites span identity so that billions of distinct span names collapse
//! into a small, stable set of operation names. Rules are expressions in the
//! embedded transformation language (the `ottl` crate) extended with four
//! domain converters; the lowest-priority matching rule wins and either
//! enriches the span with an `operation.name` attribute or enforces it as
//! the span name.

mod cardinality;
mod config;
mod context;
mod error;
mod functions;
mod processor;
mod rule;
mod telemetry;

pub use config::{Config, ProcessingMode, RuleConfig, SpanProcessingConfig};
pub use error::{Error, Result};
pub use functions::register_semconv_converters;
pub use processor::SemconvProcessor;
