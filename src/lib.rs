// SPDX-License-Identifier: Apache-2.0

pub mod otlp;
pub mod processor;
pub mod semconv;
pub mod telemetry;
