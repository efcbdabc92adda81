// SPDX-License-Identifier: Apache-2.0

/// Default attribute carrying the generated operation name.
pub const OPERATION_NAME: &str = "operation.name";

/// Default attribute carrying the generated operation type.
pub const OPERATION_TYPE: &str = "operation.type";

/// Default attribute preserving the original span name in enforce mode.
pub const NAME_ORIGINAL: &str = "name.original";
