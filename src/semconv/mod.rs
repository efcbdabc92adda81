// SPDX-License-Identifier: Apache-2.0

/// Additional attributes not defined in the semantic conventions crate
pub mod misc;
