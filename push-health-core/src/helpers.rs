// Copyright (c) The push-health Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for push-health-core.

use push_health_metadata::Failure;

/// The display label for a failure row.
///
/// Equality-comparison (reftest) pairs display as `"name == name-ref"`;
/// everything else displays the bare test name.
pub(crate) fn display_label(failure: &Failure) -> String {
    match &failure.ref_test_name {
        Some(ref_name) => format!("{} == {}", failure.test_name, ref_name),
        None => failure.test_name.clone(),
    }
}
