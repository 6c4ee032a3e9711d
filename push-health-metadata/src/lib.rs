// Copyright (c) The push-health Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Fixed-schema record types exchanged between the push-health core and the
//! CI transport layer.
//!
//! These shapes are the contract surface with the job/evidence endpoints:
//! they deserialize the transport's JSON as-is and are consumed read-only by
//! [`push-health-core`](https://docs.rs/push-health-core). Enum vocabularies
//! owned by the CI system (job states and results) decode unknown values into
//! a catch-all variant rather than failing, since those vocabularies grow
//! without notice.

mod records;

pub use records::*;
