// Copyright (c) The push-health Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the push-health core.

use crate::{evidence::EvidenceKind, investigation::EvidenceTab};
use push_health_metadata::JobId;
use thiserror::Error;

/// An error returned by the transport collaborator.
///
/// Clonable so that terminal fetch outcomes can be cached and handed to every
/// caller that coalesced onto the same request.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ClientError {
    /// The request never produced a response (connection refused, DNS
    /// failure, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint answered with an unsuccessful HTTP status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The response body or reason phrase.
        message: String,
    },
}

/// An evidence fetch failed.
///
/// Cached as the terminal outcome for its (job, kind) slot: subsequent reads
/// observe the same error without a new transport call, until an explicit
/// retry clears the slot.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("fetching {kind} for job {job} failed")]
pub struct FetchError {
    job: JobId,
    kind: EvidenceKind,
    #[source]
    source: ClientError,
}

impl FetchError {
    pub(crate) fn new(job: JobId, kind: EvidenceKind, source: ClientError) -> Self {
        Self { job, kind, source }
    }

    /// The job the fetch was issued for.
    pub fn job(&self) -> JobId {
        self.job
    }

    /// The kind of evidence the fetch was after.
    pub fn kind(&self) -> EvidenceKind {
        self.kind
    }

    /// The underlying transport error.
    pub fn client_error(&self) -> &ClientError {
        &self.source
    }
}

/// A failure's job reference could not be resolved to a job descriptor.
///
/// Routed to the unresolved bucket or surfaced as an errored row; never
/// fatal to sibling failures.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("job {job} could not be resolved")]
pub struct ResolutionError {
    job: JobId,
    #[source]
    source: FetchError,
}

impl ResolutionError {
    pub(crate) fn new(job: JobId, source: FetchError) -> Self {
        Self { job, source }
    }

    /// The unresolvable job.
    pub fn job(&self) -> JobId {
        self.job
    }

    /// The fetch error behind the resolution failure.
    pub fn fetch_error(&self) -> &FetchError {
        &self.source
    }
}

/// Error returned while parsing an [`EvidenceTab`] value from a string.
#[derive(Clone, Debug, Error)]
#[error(
    "unrecognized value for evidence tab: {input}\n(known values: {})",
    EvidenceTab::variants().join(", "),
)]
pub struct EvidenceTabParseError {
    input: String,
}

impl EvidenceTabParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}
