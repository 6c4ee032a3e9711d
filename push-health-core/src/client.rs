// Copyright (c) The push-health Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The transport collaborator's contract surface.

use crate::errors::ClientError;
use push_health_metadata::{ArtifactRef, BugSuggestion, Job, JobId};
use std::{future::Future, sync::Arc};

/// Fetches push-health data from the CI system.
///
/// Implementations own the HTTP specifics (base URLs, retries at the
/// transport level, timeouts). They must not cache: at-most-once semantics
/// are the [`EvidenceCache`](crate::evidence::EvidenceCache)'s job, and a
/// transport-level cache would mask its explicit-retry behavior.
///
/// Each method may fail with a [`ClientError`]; the core caches failures as
/// terminal per-entry outcomes rather than propagating them fatally.
pub trait HealthClient: Send + Sync {
    /// Fetches the full job descriptor for `job`.
    fn job_detail(&self, job: JobId) -> impl Future<Output = Result<Job, ClientError>> + Send;

    /// Fetches the bug suggestions computed for `job`'s failure lines.
    fn bug_suggestions(
        &self,
        job: JobId,
    ) -> impl Future<Output = Result<Vec<BugSuggestion>, ClientError>> + Send;

    /// Lists the artifacts produced by `job`'s task run.
    fn artifact_list(
        &self,
        job: JobId,
    ) -> impl Future<Output = Result<Vec<ArtifactRef>, ClientError>> + Send;
}

/// Delegation for shared clients: an `Arc<C>` fetches through the inner
/// client.
impl<C: HealthClient> HealthClient for Arc<C> {
    fn job_detail(&self, job: JobId) -> impl Future<Output = Result<Job, ClientError>> + Send {
        (**self).job_detail(job)
    }

    fn bug_suggestions(
        &self,
        job: JobId,
    ) -> impl Future<Output = Result<Vec<BugSuggestion>, ClientError>> + Send {
        (**self).bug_suggestions(job)
    }

    fn artifact_list(
        &self,
        job: JobId,
    ) -> impl Future<Output = Result<Vec<ArtifactRef>, ClientError>> + Send {
        (**self).artifact_list(job)
    }
}
