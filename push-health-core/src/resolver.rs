// Copyright (c) The push-health Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job reference resolution.

use crate::{
    client::HealthClient,
    errors::ResolutionError,
    evidence::{EvidenceCache, FetchStatus},
};
use push_health_metadata::{Job, JobId};
use std::sync::Arc;

/// Resolves job references to full job descriptors.
///
/// Composes with [`EvidenceCache`] for the underlying job-detail lookup, so
/// a job descriptor is fetched once and reused by everything that needs it
/// (platform display, retrigger rows, task links).
#[derive(Debug)]
pub struct JobResolver<C> {
    cache: Arc<EvidenceCache<C>>,
}

impl<C> Clone for JobResolver<C> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<C: HealthClient> JobResolver<C> {
    /// Creates a resolver over `cache`.
    pub fn new(cache: Arc<EvidenceCache<C>>) -> Self {
        Self { cache }
    }

    /// Resolves `job` to its descriptor, fetching it on first use.
    pub async fn resolve(&self, job: JobId) -> Result<Job, ResolutionError> {
        self.cache
            .fetch_job_detail(job)
            .await
            .map_err(|error| ResolutionError::new(job, error))
    }

    /// Snapshot of the resolution state for `job`.
    pub fn status(&self, job: JobId) -> FetchStatus<Job> {
        self.cache.job_detail_status(job)
    }
}
