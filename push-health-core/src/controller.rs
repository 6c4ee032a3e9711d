// Copyright (c) The push-health Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-platform orchestration.
//!
//! One [`PlatformConfigController`] glues a platform bucket to the
//! investigation state machine and the evidence cache. Command handling is
//! synchronous and returns the fetch intents a command unlocked; the
//! embedding drives those intents through [`fulfill`](PlatformConfigController::fulfill)
//! (awaited or spawned) and re-reads the view model when they land. Expansion
//! is the sole trigger point for network fetches; collapse only transitions
//! state.

use crate::{
    client::HealthClient,
    evidence::{EvidenceCache, EvidenceKind, EvidenceValue, FetchStatus},
    grouper::GroupKey,
    helpers,
    investigation::{EvidenceTab, InvestigationCommand, InvestigationState},
    resolver::JobResolver,
};
use futures::future::join_all;
use indexmap::IndexMap;
use push_health_metadata::{ArtifactRef, BugSuggestion, Failure, Job, JobId};
use smol_str::SmolStr;
use std::sync::Arc;
use tracing::debug;

/// One evidence fetch a command unlocked.
///
/// Fulfilling a request resolves the job detail first, then fetches the
/// tab's evidence kind, both through the cache; requests for already-cached
/// slots are cheap no-ops.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct FetchRequest {
    /// The job to fetch for.
    pub job: JobId,
    /// The tab whose evidence kind to fetch.
    pub tab: EvidenceTab,
}

#[derive(Clone, Debug, Default)]
struct RowState {
    state: InvestigationState,
    // Per-job tab overrides, shadowing the failure-level tab. Cleared by
    // collapse and by a failure-level tab selection.
    job_tabs: IndexMap<JobId, EvidenceTab>,
}

/// Render-ready snapshot of a platform bucket.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlatformView {
    /// The bucket key.
    pub key: GroupKey,
    /// Display title for the bucket.
    pub title: SmolStr,
    /// One entry per failure, in bucket order.
    pub failures: Vec<FailureView>,
}

/// Render-ready snapshot of one failure row.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FailureView {
    /// The failure's stable key.
    pub key: SmolStr,
    /// Display label; reftest pairs render as `"name == name-ref"`.
    pub label: String,
    /// Upstream classification, passed through untouched.
    pub need_investigation: bool,
    /// The row's expansion state.
    pub state: InvestigationState,
    /// One sub-entry per associated job (original run plus retriggers).
    /// Empty while the row is collapsed.
    pub jobs: Vec<JobEvidenceView>,
}

/// Render-ready snapshot of one job sub-row of an expanded failure.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JobEvidenceView {
    /// The job.
    pub job: JobId,
    /// The tab this sub-row is showing.
    pub tab: EvidenceTab,
    /// The job descriptor, as cached.
    pub detail: FetchStatus<Job>,
    /// The selected tab's evidence, as cached.
    pub evidence: FetchStatus<EvidenceView>,
}

/// Evidence shaped for presentation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EvidenceView {
    /// Bug suggestions for the failure lines.
    BugSuggestions(Vec<BugSuggestion>),
    /// Artifact entries with display names.
    Artifacts(Vec<ArtifactView>),
}

impl EvidenceView {
    fn from_value(value: EvidenceValue) -> Self {
        match value {
            EvidenceValue::BugSuggestions(suggestions) => EvidenceView::BugSuggestions(suggestions),
            EvidenceValue::Artifacts(artifacts) => {
                EvidenceView::Artifacts(artifacts.into_iter().map(ArtifactView::new).collect())
            }
            EvidenceValue::JobDetail(_) => {
                unreachable!("evidence tabs never select the job-detail kind")
            }
        }
    }
}

/// One artifact entry, shaped for display.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArtifactView {
    /// The full artifact name as reported by the task queue.
    pub name: String,
    /// The final path segment, for display.
    pub file_name: String,
}

impl ArtifactView {
    fn new(artifact: ArtifactRef) -> Self {
        let file_name = artifact.file_name().to_owned();
        Self {
            name: artifact.name,
            file_name,
        }
    }
}

/// Orchestrates investigation for one platform bucket.
#[derive(Debug)]
pub struct PlatformConfigController<C> {
    key: GroupKey,
    failures: Vec<Failure>,
    rows: IndexMap<SmolStr, RowState>,
    cache: Arc<EvidenceCache<C>>,
    resolver: JobResolver<C>,
}

impl<C: HealthClient> PlatformConfigController<C> {
    /// Creates a controller for the bucket `key` holding `failures`.
    ///
    /// The cache is shared across controllers (and with the grouping layer)
    /// so job details and evidence fetched once are reused everywhere.
    pub fn new(key: GroupKey, failures: Vec<Failure>, cache: Arc<EvidenceCache<C>>) -> Self {
        let resolver = JobResolver::new(Arc::clone(&cache));
        Self {
            key,
            failures,
            rows: IndexMap::new(),
            cache,
            resolver,
        }
    }

    /// The bucket key.
    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    /// The failures in this bucket, in display order.
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    /// Consumes one command, transitioning state and returning the fetch
    /// intents it unlocked.
    ///
    /// Pure state transition: no I/O happens here. Commands referencing
    /// unknown failures or invalid transitions are debug-logged and return
    /// no work; they never disturb sibling rows.
    pub fn handle(&mut self, command: InvestigationCommand) -> Vec<FetchRequest> {
        match command {
            InvestigationCommand::ToggleExpand { failure } => {
                let Some(job_ids) = self.failure_jobs(&failure) else {
                    return Vec::new();
                };
                let row = self.rows.entry(failure).or_default();
                row.state.toggle_expand();
                if row.state.is_expanded() {
                    Self::requests(row, &job_ids)
                } else {
                    row.job_tabs.clear();
                    Vec::new()
                }
            }
            InvestigationCommand::Expand { failure } => {
                let Some(job_ids) = self.failure_jobs(&failure) else {
                    return Vec::new();
                };
                let row = self.rows.entry(failure).or_default();
                row.state.expand();
                Self::requests(row, &job_ids)
            }
            InvestigationCommand::Collapse { failure } => {
                if self.failure_jobs(&failure).is_none() {
                    return Vec::new();
                }
                let row = self.rows.entry(failure).or_default();
                row.state.collapse();
                row.job_tabs.clear();
                Vec::new()
            }
            InvestigationCommand::SelectTab {
                failure,
                job: None,
                tab,
            } => {
                let Some(job_ids) = self.failure_jobs(&failure) else {
                    return Vec::new();
                };
                let row = self.rows.entry(failure.clone()).or_default();
                if !row.state.select_tab(tab) {
                    debug!(%failure, %tab, "tab selected on a collapsed row; ignoring");
                    return Vec::new();
                }
                // A failure-level selection applies to every sub-row.
                row.job_tabs.clear();
                Self::requests(row, &job_ids)
            }
            InvestigationCommand::SelectTab {
                failure,
                job: Some(job),
                tab,
            } => {
                let Some(job_ids) = self.failure_jobs(&failure) else {
                    return Vec::new();
                };
                if !job_ids.contains(&job) {
                    debug!(%failure, %job, "tab selected for a job not on this failure; ignoring");
                    return Vec::new();
                }
                let row = self.rows.entry(failure.clone()).or_default();
                if !row.state.is_expanded() {
                    debug!(%failure, %job, "tab selected on a collapsed row; ignoring");
                    return Vec::new();
                }
                row.job_tabs.insert(job, tab);
                vec![FetchRequest { job, tab }]
            }
        }
    }

    /// Drives one fetch intent to completion.
    ///
    /// Resolves the job detail first, then fetches the tab's evidence. Both
    /// outcomes land in the cache, error or not; a failed detail lookup does
    /// not suppress the evidence fetch, so one bad reference never hides the
    /// rest of the row.
    pub async fn fulfill(&self, request: FetchRequest) {
        if let Err(error) = self.resolver.resolve(request.job).await {
            debug!(%error, "job detail unavailable");
        }
        let _ = self.cache.fetch(request.job, request.tab.kind()).await;
    }

    /// Drives a batch of fetch intents concurrently.
    pub async fn fulfill_all(&self, requests: impl IntoIterator<Item = FetchRequest>) {
        join_all(requests.into_iter().map(|request| self.fulfill(request))).await;
    }

    /// Explicit user-initiated retry for one job sub-row.
    ///
    /// Clears the cached entry for the sub-row's selected tab (and the job
    /// detail, if that errored) and returns the intent to re-issue. This is
    /// the only path that re-fetches a terminal error.
    pub fn retry(&mut self, failure: &str, job: JobId) -> Vec<FetchRequest> {
        let Some(job_ids) = self.failure_jobs(failure) else {
            return Vec::new();
        };
        if !job_ids.contains(&job) {
            debug!(%failure, %job, "retry for a job not on this failure; ignoring");
            return Vec::new();
        }
        let Some(row) = self.rows.get(failure) else {
            debug!(%failure, %job, "retry on a collapsed row; ignoring");
            return Vec::new();
        };
        let Some(default_tab) = row.state.selected_tab() else {
            debug!(%failure, %job, "retry on a collapsed row; ignoring");
            return Vec::new();
        };
        let tab = row.job_tabs.get(&job).copied().unwrap_or(default_tab);
        if self.cache.job_detail_status(job).is_errored() {
            self.cache.invalidate(job, EvidenceKind::JobDetail);
        }
        self.cache.invalidate(job, tab.kind());
        vec![FetchRequest { job, tab }]
    }

    /// Assembles the render-ready snapshot of this bucket.
    pub fn view_model(&self) -> PlatformView {
        PlatformView {
            key: self.key.clone(),
            title: SmolStr::new(self.key.to_string()),
            failures: self
                .failures
                .iter()
                .map(|failure| self.failure_view(failure))
                .collect(),
        }
    }

    fn failure_view(&self, failure: &Failure) -> FailureView {
        let row = self.rows.get(&failure.key);
        let state = row.map(|row| row.state).unwrap_or_default();
        let jobs = match state.selected_tab() {
            None => Vec::new(),
            Some(default_tab) => failure
                .job_ids
                .iter()
                .map(|&job| {
                    let tab = row
                        .and_then(|row| row.job_tabs.get(&job).copied())
                        .unwrap_or(default_tab);
                    JobEvidenceView {
                        job,
                        tab,
                        detail: self.cache.job_detail_status(job),
                        evidence: self
                            .cache
                            .status(job, tab.kind())
                            .map(EvidenceView::from_value),
                    }
                })
                .collect(),
        };
        FailureView {
            key: failure.key.clone(),
            label: helpers::display_label(failure),
            need_investigation: failure.need_investigation,
            state,
            jobs,
        }
    }

    /// The job ids of the named failure, or `None` (logged) if the key is
    /// not in this bucket.
    fn failure_jobs(&self, key: &str) -> Option<Vec<JobId>> {
        let found = self
            .failures
            .iter()
            .find(|failure| failure.key == key)
            .map(|failure| failure.job_ids.clone());
        if found.is_none() {
            debug!(failure = %key, bucket = %self.key, "command for unknown failure; ignoring");
        }
        found
    }

    fn requests(row: &RowState, job_ids: &[JobId]) -> Vec<FetchRequest> {
        let default_tab = row.state.selected_tab().unwrap_or_default();
        job_ids
            .iter()
            .map(|&job| FetchRequest {
                job,
                tab: row.job_tabs.get(&job).copied().unwrap_or(default_tab),
            })
            .collect()
    }
}
