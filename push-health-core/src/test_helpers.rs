// Copyright (c) The push-health Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures and a mock transport for unit tests.

use crate::{client::HealthClient, errors::ClientError, session::Session};
use push_health_metadata::{
    ArtifactRef, BugSuggestion, Failure, Job, JobId, JobResult, JobState, PushRef, SuggestedBugs,
};
use std::{
    collections::HashMap,
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};
use tokio::sync::Notify;

pub(crate) fn session() -> Session {
    Session::new("autoland", "abc")
}

pub(crate) fn job(id: u64, platform: &str) -> Job {
    Job {
        id: JobId(id),
        task_id: format!("task-{id}"),
        run: 0,
        job_type_name: format!("test-{platform}/opt-reftest-3"),
        platform: platform.into(),
        state: JobState::Completed,
        result: JobResult::TestFailed,
        push: PushRef {
            repo: "autoland".into(),
            revision: "abc".into(),
        },
        start_time: None,
        end_time: None,
    }
}

pub(crate) fn failure(key: &str, test_name: &str, job_ids: &[u64]) -> Failure {
    Failure {
        test_name: test_name.to_owned(),
        ref_test_name: None,
        key: key.into(),
        job_ids: job_ids.iter().copied().map(JobId).collect(),
        need_investigation: true,
    }
}

pub(crate) fn suggestion(text: &str) -> BugSuggestion {
    BugSuggestion {
        search: text.to_owned(),
        search_terms: Vec::new(),
        bugs: SuggestedBugs::default(),
    }
}

pub(crate) fn artifact(name: &str) -> ArtifactRef {
    ArtifactRef {
        name: name.to_owned(),
    }
}

/// Counting mock transport. Unknown jobs answer 404; response payloads and
/// failure injection are configured through the builder methods.
#[derive(Debug, Default)]
pub(crate) struct MockClient {
    jobs: HashMap<JobId, Job>,
    suggestions: Vec<BugSuggestion>,
    artifacts: Vec<ArtifactRef>,
    gate: Option<Arc<Notify>>,
    pub(crate) fail_bug_suggestions: AtomicBool,
    pub(crate) job_detail_calls: AtomicUsize,
    pub(crate) bug_suggestion_calls: AtomicUsize,
    pub(crate) artifact_calls: AtomicUsize,
}

impl MockClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_job(mut self, job: Job) -> Self {
        self.jobs.insert(job.id, job);
        self
    }

    pub(crate) fn with_suggestions(mut self, suggestions: Vec<BugSuggestion>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub(crate) fn with_artifacts(mut self, artifacts: Vec<ArtifactRef>) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub(crate) fn with_failing_bug_suggestions(self) -> Self {
        self.fail_bug_suggestions.store(true, Ordering::SeqCst);
        self
    }

    /// Makes every transport call wait until [`open_gate`](Self::open_gate),
    /// so tests can observe in-flight state deterministically.
    pub(crate) fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    pub(crate) fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_waiters();
        }
    }

    async fn wait_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

impl HealthClient for MockClient {
    fn job_detail(&self, job: JobId) -> impl Future<Output = Result<Job, ClientError>> + Send {
        async move {
            self.job_detail_calls.fetch_add(1, Ordering::SeqCst);
            self.wait_gate().await;
            self.jobs.get(&job).cloned().ok_or_else(|| ClientError::Status {
                status: 404,
                message: format!("no job {job}"),
            })
        }
    }

    fn bug_suggestions(
        &self,
        _job: JobId,
    ) -> impl Future<Output = Result<Vec<BugSuggestion>, ClientError>> + Send {
        async move {
            self.bug_suggestion_calls.fetch_add(1, Ordering::SeqCst);
            self.wait_gate().await;
            if self.fail_bug_suggestions.load(Ordering::SeqCst) {
                return Err(ClientError::Status {
                    status: 500,
                    message: "bug suggestions unavailable".to_owned(),
                });
            }
            Ok(self.suggestions.clone())
        }
    }

    fn artifact_list(
        &self,
        _job: JobId,
    ) -> impl Future<Output = Result<Vec<ArtifactRef>, ClientError>> + Send {
        async move {
            self.artifact_calls.fetch_add(1, Ordering::SeqCst);
            self.wait_gate().await;
            Ok(self.artifacts.clone())
        }
    }
}
