// Copyright (c) The push-health Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// Identifier for a single CI job run.
///
/// Job identifiers are opaque to this crate: they are only compared, ordered
/// and used as cache keys. The numeric ordering is what the grouper's
/// tie-break policies refer to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The scheduling state of a job.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// The job is queued but has not started.
    Pending,
    /// The job is currently executing.
    Running,
    /// The job has finished; its [`JobResult`] is final.
    Completed,
    /// A state this crate doesn't know about.
    #[serde(other)]
    Unrecognized,
}

impl JobState {
    /// Returns true if the job has finished executing.
    pub fn is_final(self) -> bool {
        matches!(self, JobState::Completed)
    }
}

/// The outcome of a job.
///
/// Only meaningful once the job's state is [`JobState::Completed`]; running
/// jobs report [`JobResult::Unknown`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobResult {
    /// The job passed.
    Success,
    /// One or more tests failed.
    TestFailed,
    /// The job itself broke (e.g. a build or harness error).
    Busted,
    /// Infrastructure exception.
    Exception,
    /// The job was superseded by a retry.
    Retry,
    /// The job was cancelled by a user.
    UserCancel,
    /// The job has not produced a result yet.
    Unknown,
    /// A result this crate doesn't know about.
    #[serde(other)]
    Unrecognized,
}

impl JobResult {
    /// Returns true if this result indicates test-level failure.
    pub fn is_test_failure(self) -> bool {
        matches!(self, JobResult::TestFailed)
    }
}

/// The push (repository + revision) a job ran against.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PushRef {
    /// Repository name, e.g. `autoland`.
    pub repo: SmolStr,
    /// The revision submitted to CI.
    pub revision: SmolStr,
}

/// One CI task execution against a push.
///
/// Fetched read-only from the transport and cached by [`JobId`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// The job identifier.
    pub id: JobId,
    /// The task identifier in the underlying task queue.
    pub task_id: String,
    /// The run number within the task (0 for the first run, incremented by
    /// retriggers of the same task).
    pub run: u32,
    /// Human-readable job type, e.g. `test-linux1804-64-qr/opt-reftest-3`.
    #[serde(default)]
    pub job_type_name: String,
    /// The execution platform tag used for bucketing, e.g. `linux1804-64-qr`.
    pub platform: SmolStr,
    /// The scheduling state.
    pub state: JobState,
    /// The outcome.
    pub result: JobResult,
    /// The push this job belongs to.
    pub push: PushRef,
    /// When the job started executing, if it has.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// When the job finished executing, if it has.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

/// One test-level failure signal observed on a push.
///
/// A failure may reference several jobs: the original run plus any
/// retriggers. All referenced jobs share the same test identity; the `key`
/// is stable per distinguishable failure within a push and is what retrigger
/// reconciliation merges on.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    /// Full test name, e.g.
    /// `layout/reftests/high-contrast/backplate-bg-image-006.html`.
    pub test_name: String,
    /// For equality-comparison (reftest) pairs, the companion reference test
    /// name. Drives the `"name == name-ref"` display form.
    #[serde(default)]
    pub ref_test_name: Option<String>,
    /// Stable key identifying this failure within its push.
    pub key: SmolStr,
    /// The jobs this failure was observed in.
    pub job_ids: Vec<JobId>,
    /// Classification supplied upstream: true if the failure still needs
    /// investigation, false if it's already accounted for (e.g. matched to a
    /// known intermittent). Consumed, never mutated, by the core.
    pub need_investigation: bool,
}

/// A bug-suggestion record for one failure line.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BugSuggestion {
    /// The failure line text the suggestion was searched for.
    pub search: String,
    /// The individual terms extracted from `search`.
    #[serde(default)]
    pub search_terms: Vec<String>,
    /// Matching bugs.
    #[serde(default)]
    pub bugs: SuggestedBugs,
}

/// Bug matches for a suggestion, bucketed by recency.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SuggestedBugs {
    /// Open bugs with recent activity.
    #[serde(default)]
    pub open_recent: Vec<SuggestedBug>,
    /// Everything else that matched.
    #[serde(default)]
    pub all_others: Vec<SuggestedBug>,
}

/// One bug matched against a failure line.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SuggestedBug {
    /// Bug number in the tracker.
    pub id: u64,
    /// Bug summary line.
    pub summary: String,
    /// Resolution if the bug is closed (`FIXED`, `WORKSFORME`, ...), absent
    /// or empty for open bugs.
    #[serde(default)]
    pub resolution: Option<String>,
}

/// Reference to one artifact produced by a task run.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// The artifact name as reported by the task queue. Often a full URL or
    /// a slash-separated path.
    pub name: String,
}

impl ArtifactRef {
    /// The final path segment of the artifact name, for display.
    ///
    /// `"http://baz.com/thing.log"` and `"public/logs/thing.log"` both
    /// display as `"thing.log"`. A name with no slashes displays as itself.
    pub fn file_name(&self) -> &str {
        self.name
            .rsplit_once('/')
            .map_or(self.name.as_str(), |(_, file)| file)
    }
}
