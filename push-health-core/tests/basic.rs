// Copyright (c) The push-health Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Basic tests for the push-health triage flow: raw failure and job records
//! in, grouped buckets and lazily-investigated view models out.

use maplit::hashmap;
use pretty_assertions::assert_eq;
use push_health_core::{
    client::HealthClient,
    config::TriageConfig,
    controller::{EvidenceView, FetchRequest, PlatformConfigController},
    errors::ClientError,
    evidence::{EvidenceCache, EvidenceKind},
    grouper::{FailureGrouper, GroupKey},
    investigation::{EvidenceTab, InvestigationCommand, InvestigationState},
    session::Session,
};
use push_health_metadata::{
    ArtifactRef, BugSuggestion, Failure, Job, JobId, JobResult, JobState, PushRef, SuggestedBug,
    SuggestedBugs,
};
use std::{
    collections::HashMap,
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

const REFTEST: &str = "layout/reftests/high-contrast/backplate-bg-image-006.html";
const REFTEST_REF: &str = "layout/reftests/high-contrast/backplate-bg-image-006-ref.html";

fn job(id: u64, platform: &str) -> Job {
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

fn failure(key: &str, test_name: &str, job_ids: &[u64]) -> Failure {
    Failure {
        test_name: test_name.to_owned(),
        ref_test_name: None,
        key: key.into(),
        job_ids: job_ids.iter().copied().map(JobId).collect(),
        need_investigation: true,
    }
}

fn page_title_suggestion() -> BugSuggestion {
    BugSuggestion {
        search: "TEST-UNEXPECTED-FAIL | There must be some page title".to_owned(),
        search_terms: vec!["There must be some page title".to_owned()],
        bugs: SuggestedBugs {
            open_recent: vec![SuggestedBug {
                id: 1_733_624,
                summary: "Intermittent failure asserting the page title".to_owned(),
                resolution: None,
            }],
            all_others: Vec::new(),
        },
    }
}

/// Transport serving a fixed data set, counting calls per endpoint.
#[derive(Default)]
struct StaticClient {
    jobs: HashMap<JobId, Job>,
    suggestions: HashMap<JobId, Vec<BugSuggestion>>,
    artifacts: HashMap<JobId, Vec<ArtifactRef>>,
    job_detail_calls: AtomicUsize,
    bug_suggestion_calls: AtomicUsize,
    artifact_calls: AtomicUsize,
}

impl HealthClient for StaticClient {
    fn job_detail(&self, job: JobId) -> impl Future<Output = Result<Job, ClientError>> + Send {
        async move {
            self.job_detail_calls.fetch_add(1, Ordering::SeqCst);
            self.jobs.get(&job).cloned().ok_or_else(|| ClientError::Status {
                status: 404,
                message: format!("no job {job}"),
            })
        }
    }

    fn bug_suggestions(
        &self,
        job: JobId,
    ) -> impl Future<Output = Result<Vec<BugSuggestion>, ClientError>> + Send {
        async move {
            self.bug_suggestion_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.suggestions.get(&job).cloned().unwrap_or_default())
        }
    }

    fn artifact_list(
        &self,
        job: JobId,
    ) -> impl Future<Output = Result<Vec<ArtifactRef>, ClientError>> + Send {
        async move {
            self.artifact_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.artifacts.get(&job).cloned().unwrap_or_default())
        }
    }
}

fn push_fixture() -> (Vec<Failure>, Vec<Job>, Arc<StaticClient>) {
    let jobs = vec![
        job(285857770, "linux1804-64-qr"),
        job(285852303, "linux1804-64-qr"),
        job(303550431, "windows10-64"),
    ];
    let mut reftest_first = failure("wazzon", REFTEST, &[285857770]);
    reftest_first.ref_test_name = Some(REFTEST_REF.to_owned());
    let mut reftest_retrigger = failure("wazzon", REFTEST, &[285852303]);
    reftest_retrigger.ref_test_name = Some(REFTEST_REF.to_owned());
    let failures = vec![
        reftest_first,
        failure("titled", "browser/base/content/test_page_title.js", &[303550431]),
        reftest_retrigger,
        failure("dangling", "dom/tests/orphan_test.js", &[999]),
    ];

    let client = Arc::new(StaticClient {
        jobs: jobs.iter().map(|job| (job.id, job.clone())).collect(),
        suggestions: hashmap! {
            JobId(303550431) => vec![page_title_suggestion()],
        },
        artifacts: hashmap! {
            JobId(303550431) => vec![ArtifactRef {
                name: "http://baz.com/thing.log".to_owned(),
            }],
        },
        ..StaticClient::default()
    });
    (failures, jobs, client)
}

#[test]
fn grouping_buckets_by_platform_and_reconciles_retriggers() {
    let (failures, jobs, _client) = push_fixture();
    let grouper = FailureGrouper::new(TriageConfig::default());

    let grouped = grouper.group(&failures, &jobs);

    let keys: Vec<_> = grouped.keys().cloned().collect();
    assert_eq!(
        keys,
        vec![
            GroupKey::Platform("linux1804-64-qr".into()),
            GroupKey::Platform("windows10-64".into()),
            GroupKey::Unresolved,
        ],
    );

    // The retriggered reftest is one row with both jobs attached.
    let linux = grouped.get(&keys[0]).unwrap();
    assert_eq!(linux.len(), 1);
    assert_eq!(
        linux[0].job_ids,
        vec![JobId(285857770), JobId(285852303)],
    );

    // The failure with no resolvable job is surfaced, not dropped.
    let unresolved = grouped.unresolved().unwrap();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].key, "dangling");
}

#[tokio::test]
async fn drill_down_from_grouped_failure_to_evidence() {
    let (failures, jobs, client) = push_fixture();
    let grouper = FailureGrouper::new(TriageConfig::default());
    let grouped = grouper.group(&failures, &jobs);
    let cache = Arc::new(EvidenceCache::new(
        Arc::clone(&client),
        Session::new("autoland", "abc"),
    ));

    let mut controllers: Vec<_> = grouped
        .into_iter()
        .map(|(key, bucket)| PlatformConfigController::new(key, bucket, Arc::clone(&cache)))
        .collect();
    let windows = &mut controllers[1];

    // Freshly loaded: collapsed, nothing fetched.
    let view = windows.view_model();
    assert_eq!(view.failures[0].state, InvestigationState::Collapsed);
    assert_eq!(client.job_detail_calls.load(Ordering::SeqCst), 0);

    // Expand lands on bug suggestions and triggers the lazy fetches.
    let requests = windows.handle(InvestigationCommand::Expand {
        failure: "titled".into(),
    });
    windows.fulfill_all(requests).await;

    let view = windows.view_model();
    let row = &view.failures[0].jobs[0];
    assert_eq!(row.detail.ready().map(|detail| detail.id), Some(JobId(303550431)));
    match row.evidence.ready() {
        Some(EvidenceView::BugSuggestions(suggestions)) => {
            assert!(suggestions[0].search.contains("There must be some page title"));
            assert_eq!(suggestions[0].bugs.open_recent[0].id, 1_733_624);
        }
        other => panic!("expected ready bug suggestions, got {other:?}"),
    }

    // Artifacts tab: display name is the final path segment.
    let requests = windows.handle(InvestigationCommand::SelectTab {
        failure: "titled".into(),
        job: None,
        tab: EvidenceTab::Artifacts,
    });
    windows.fulfill_all(requests).await;

    let view = windows.view_model();
    match view.failures[0].jobs[0].evidence.ready() {
        Some(EvidenceView::Artifacts(artifacts)) => {
            assert_eq!(artifacts[0].file_name, "thing.log");
        }
        other => panic!("expected ready artifacts, got {other:?}"),
    }

    // Back to bug suggestions: served from cache, no new transport calls.
    let requests = windows.handle(InvestigationCommand::SelectTab {
        failure: "titled".into(),
        job: None,
        tab: EvidenceTab::BugSuggestions,
    });
    windows.fulfill_all(requests).await;
    assert_eq!(client.bug_suggestion_calls.load(Ordering::SeqCst), 1);
    assert_eq!(client.artifact_calls.load(Ordering::SeqCst), 1);
    assert_eq!(client.job_detail_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn new_push_resets_the_evidence_cache() {
    let (_failures, _jobs, client) = push_fixture();
    let cache = Arc::new(EvidenceCache::new(
        Arc::clone(&client),
        Session::new("autoland", "abc"),
    ));
    let controller = PlatformConfigController::new(
        GroupKey::Platform("windows10-64".into()),
        vec![failure("titled", "browser/base/content/test_page_title.js", &[303550431])],
        Arc::clone(&cache),
    );

    controller
        .fulfill_all(vec![FetchRequest {
            job: JobId(303550431),
            tab: EvidenceTab::BugSuggestions,
        }])
        .await;
    assert_eq!(client.bug_suggestion_calls.load(Ordering::SeqCst), 1);

    // The session collaborator reports a new revision: the working set is
    // rebuilt and the cache starts cold.
    assert!(cache.reset_if_changed(&Session::new("autoland", "def")));
    assert!(
        cache
            .status(JobId(303550431), EvidenceKind::BugSuggestions)
            .is_pending()
    );
}
