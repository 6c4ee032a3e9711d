// Copyright (c) The push-health Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-job memoized evidence store.
//!
//! The cache is the single shared mutable resource in the core. Each
//! (job, kind) pair owns one slot; a slot is fetched at most once for the
//! lifetime of a loaded push, concurrent requests for the same slot coalesce
//! onto a single transport call, and failed fetches are cached terminal.
//! Slots are cleared only by an explicit per-entry retry
//! ([`EvidenceCache::invalidate`]) or a session change
//! ([`EvidenceCache::reset`]).

use crate::{
    client::HealthClient,
    errors::{ClientError, FetchError},
    session::Session,
};
use push_health_metadata::{ArtifactRef, BugSuggestion, Job, JobId};
use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// The kind of evidence stored against a job.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum EvidenceKind {
    /// The full job descriptor.
    JobDetail,
    /// Bug suggestions computed for the job's failure lines.
    BugSuggestions,
    /// The artifact listing of the job's task run.
    Artifacts,
}

impl fmt::Display for EvidenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EvidenceKind::JobDetail => "job-detail",
            EvidenceKind::BugSuggestions => "bug-suggestions",
            EvidenceKind::Artifacts => "artifacts",
        };
        f.write_str(s)
    }
}

/// A fetched evidence payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EvidenceValue {
    /// A job descriptor.
    JobDetail(Job),
    /// Bug suggestions.
    BugSuggestions(Vec<BugSuggestion>),
    /// An artifact listing. May legitimately be empty, which is distinct
    /// from an errored fetch.
    Artifacts(Vec<ArtifactRef>),
}

impl EvidenceValue {
    /// The kind of this payload.
    pub fn kind(&self) -> EvidenceKind {
        match self {
            EvidenceValue::JobDetail(_) => EvidenceKind::JobDetail,
            EvidenceValue::BugSuggestions(_) => EvidenceKind::BugSuggestions,
            EvidenceValue::Artifacts(_) => EvidenceKind::Artifacts,
        }
    }
}

/// The terminal outcome cached for a slot.
pub type EvidenceResult = Result<EvidenceValue, FetchError>;

/// Snapshot of a cache slot, for presentation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FetchStatus<T> {
    /// Not requested yet, or a fetch is in flight.
    Pending,
    /// The fetch completed.
    Ready(T),
    /// The fetch failed; the error is terminal until an explicit retry.
    Errored(FetchError),
}

impl<T> FetchStatus<T> {
    /// Returns true if no terminal outcome is available yet.
    pub fn is_pending(&self) -> bool {
        matches!(self, FetchStatus::Pending)
    }

    /// Returns true if the fetch completed.
    pub fn is_ready(&self) -> bool {
        matches!(self, FetchStatus::Ready(_))
    }

    /// Returns true if the fetch failed terminally.
    pub fn is_errored(&self) -> bool {
        matches!(self, FetchStatus::Errored(_))
    }

    /// The ready value, if any.
    pub fn ready(&self) -> Option<&T> {
        match self {
            FetchStatus::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// The terminal error, if any.
    pub fn errored(&self) -> Option<&FetchError> {
        match self {
            FetchStatus::Errored(error) => Some(error),
            _ => None,
        }
    }

    /// Maps the ready value, preserving pending/errored states.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchStatus<U> {
        match self {
            FetchStatus::Pending => FetchStatus::Pending,
            FetchStatus::Ready(value) => FetchStatus::Ready(f(value)),
            FetchStatus::Errored(error) => FetchStatus::Errored(error),
        }
    }
}

type SlotKey = (JobId, EvidenceKind);
type Slot = Arc<OnceCell<EvidenceResult>>;

/// Per-job memoized store for evidence fetches.
///
/// Scoped to a [`Session`]: entries live until the session changes or an
/// explicit per-entry retry clears them. Keys are independent; coalescing is
/// per-slot with no cross-failure locking.
#[derive(Debug)]
pub struct EvidenceCache<C> {
    client: C,
    session: Mutex<Session>,
    slots: Mutex<HashMap<SlotKey, Slot>>,
}

impl<C: HealthClient> EvidenceCache<C> {
    /// Creates a cache scoped to `session`, fetching through `client`.
    pub fn new(client: C, session: Session) -> Self {
        Self {
            client,
            session: Mutex::new(session),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// The session the cached entries belong to.
    pub fn session(&self) -> Session {
        self.session_lock().clone()
    }

    /// Fetches the evidence for `(job, kind)`, at most once per slot.
    ///
    /// Concurrent callers of the same slot coalesce onto a single transport
    /// call and all observe the same terminal outcome. A failed fetch is
    /// cached as that outcome and is not retried here; see
    /// [`invalidate`](Self::invalidate).
    pub async fn fetch(&self, job: JobId, kind: EvidenceKind) -> EvidenceResult {
        let slot = self.slot(job, kind);
        slot.get_or_init(|| async move {
            match self.call(job, kind).await {
                Ok(value) => Ok(value),
                Err(error) => {
                    warn!(%job, %kind, %error, "evidence fetch failed; caching terminal error");
                    Err(FetchError::new(job, kind, error))
                }
            }
        })
        .await
        .clone()
    }

    /// Synchronous snapshot of a slot's state.
    ///
    /// An untouched slot and an in-flight fetch both report
    /// [`FetchStatus::Pending`]; presentation shows a loading indicator for
    /// either.
    pub fn status(&self, job: JobId, kind: EvidenceKind) -> FetchStatus<EvidenceValue> {
        match self.slots_lock().get(&(job, kind)).and_then(|slot| slot.get()) {
            None => FetchStatus::Pending,
            Some(Ok(value)) => FetchStatus::Ready(value.clone()),
            Some(Err(error)) => FetchStatus::Errored(error.clone()),
        }
    }

    /// Snapshot of a job's detail slot, typed.
    pub fn job_detail_status(&self, job: JobId) -> FetchStatus<Job> {
        self.status(job, EvidenceKind::JobDetail).map(|value| match value {
            EvidenceValue::JobDetail(detail) => detail,
            _ => unreachable!("job-detail slot always holds a job detail"),
        })
    }

    pub(crate) async fn fetch_job_detail(&self, job: JobId) -> Result<Job, FetchError> {
        match self.fetch(job, EvidenceKind::JobDetail).await {
            Ok(EvidenceValue::JobDetail(detail)) => Ok(detail),
            Ok(_) => unreachable!("job-detail slot always holds a job detail"),
            Err(error) => Err(error),
        }
    }

    /// Clears one slot so a user-initiated retry can re-fetch it.
    ///
    /// An in-flight fetch for the old slot still runs to completion, but its
    /// outcome is no longer visible; the next [`fetch`](Self::fetch) issues a
    /// fresh transport call.
    pub fn invalidate(&self, job: JobId, kind: EvidenceKind) {
        if self.slots_lock().remove(&(job, kind)).is_some() {
            debug!(%job, %kind, "cleared evidence slot for retry");
        }
    }

    /// Drops every entry and adopts a new session scope.
    pub fn reset(&self, session: Session) {
        self.slots_lock().clear();
        let mut current = self.session_lock();
        debug!(old = %current, new = %session, "evidence cache reset");
        *current = session;
    }

    /// Resets only if `session` differs from the current scope. Returns true
    /// if a reset happened.
    pub fn reset_if_changed(&self, session: &Session) -> bool {
        let changed = *self.session_lock() != *session;
        if changed {
            self.reset(session.clone());
        }
        changed
    }

    async fn call(&self, job: JobId, kind: EvidenceKind) -> Result<EvidenceValue, ClientError> {
        debug!(%job, %kind, "issuing transport fetch");
        match kind {
            EvidenceKind::JobDetail => {
                self.client.job_detail(job).await.map(EvidenceValue::JobDetail)
            }
            EvidenceKind::BugSuggestions => self
                .client
                .bug_suggestions(job)
                .await
                .map(EvidenceValue::BugSuggestions),
            EvidenceKind::Artifacts => {
                self.client.artifact_list(job).await.map(EvidenceValue::Artifacts)
            }
        }
    }

    fn slot(&self, job: JobId, kind: EvidenceKind) -> Slot {
        self.slots_lock().entry((job, kind)).or_default().clone()
    }

    fn slots_lock(&self) -> MutexGuard<'_, HashMap<SlotKey, Slot>> {
        self.slots.lock().expect("evidence slot lock poisoned")
    }

    fn session_lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().expect("evidence session lock poisoned")
    }
}
