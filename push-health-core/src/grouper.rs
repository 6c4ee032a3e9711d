// Copyright (c) The push-health Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Partitioning failures into platform buckets.
//!
//! Grouping is a pure function of the failure and job inputs: the same
//! inputs always produce the same partition, platforms ordered by first
//! appearance, failures in input order after retrigger merging.

use crate::config::{PlatformTieBreak, TriageConfig};
use indexmap::{IndexMap, map::Entry};
use itertools::Itertools;
use push_health_metadata::{Failure, Job, JobId};
use smol_str::SmolStr;
use std::{collections::HashMap, fmt};
use tracing::warn;

/// Key of one bucket in the grouped output.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum GroupKey {
    /// A real platform bucket.
    Platform(SmolStr),
    /// Failures none of whose job references resolved against the supplied
    /// job list. Surfaced rather than dropped so investigators are not
    /// silently missing data.
    Unresolved,
}

impl GroupKey {
    /// The platform name, if this is a platform bucket.
    pub fn platform(&self) -> Option<&str> {
        match self {
            GroupKey::Platform(platform) => Some(platform),
            GroupKey::Unresolved => None,
        }
    }

    /// Returns true for the synthetic unresolved bucket.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, GroupKey::Unresolved)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Platform(platform) => f.write_str(platform),
            GroupKey::Unresolved => f.write_str("unresolved"),
        }
    }
}

/// The grouped, retrigger-merged failure set.
///
/// A partition of the key-deduplicated input: every failure lands in exactly
/// one bucket.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GroupedFailures {
    groups: IndexMap<GroupKey, Vec<Failure>>,
}

impl GroupedFailures {
    /// Number of buckets, the unresolved one included.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true if no failures were grouped.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of merged failures across all buckets.
    pub fn failure_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// The failures in one bucket.
    pub fn get(&self, key: &GroupKey) -> Option<&[Failure]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// The failures with no resolvable job, if any.
    pub fn unresolved(&self) -> Option<&[Failure]> {
        self.get(&GroupKey::Unresolved)
    }

    /// Buckets in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &[Failure])> {
        self.groups.iter().map(|(key, failures)| (key, failures.as_slice()))
    }

    /// Bucket keys in first-appearance order.
    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.groups.keys()
    }
}

impl IntoIterator for GroupedFailures {
    type Item = (GroupKey, Vec<Failure>);
    type IntoIter = indexmap::map::IntoIter<GroupKey, Vec<Failure>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Partitions a flat failure list into platform buckets.
#[derive(Clone, Debug, Default)]
pub struct FailureGrouper {
    config: TriageConfig,
}

impl FailureGrouper {
    /// Creates a grouper with the given configuration.
    pub fn new(config: TriageConfig) -> Self {
        Self { config }
    }

    /// Display label for a bucket, honoring the configured unresolved label.
    pub fn bucket_label(&self, key: &GroupKey) -> SmolStr {
        match key {
            GroupKey::Platform(platform) => platform.clone(),
            GroupKey::Unresolved => self.config.unresolved_label.clone(),
        }
    }

    /// Groups `failures` into platform buckets, resolving platforms against
    /// `jobs`.
    ///
    /// Failure records sharing a stable key are merged first (a retrigger of
    /// the same test on the same push is one logical failure with the union
    /// of the job ids), then each merged failure is bucketed by the platform
    /// of its jobs. Deterministic: identical inputs yield an identical
    /// partition, order included.
    pub fn group(&self, failures: &[Failure], jobs: &[Job]) -> GroupedFailures {
        let job_index: HashMap<JobId, &Job> = jobs.iter().map(|job| (job.id, job)).collect();

        // Reconcile retriggers before platform resolution, preserving the
        // input order of first appearance.
        let mut merged: IndexMap<SmolStr, Failure> = IndexMap::new();
        for failure in failures {
            match merged.entry(failure.key.clone()) {
                Entry::Occupied(mut entry) => {
                    let existing = entry.get_mut();
                    for &job_id in &failure.job_ids {
                        if !existing.job_ids.contains(&job_id) {
                            existing.job_ids.push(job_id);
                        }
                    }
                }
                Entry::Vacant(entry) => {
                    let mut failure = failure.clone();
                    let mut seen = Vec::with_capacity(failure.job_ids.len());
                    failure.job_ids.retain(|job_id| {
                        let fresh = !seen.contains(job_id);
                        seen.push(*job_id);
                        fresh
                    });
                    entry.insert(failure);
                }
            }
        }

        let mut groups: IndexMap<GroupKey, Vec<Failure>> = IndexMap::new();
        for (_, failure) in merged {
            let key = self.resolve_bucket(&failure, &job_index);
            groups.entry(key).or_default().push(failure);
        }
        GroupedFailures { groups }
    }

    fn resolve_bucket(&self, failure: &Failure, job_index: &HashMap<JobId, &Job>) -> GroupKey {
        let mut resolved: Vec<&Job> = failure
            .job_ids
            .iter()
            .filter_map(|job_id| job_index.get(job_id).copied())
            .collect();
        if resolved.is_empty() {
            return GroupKey::Unresolved;
        }
        resolved.sort_by_key(|job| job.id);

        let chosen = match self.config.platform_tie_break {
            PlatformTieBreak::LowestJobId => resolved[0],
            PlatformTieBreak::HighestJobId => resolved[resolved.len() - 1],
        };
        if resolved.iter().any(|job| job.platform != chosen.platform) {
            warn!(
                failure = %failure.key,
                jobs = %resolved.iter().map(|job| job.id).join(", "),
                platform = %chosen.platform,
                "failure references jobs on conflicting platforms; applying tie-break",
            );
        }
        GroupKey::Platform(chosen.platform.clone())
    }
}
