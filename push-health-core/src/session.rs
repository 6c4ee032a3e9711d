// Copyright (c) The push-health Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The active repository/revision scope.

use smol_str::SmolStr;
use std::fmt;

/// The repository and revision whose failures and jobs are in play.
///
/// Supplied by the session/URL collaborator and passed into
/// [`EvidenceCache`](crate::evidence::EvidenceCache) construction and reset;
/// never ambient state. A change to either field means a new working set:
/// the cache is reset and controllers are rebuilt.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Session {
    repo: SmolStr,
    revision: SmolStr,
}

impl Session {
    /// Creates a new session scope.
    pub fn new(repo: impl Into<SmolStr>, revision: impl Into<SmolStr>) -> Self {
        Self {
            repo: repo.into(),
            revision: revision.into(),
        }
    }

    /// The repository name, e.g. `autoland`.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// The revision submitted to CI.
    pub fn revision(&self) -> &str {
        &self.revision
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.repo, self.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_tracks_both_fields() {
        let session = Session::new("autoland", "abc");
        assert_eq!(session, Session::new("autoland", "abc"));
        assert_ne!(session, Session::new("autoland", "def"));
        assert_ne!(session, Session::new("try", "abc"));
        assert_eq!(session.to_string(), "autoland@abc");
    }
}
