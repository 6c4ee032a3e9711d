// Copyright (c) The push-health Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-failure expansion state.
//!
//! Transitions only change presentation intent; no transition performs I/O.
//! The controller observes the transitions and decides what to fetch.

use crate::errors::EvidenceTabParseError;
use crate::evidence::EvidenceKind;
use push_health_metadata::JobId;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::{fmt, str::FromStr};

/// Evidence tab selectable on an expanded row.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvidenceTab {
    /// Bug suggestions for the failure lines. The default tab on first
    /// expansion.
    #[default]
    BugSuggestions,
    /// The task run's artifact listing.
    Artifacts,
}

impl EvidenceTab {
    /// String representations of all known tabs.
    pub fn variants() -> &'static [&'static str] {
        &["bug-suggestions", "artifacts"]
    }

    /// The evidence kind this tab displays.
    pub fn kind(self) -> EvidenceKind {
        match self {
            EvidenceTab::BugSuggestions => EvidenceKind::BugSuggestions,
            EvidenceTab::Artifacts => EvidenceKind::Artifacts,
        }
    }
}

impl fmt::Display for EvidenceTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EvidenceTab::BugSuggestions => "bug-suggestions",
            EvidenceTab::Artifacts => "artifacts",
        };
        f.write_str(s)
    }
}

impl FromStr for EvidenceTab {
    type Err = EvidenceTabParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bug-suggestions" => Ok(EvidenceTab::BugSuggestions),
            "artifacts" => Ok(EvidenceTab::Artifacts),
            other => Err(EvidenceTabParseError::new(other)),
        }
    }
}

/// Expansion state of one row.
///
/// Created lazily when a failure is first touched and destroyed with its
/// controller when a new push is loaded.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum InvestigationState {
    /// The row is closed. Initial state.
    #[default]
    Collapsed,
    /// The row is open with `tab` selected.
    Expanded {
        /// The selected evidence tab.
        tab: EvidenceTab,
    },
}

impl InvestigationState {
    /// Flips between collapsed and expanded. Expansion lands on the default
    /// tab.
    pub fn toggle_expand(&mut self) {
        *self = match self {
            InvestigationState::Collapsed => InvestigationState::Expanded {
                tab: EvidenceTab::default(),
            },
            InvestigationState::Expanded { .. } => InvestigationState::Collapsed,
        };
    }

    /// Expands the row if collapsed; keeps the current tab otherwise.
    pub fn expand(&mut self) {
        if matches!(self, InvestigationState::Collapsed) {
            *self = InvestigationState::Expanded {
                tab: EvidenceTab::default(),
            };
        }
    }

    /// Collapses the row.
    pub fn collapse(&mut self) {
        *self = InvestigationState::Collapsed;
    }

    /// Selects `tab`. Valid only while expanded: returns false and leaves
    /// the state untouched when collapsed.
    pub fn select_tab(&mut self, tab: EvidenceTab) -> bool {
        match self {
            InvestigationState::Collapsed => false,
            InvestigationState::Expanded { tab: current } => {
                *current = tab;
                true
            }
        }
    }

    /// Returns true if the row is open.
    pub fn is_expanded(&self) -> bool {
        matches!(self, InvestigationState::Expanded { .. })
    }

    /// The selected tab, if the row is open.
    pub fn selected_tab(&self) -> Option<EvidenceTab> {
        match self {
            InvestigationState::Collapsed => None,
            InvestigationState::Expanded { tab } => Some(*tab),
        }
    }
}

/// Command messages consumed by
/// [`PlatformConfigController`](crate::controller::PlatformConfigController).
///
/// Presentation emits these on user interaction; it never mutates core state
/// directly. `failure` is the failure's stable key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InvestigationCommand {
    /// Toggle a failure row open or closed.
    ToggleExpand {
        /// The failure's stable key.
        failure: SmolStr,
    },
    /// Open a failure row (idempotent).
    Expand {
        /// The failure's stable key.
        failure: SmolStr,
    },
    /// Close a failure row. Cached evidence is retained.
    Collapse {
        /// The failure's stable key.
        failure: SmolStr,
    },
    /// Select an evidence tab.
    SelectTab {
        /// The failure's stable key.
        failure: SmolStr,
        /// `None` selects the tab for the whole failure row; `Some` selects
        /// it for one job sub-row only, independent of its siblings.
        job: Option<JobId>,
        /// The tab to select.
        tab: EvidenceTab,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn toggle_expand_lands_on_bug_suggestions() {
        let mut state = InvestigationState::default();
        assert_eq!(state, InvestigationState::Collapsed);

        state.toggle_expand();
        assert_eq!(
            state,
            InvestigationState::Expanded {
                tab: EvidenceTab::BugSuggestions,
            },
        );

        state.toggle_expand();
        assert_eq!(state, InvestigationState::Collapsed);
    }

    #[test]
    fn expand_is_idempotent_and_keeps_the_tab() {
        let mut state = InvestigationState::default();
        state.expand();
        assert!(state.select_tab(EvidenceTab::Artifacts));

        state.expand();
        assert_eq!(state.selected_tab(), Some(EvidenceTab::Artifacts));
    }

    #[test]
    fn select_tab_requires_expansion() {
        let mut state = InvestigationState::default();
        assert!(!state.select_tab(EvidenceTab::Artifacts));
        assert_eq!(state, InvestigationState::Collapsed);
    }

    #[test]
    fn collapse_forgets_the_tab() {
        let mut state = InvestigationState::default();
        state.expand();
        state.select_tab(EvidenceTab::Artifacts);
        state.collapse();
        state.expand();
        assert_eq!(state.selected_tab(), Some(EvidenceTab::BugSuggestions));
    }

    #[test_case("bug-suggestions", EvidenceTab::BugSuggestions)]
    #[test_case("artifacts", EvidenceTab::Artifacts)]
    fn tab_from_str(input: &str, expected: EvidenceTab) {
        assert_eq!(input.parse::<EvidenceTab>().unwrap(), expected);
    }

    #[test]
    fn tab_parse_error_lists_variants() {
        let error = "logs".parse::<EvidenceTab>().unwrap_err();
        assert!(error.to_string().contains("bug-suggestions, artifacts"));
    }
}
