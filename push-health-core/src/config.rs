// Copyright (c) The push-health Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Triage configuration.

use serde::Deserialize;
use smol_str::SmolStr;

/// Configuration for failure triage.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TriageConfig {
    /// Tie-break applied when a failure's jobs disagree on platform.
    #[serde(default)]
    pub platform_tie_break: PlatformTieBreak,

    /// Display label for the synthetic bucket holding failures whose jobs
    /// could not be resolved.
    #[serde(default = "default_unresolved_label")]
    pub unresolved_label: SmolStr,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            platform_tie_break: PlatformTieBreak::default(),
            unresolved_label: default_unresolved_label(),
        }
    }
}

fn default_unresolved_label() -> SmolStr {
    SmolStr::new_static("unresolved")
}

/// Which job's platform wins when a failure's jobs disagree.
///
/// The disagreement itself is an upstream anomaly (retriggers of one test
/// land on one platform); it is warn-logged and resolved by this policy
/// rather than treated as an error.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformTieBreak {
    /// Use the platform of the numerically lowest job identifier.
    #[default]
    LowestJobId,
    /// Use the platform of the numerically highest job identifier.
    HighestJobId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn defaults() {
        let config: TriageConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TriageConfig::default());
        assert_eq!(config.platform_tie_break, PlatformTieBreak::LowestJobId);
        assert_eq!(config.unresolved_label, "unresolved");
    }

    #[test_case("lowest-job-id", PlatformTieBreak::LowestJobId)]
    #[test_case("highest-job-id", PlatformTieBreak::HighestJobId)]
    fn tie_break_values(input: &str, expected: PlatformTieBreak) {
        let tie_break: PlatformTieBreak =
            serde_json::from_value(serde_json::Value::String(input.to_owned())).unwrap();
        assert_eq!(tie_break, expected);
    }

    #[test]
    fn full_config() {
        let config: TriageConfig = serde_json::from_str(indoc! {r#"
            {
                "platform-tie-break": "highest-job-id",
                "unresolved-label": "no job data"
            }
        "#})
        .unwrap();
        assert_eq!(config.platform_tie_break, PlatformTieBreak::HighestJobId);
        assert_eq!(config.unresolved_label, "no job data");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let error = serde_json::from_str::<TriageConfig>(r#"{ "platform-tiebreak": "lowest-job-id" }"#)
            .unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }
}
