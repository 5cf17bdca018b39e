//! Polling engine.
//!
//! Classifies the distance between the state recorded after the last build
//! and the current repository state as [`Change::None`] or
//! [`Change::Significant`], with a human-readable log of the comparison for
//! operator diagnosis. "Cannot determine changes" is an error from the
//! caller's fetch, never a `Change` value.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use flowline_scm::{BuildSource, ComponentState, RecordedBuildState, RemoteFlowState};

use crate::config::{BuildSourceConfig, RunnerKind};
use crate::error::Result;

/// Externally visible poll classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Change {
    None,
    Significant,
}

/// Classification plus the comparison reasoning, one line per observation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollOutcome {
    pub change: Change,
    pub reasons: Vec<String>,
}

impl PollOutcome {
    pub fn is_significant(&self) -> bool {
        self.change == Change::Significant
    }

    /// The reasons joined into the operator-facing comparison log.
    pub fn log(&self) -> String {
        self.reasons.join("\n")
    }
}

#[derive(Default)]
struct Comparison {
    reasons: Vec<String>,
    significant: bool,
}

impl Comparison {
    fn note(&mut self, reason: impl Into<String>) {
        self.reasons.push(reason.into());
    }

    fn significant(&mut self, reason: impl Into<String>) {
        self.reasons.push(reason.into());
        self.significant = true;
    }

    fn finish(mut self) -> PollOutcome {
        if self.reasons.is_empty() {
            self.reasons
                .push("no changes since the last build".to_string());
        }
        PollOutcome {
            change: if self.significant {
                Change::Significant
            } else {
                Change::None
            },
            reasons: self.reasons,
        }
    }
}

/// Answer a poll purely from state recorded at build time.
///
/// No server comparison happens here; the caller must not have fetched one.
/// The recorded snapshot is compared against the snapshot identity the
/// pipeline step resolved into `pollingOnlyData`. Absence of either side is
/// "nothing to compare", not an error; a prior snapshot deleted out of band
/// lands on the same path.
pub fn classify_recorded_only(
    config: &BuildSourceConfig,
    runner: RunnerKind,
    recorded: Option<&RecordedBuildState>,
) -> Result<PollOutcome> {
    config.validate_polling_only(runner)?;

    let mut cmp = Comparison::default();

    let Some(recorded) = recorded else {
        cmp.note("no build state recorded yet; nothing to compare");
        return Ok(cmp.finish());
    };
    let Some(data) = &config.polling_only_data else {
        cmp.note("no snapshot resolved for polling-only mode yet; nothing to compare");
        return Ok(cmp.finish());
    };
    let Some(previous) = recorded.snapshot_uuid() else {
        cmp.note("last build recorded no snapshot; nothing to compare");
        return Ok(cmp.finish());
    };

    if previous != data.snapshot_uuid {
        cmp.significant(format!(
            "snapshot advanced from {} to {}",
            previous, data.snapshot_uuid
        ));
    } else if let Some(fingerprint) = &data.fingerprint {
        if *fingerprint != recorded.fingerprint() {
            cmp.significant(format!(
                "component states changed under snapshot {}",
                previous
            ));
        } else {
            cmp.note(format!("snapshot {} unchanged since the last build", previous));
        }
    } else {
        cmp.note(format!("snapshot {} unchanged since the last build", previous));
    }

    Ok(cmp.finish())
}

/// Compare the recorded build state against the current repository state.
///
/// The recorded side being absent (first-ever build, or the prior snapshot
/// was deleted on the server) reports no change; deletion of a comparison
/// target is expected and recoverable. The source the poll must act on being
/// absent is the caller's fetch error and never reaches this function.
pub fn classify_remote(
    config: &BuildSourceConfig,
    runner: RunnerKind,
    recorded: Option<&RecordedBuildState>,
    current: &RemoteFlowState,
) -> Result<PollOutcome> {
    config.validate_polling_only(runner)?;

    let mut cmp = Comparison::default();

    if matches!(config.source, BuildSource::Snapshot { .. }) {
        cmp.note("snapshot sources are immutable; polling never reports changes");
        return Ok(cmp.finish());
    }

    let Some(recorded) = recorded else {
        cmp.note(
            "no previous build state recorded (first build, or the prior snapshot was \
             deleted); nothing to compare",
        );
        return Ok(cmp.finish());
    };

    let drifted = diff_components(&mut cmp, &recorded.components, &current.components);
    if drifted
        && !config.accept_before_load
        && matches!(config.source, BuildSource::Workspace { .. })
    {
        cmp.note(
            "accept-before-load is disabled, so the loaded content can lag the build \
             workspace; workspace drift alone schedules a build",
        );
    }

    let incoming = current.incoming_change_sets.len();
    if incoming > 0 {
        cmp.significant(format!(
            "{} incoming change set(s) on the flow target",
            incoming
        ));
    }

    let outgoing = current.outgoing_change_sets.len();
    if outgoing > 0 {
        if config.ignore_outgoing_while_polling {
            cmp.note(format!(
                "ignoring {} outgoing change set(s) on the build workspace",
                outgoing
            ));
        } else {
            cmp.significant(format!(
                "{} outgoing change set(s) on the build workspace",
                outgoing
            ));
        }
    }

    Ok(cmp.finish())
}

/// Record per-component differences; returns whether any were found.
fn diff_components(
    cmp: &mut Comparison,
    recorded: &[ComponentState],
    current: &[ComponentState],
) -> bool {
    let recorded_by_id: HashMap<&str, &ComponentState> = recorded
        .iter()
        .map(|c| (c.item_id.as_str(), c))
        .collect();
    let current_by_id: HashMap<&str, &ComponentState> =
        current.iter().map(|c| (c.item_id.as_str(), c)).collect();

    let mut drifted = false;

    for component in current {
        match recorded_by_id.get(component.item_id.as_str()) {
            None => {
                cmp.significant(format!(
                    "component \"{}\" added since the last build",
                    component.display_name()
                ));
                drifted = true;
            }
            Some(previous) if previous.state_id != component.state_id => {
                cmp.significant(format!(
                    "component \"{}\" changed since the last build",
                    component.display_name()
                ));
                drifted = true;
            }
            Some(_) => {}
        }
    }

    for component in recorded {
        if !current_by_id.contains_key(component.item_id.as_str()) {
            cmp.significant(format!(
                "component \"{}\" removed since the last build",
                component.display_name()
            ));
            drifted = true;
        }
    }

    drifted
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowline_scm::BaselineSetRef;

    use crate::config::PollingOnlyData;

    fn state(components: &[(&str, &str)]) -> Vec<ComponentState> {
        components
            .iter()
            .map(|(id, state)| ComponentState::new(*id, Some(format!("c-{id}")), *state))
            .collect()
    }

    fn workspace_config() -> BuildSourceConfig {
        BuildSourceConfig::new(BuildSource::Workspace {
            name: "dev".to_string(),
        })
    }

    fn polling_only_config(snapshot_uuid: &str) -> BuildSourceConfig {
        let mut config = BuildSourceConfig::new(BuildSource::Definition {
            id: "daily.build".to_string(),
        });
        config.polling_only = true;
        config.polling_only_data = Some(PollingOnlyData {
            snapshot_uuid: snapshot_uuid.to_string(),
            fingerprint: None,
        });
        config
    }

    fn recorded(snapshot: Option<&str>, components: &[(&str, &str)]) -> RecordedBuildState {
        RecordedBuildState::new(
            snapshot.map(|uuid| BaselineSetRef::new(uuid, "build-snap")),
            state(components),
        )
    }

    // ------------------------------------------------------------------
    // Recorded-only (polling-only mode)
    // ------------------------------------------------------------------

    #[test]
    fn recorded_only_same_snapshot_is_quiet() {
        let config = polling_only_config("_snap1");
        let recorded = recorded(Some("_snap1"), &[("_ca", "s1")]);
        let outcome =
            classify_recorded_only(&config, RunnerKind::Pipeline, Some(&recorded)).unwrap();
        assert_eq!(outcome.change, Change::None);
        assert!(outcome.log().contains("_snap1"));
    }

    #[test]
    fn recorded_only_new_snapshot_is_significant() {
        let config = polling_only_config("_snap2");
        let recorded = recorded(Some("_snap1"), &[("_ca", "s1")]);
        let outcome =
            classify_recorded_only(&config, RunnerKind::Pipeline, Some(&recorded)).unwrap();
        assert_eq!(outcome.change, Change::Significant);
        assert!(outcome.log().contains("advanced from _snap1 to _snap2"));
    }

    #[test]
    fn recorded_only_fingerprint_drift_is_significant() {
        let mut config = polling_only_config("_snap1");
        let recorded = recorded(Some("_snap1"), &[("_ca", "s1")]);
        // A fingerprint taken over different component states.
        let other = RecordedBuildState::new(None, state(&[("_ca", "s2")]));
        if let Some(data) = config.polling_only_data.as_mut() {
            data.fingerprint = Some(other.fingerprint());
        }
        let outcome =
            classify_recorded_only(&config, RunnerKind::Pipeline, Some(&recorded)).unwrap();
        assert_eq!(outcome.change, Change::Significant);
    }

    #[test]
    fn recorded_only_without_history_is_quiet() {
        let config = polling_only_config("_snap1");
        let outcome = classify_recorded_only(&config, RunnerKind::Pipeline, None).unwrap();
        assert_eq!(outcome.change, Change::None);
        assert!(outcome.log().contains("nothing to compare"));
    }

    #[test]
    fn recorded_only_enforces_runner_kind() {
        let config = polling_only_config("_snap1");
        let err = classify_recorded_only(&config, RunnerKind::Freestyle, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Polling-only is available for Pipeline jobs only"
        );
    }

    // ------------------------------------------------------------------
    // Remote comparison
    // ------------------------------------------------------------------

    #[test]
    fn remote_without_history_is_quiet() {
        let current = RemoteFlowState {
            components: state(&[("_ca", "s1")]),
            incoming_change_sets: vec!["_cs1".to_string()],
            outgoing_change_sets: vec![],
        };
        let outcome =
            classify_remote(&workspace_config(), RunnerKind::Freestyle, None, &current).unwrap();
        assert_eq!(outcome.change, Change::None);
        assert!(outcome.log().contains("nothing to compare"));
    }

    #[test]
    fn remote_incoming_changes_are_significant() {
        let recorded = recorded(Some("_snap1"), &[("_ca", "s1")]);
        let current = RemoteFlowState {
            components: state(&[("_ca", "s1")]),
            incoming_change_sets: vec!["_cs1".to_string(), "_cs2".to_string()],
            outgoing_change_sets: vec![],
        };
        let outcome = classify_remote(
            &workspace_config(),
            RunnerKind::Freestyle,
            Some(&recorded),
            &current,
        )
        .unwrap();
        assert_eq!(outcome.change, Change::Significant);
        assert!(outcome.log().contains("2 incoming change set(s)"));
    }

    #[test]
    fn remote_outgoing_changes_respect_the_ignore_switch() {
        let recorded = recorded(Some("_snap1"), &[("_ca", "s1")]);
        let current = RemoteFlowState {
            components: state(&[("_ca", "s1")]),
            incoming_change_sets: vec![],
            outgoing_change_sets: vec!["_cs9".to_string()],
        };

        let config = workspace_config();
        let outcome =
            classify_remote(&config, RunnerKind::Freestyle, Some(&recorded), &current).unwrap();
        assert_eq!(outcome.change, Change::Significant);
        assert!(outcome.log().contains("outgoing change set(s)"));

        let mut ignoring = workspace_config();
        ignoring.ignore_outgoing_while_polling = true;
        let outcome =
            classify_remote(&ignoring, RunnerKind::Freestyle, Some(&recorded), &current).unwrap();
        assert_eq!(outcome.change, Change::None);
        assert!(outcome.log().contains("ignoring 1 outgoing"));
    }

    #[test]
    fn remote_component_drift_is_significant_per_component() {
        let recorded = recorded(Some("_snap1"), &[("_ca", "s1"), ("_cb", "s1")]);
        let current = RemoteFlowState {
            components: state(&[("_ca", "s2"), ("_cc", "s1")]),
            incoming_change_sets: vec![],
            outgoing_change_sets: vec![],
        };
        let outcome = classify_remote(
            &workspace_config(),
            RunnerKind::Freestyle,
            Some(&recorded),
            &current,
        )
        .unwrap();
        assert_eq!(outcome.change, Change::Significant);
        let log = outcome.log();
        assert!(log.contains("\"c-_ca\" changed"));
        assert!(log.contains("\"c-_cc\" added"));
        assert!(log.contains("\"c-_cb\" removed"));
    }

    #[test]
    fn remote_drift_without_accept_notes_the_stale_workspace() {
        let mut config = workspace_config();
        config.accept_before_load = false;
        let recorded = recorded(Some("_snap1"), &[("_ca", "s1")]);
        let current = RemoteFlowState {
            components: state(&[("_ca", "s2")]),
            incoming_change_sets: vec![],
            outgoing_change_sets: vec![],
        };
        let outcome =
            classify_remote(&config, RunnerKind::Freestyle, Some(&recorded), &current).unwrap();
        assert_eq!(outcome.change, Change::Significant);
        assert!(outcome.log().contains("accept-before-load is disabled"));
    }

    #[test]
    fn remote_snapshot_sources_never_report_changes() {
        let config = BuildSourceConfig::new(BuildSource::Snapshot {
            selector: flowline_scm::SnapshotSelector::Uuid {
                uuid: "_snapX".to_string(),
            },
        });
        let current = RemoteFlowState {
            components: state(&[("_ca", "s1")]),
            incoming_change_sets: vec!["_cs1".to_string()],
            outgoing_change_sets: vec![],
        };
        let outcome = classify_remote(&config, RunnerKind::Freestyle, None, &current).unwrap();
        assert_eq!(outcome.change, Change::None);
        assert!(outcome.log().contains("immutable"));
    }

    #[test]
    fn remote_unchanged_state_reports_none_with_a_reason() {
        let recorded = recorded(Some("_snap1"), &[("_ca", "s1")]);
        let current = RemoteFlowState {
            components: state(&[("_ca", "s1")]),
            incoming_change_sets: vec![],
            outgoing_change_sets: vec![],
        };
        let outcome = classify_remote(
            &workspace_config(),
            RunnerKind::Freestyle,
            Some(&recorded),
            &current,
        )
        .unwrap();
        assert_eq!(outcome.change, Change::None);
        assert_eq!(outcome.log(), "no changes since the last build");
    }
}
