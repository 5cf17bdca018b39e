//! Flow-state records exchanged across the client boundary.
//!
//! `RemoteFlowState` is what the server reports right now; `RecordedBuildState`
//! is the self-contained baseline the host persists after a successful build
//! (snapshot identity plus component states), so the next poll can compare
//! without re-reading the old snapshot from the server. `LoadPlan` is the
//! contract the load decision engine hands to `ScmClient::load`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::component::{state_fingerprint, ComponentRef, ComponentState};

/// Identity of a baseline set (snapshot) on the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BaselineSetRef {
    pub item_id: String,
    pub name: String,
}

impl BaselineSetRef {
    pub fn new(item_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            name: name.into(),
        }
    }
}

/// The current server-side state of a build source, as fetched for one
/// comparison. No history — a fresh value per poll.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteFlowState {
    /// Component states of the workspace/stream being built.
    pub components: Vec<ComponentState>,

    /// Change-set item ids incoming from the flow target and not yet
    /// accepted into the build workspace.
    pub incoming_change_sets: Vec<String>,

    /// Change-set item ids present on the build workspace but not delivered
    /// to the flow target.
    pub outgoing_change_sets: Vec<String>,
}

impl RemoteFlowState {
    /// Fingerprint of the reported component states.
    pub fn fingerprint(&self) -> String {
        state_fingerprint(&self.components)
    }
}

/// Baseline recorded by the host after the last successful build.
///
/// Self-contained on purpose: the component states are persisted alongside the
/// snapshot identity, so a later poll still has something to diff against even
/// if the snapshot itself was deleted on the server in the meantime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordedBuildState {
    /// Snapshot created by the build's accept, when one was taken.
    pub snapshot: Option<BaselineSetRef>,

    /// Component states at the moment the build's accept completed.
    pub components: Vec<ComponentState>,

    /// When the baseline was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl RecordedBuildState {
    pub fn new(snapshot: Option<BaselineSetRef>, components: Vec<ComponentState>) -> Self {
        Self {
            snapshot,
            components,
            recorded_at: Utc::now(),
        }
    }

    /// Item id of the recorded snapshot, if one was taken.
    pub fn snapshot_uuid(&self) -> Option<&str> {
        self.snapshot.as_ref().map(|s| s.item_id.as_str())
    }

    /// Fingerprint of the recorded component states.
    pub fn fingerprint(&self) -> String {
        state_fingerprint(&self.components)
    }
}

/// How the on-disk load is scoped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoadMethod {
    /// Load every component of the workspace/stream.
    AllComponents,

    /// Load every component except the listed ones (already resolved to
    /// concrete item ids — the client never matches by name).
    ExcludeComponents { exclude: Vec<ComponentRef> },

    /// Load only what the named load-rule file selects.
    LoadRuleFile { path: String },

    /// Load what the dynamically generated load rules select; the rules are
    /// produced by a host extension at load time.
    DynamicLoadRules,
}

/// The resolved load contract handed to [`crate::ScmClient::load`].
///
/// Produced once per build by the load decision engine; the client must honor
/// it exactly — the engine has already applied policy, exclusions, and
/// version gates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadPlan {
    pub method: LoadMethod,

    /// Give each component its own subdirectory under the load root instead
    /// of flattening contents. Ignored for rule-driven methods; the rules
    /// dictate the layout.
    pub create_component_folders: bool,

    /// Delete the load directory contents before loading.
    pub clear_load_directory: bool,

    /// Synchronize the workspace with the server before loading. `false`
    /// loads whatever the workspace currently holds on disk.
    pub accept_before_load: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(item: &str, state: &str) -> ComponentState {
        ComponentState::new(item, Some(item.trim_start_matches('_').to_string()), state)
    }

    #[test]
    fn recorded_state_fingerprint_matches_equivalent_remote_state() {
        let components = vec![component("_a", "s1"), component("_b", "s7")];
        let recorded = RecordedBuildState::new(
            Some(BaselineSetRef::new("_snap1", "build-42")),
            components.clone(),
        );
        let remote = RemoteFlowState {
            components,
            ..RemoteFlowState::default()
        };
        assert_eq!(recorded.fingerprint(), remote.fingerprint());
    }

    #[test]
    fn recorded_state_serde_round_trip() {
        let recorded = RecordedBuildState::new(
            Some(BaselineSetRef::new("_snap1", "build-42")),
            vec![component("_a", "s1")],
        );
        let json = serde_json::to_string(&recorded).unwrap();
        let back: RecordedBuildState = serde_json::from_str(&json).unwrap();
        assert_eq!(recorded, back);
    }

    #[test]
    fn snapshot_uuid_is_absent_without_a_snapshot() {
        let recorded = RecordedBuildState::new(None, vec![]);
        assert_eq!(recorded.snapshot_uuid(), None);
    }

    #[test]
    fn load_plan_serde_names_are_stable() {
        let plan = LoadPlan {
            method: LoadMethod::LoadRuleFile {
                path: "rules/app.loadrule".to_string(),
            },
            create_component_folders: false,
            clear_load_directory: true,
            accept_before_load: true,
        };
        let json = serde_json::to_string(&plan).unwrap();
        assert!(json.contains("\"type\":\"load_rule_file\""));
        let back: LoadPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(plan, back);
    }
}
