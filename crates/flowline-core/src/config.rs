//! Build source and load configuration as the host hands it to the core.
//!
//! These are value objects: constructed once per build invocation from job
//! configuration and never mutated here. Serde names match the host-facing
//! configuration fields, which are a compatibility boundary.

use serde::{Deserialize, Serialize};

use flowline_scm::BuildSource;

use crate::error::{CoreError, Result};

fn default_true() -> bool {
    true
}

/// What kind of job is hosting the build.
///
/// The core does not talk to the host; it is told the runner kind and
/// enforces the polling-only precondition with it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RunnerKind {
    /// Pipeline-class job; may use polling-only mode.
    Pipeline,
    /// Classic job; accept/load happen inside the build.
    Freestyle,
}

impl RunnerKind {
    pub fn supports_polling_only(&self) -> bool {
        matches!(self, RunnerKind::Pipeline)
    }
}

/// Snapshot identity resolved ahead of time for polling-only mode.
///
/// Written by the pipeline step that performed the accept; polling later
/// compares against it without touching the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollingOnlyData {
    #[serde(rename = "snapshotUUID")]
    pub snapshot_uuid: String,
    /// Component-state fingerprint taken alongside the snapshot, when the
    /// step recorded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// Identifies what to build, plus the switches that shape accept and poll
/// behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuildSourceConfig {
    #[serde(flatten)]
    pub source: BuildSource,

    /// Synchronize the workspace with the server before loading. Meaningful
    /// for workspace and stream sources only; definitions accept implicitly.
    #[serde(default = "default_true")]
    pub accept_before_load: bool,

    /// Exclude outgoing changes on the build workspace from the polling
    /// comparison; only changes on the flow target then count.
    #[serde(default, rename = "ignoreOutgoingFromBuildWorkspaceWhilePolling")]
    pub ignore_outgoing_while_polling: bool,

    /// Answer polls purely from state recorded at build time, with no
    /// server comparison.
    #[serde(default)]
    pub polling_only: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling_only_data: Option<PollingOnlyData>,
}

impl BuildSourceConfig {
    /// Plain configuration for a source with every switch at its default.
    pub fn new(source: BuildSource) -> Self {
        Self {
            source,
            accept_before_load: true,
            ignore_outgoing_while_polling: false,
            polling_only: false,
            polling_only_data: None,
        }
    }

    /// Enforce the polling-only preconditions. A no-op unless `pollingOnly`
    /// is set. The source-kind restriction is checked before the runner
    /// restriction; both messages are stable.
    pub fn validate_polling_only(&self, runner: RunnerKind) -> Result<()> {
        if !self.polling_only {
            return Ok(());
        }
        if !self.source.supports_polling_only() {
            return Err(CoreError::configuration(
                "pollingOnly is available for build definition and repository workspace \
                 configurations only",
            ));
        }
        if !runner.supports_polling_only() {
            return Err(CoreError::configuration(
                "Polling-only is available for Pipeline jobs only",
            ));
        }
        Ok(())
    }
}

/// Which loading strategy the job asked for.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LoadPolicy {
    /// Legacy behavior: load the whole workspace.
    #[default]
    Default,
    /// Component inclusion/exclusion via [`ComponentLoadConfig`].
    UseComponentLoadConfig,
    /// A load-rule file drives the load exclusively.
    UseLoadRules,
    /// Load rules are generated at load time by the toolkit.
    UseDynamicLoadRules,
}

/// Component selection under `LoadPolicy::UseComponentLoadConfig`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ComponentLoadConfig {
    #[default]
    LoadAllComponents,
    ExcludeSomeComponents,
}

/// How to materialize the workspace on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadOptions {
    pub load_policy: LoadPolicy,
    /// Meaningful only under `UseComponentLoadConfig`.
    pub component_load_config: ComponentLoadConfig,
    /// Component names to exclude. Exclusion is by display name, so a name
    /// shared by two components is ambiguous and rejected.
    pub components_to_exclude: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_rule_file: Option<String>,
    /// Give each component its own subdirectory instead of flattening
    /// contents into the load root.
    pub create_folders_for_components: bool,
    /// Delete the load directory before loading.
    pub clear_load_directory: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_json_uses_host_facing_names() {
        let json = r#"{
            "buildType": "buildWorkspace",
            "workspaceName": "dev",
            "acceptBeforeLoad": false,
            "ignoreOutgoingFromBuildWorkspaceWhilePolling": true,
            "pollingOnly": true,
            "pollingOnlyData": {"snapshotUUID": "_snap1"}
        }"#;
        let config: BuildSourceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.source.identity(), "dev");
        assert!(!config.accept_before_load);
        assert!(config.ignore_outgoing_while_polling);
        assert!(config.polling_only);
        assert_eq!(
            config.polling_only_data.unwrap().snapshot_uuid,
            "_snap1"
        );
    }

    #[test]
    fn accept_before_load_defaults_on() {
        let json = r#"{"buildType": "buildStream", "streamName": "Main"}"#;
        let config: BuildSourceConfig = serde_json::from_str(json).unwrap();
        assert!(config.accept_before_load);
        assert!(!config.polling_only);
    }

    #[test]
    fn polling_only_rejects_stream_sources_before_runner_kind() {
        let mut config = BuildSourceConfig::new(BuildSource::Stream {
            name: "Main".to_string(),
        });
        config.polling_only = true;

        // Kind restriction wins even on a runner that also fails.
        let err = config
            .validate_polling_only(RunnerKind::Freestyle)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "pollingOnly is available for build definition and repository workspace \
             configurations only"
        );
    }

    #[test]
    fn polling_only_rejects_freestyle_runners() {
        let mut config = BuildSourceConfig::new(BuildSource::Definition {
            id: "daily.build".to_string(),
        });
        config.polling_only = true;

        let err = config
            .validate_polling_only(RunnerKind::Freestyle)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Polling-only is available for Pipeline jobs only"
        );
        assert!(config.validate_polling_only(RunnerKind::Pipeline).is_ok());
    }

    #[test]
    fn validation_is_a_no_op_without_polling_only() {
        let config = BuildSourceConfig::new(BuildSource::Snapshot {
            selector: flowline_scm::SnapshotSelector::Name {
                name: "RC1".to_string(),
            },
        });
        assert!(config.validate_polling_only(RunnerKind::Freestyle).is_ok());
    }

    #[test]
    fn load_options_parse_with_defaults() {
        let options: LoadOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.load_policy, LoadPolicy::Default);
        assert_eq!(
            options.component_load_config,
            ComponentLoadConfig::LoadAllComponents
        );
        assert!(options.components_to_exclude.is_empty());
        assert!(!options.clear_load_directory);

        let options: LoadOptions = serde_json::from_str(
            r#"{
                "loadPolicy": "useComponentLoadConfig",
                "componentLoadConfig": "excludeSomeComponents",
                "componentsToExclude": ["docs"],
                "createFoldersForComponents": true
            }"#,
        )
        .unwrap();
        assert_eq!(options.load_policy, LoadPolicy::UseComponentLoadConfig);
        assert_eq!(options.components_to_exclude, vec!["docs".to_string()]);
        assert!(options.create_folders_for_components);
    }
}
