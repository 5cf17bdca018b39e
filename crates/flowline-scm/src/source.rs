//! Build source identity: the server object a build or poll is pointed at.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Selector for a snapshot build source.
///
/// Snapshots can be addressed either by UUID (stable) or by display name
/// (convenient, but renameable on the server).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SnapshotSelector {
    Uuid {
        #[serde(rename = "snapshotUUID")]
        uuid: String,
    },
    Name {
        #[serde(rename = "snapshotName")]
        name: String,
    },
}

impl SnapshotSelector {
    /// The raw selector value, whichever form it takes.
    pub fn value(&self) -> &str {
        match self {
            SnapshotSelector::Uuid { uuid } => uuid,
            SnapshotSelector::Name { name } => name,
        }
    }
}

/// What a build is pointed at on the repository server.
///
/// A closed set of variants, each carrying only the identity fields that are
/// meaningful to it. The serde representation keeps the host-facing
/// `buildType` discriminator so job configuration deserializes directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "buildType")]
pub enum BuildSource {
    /// A build definition; the server owns the associated build workspace.
    #[serde(rename = "buildDefinition")]
    Definition {
        #[serde(rename = "buildDefinitionId")]
        id: String,
    },

    /// A named repository workspace.
    #[serde(rename = "buildWorkspace")]
    Workspace {
        #[serde(rename = "workspaceName")]
        name: String,
    },

    /// A stream; builds run against a private copy of its current state.
    #[serde(rename = "buildStream")]
    Stream {
        #[serde(rename = "streamName")]
        name: String,
    },

    /// An immutable snapshot (baseline set).
    #[serde(rename = "buildSnapshot")]
    Snapshot {
        #[serde(flatten)]
        selector: SnapshotSelector,
    },
}

impl BuildSource {
    /// Human-readable kind label used in log lines and error messages.
    pub fn kind_label(&self) -> &'static str {
        match self {
            BuildSource::Definition { .. } => "build definition",
            BuildSource::Workspace { .. } => "repository workspace",
            BuildSource::Stream { .. } => "stream",
            BuildSource::Snapshot { .. } => "snapshot",
        }
    }

    /// The configured identity value (definition id, workspace/stream name,
    /// or snapshot selector value).
    pub fn identity(&self) -> &str {
        match self {
            BuildSource::Definition { id } => id,
            BuildSource::Workspace { name } => name,
            BuildSource::Stream { name } => name,
            BuildSource::Snapshot { selector } => selector.value(),
        }
    }

    /// Polling-only mode is limited to sources whose accepted state is
    /// recorded per build: definitions and repository workspaces.
    pub fn supports_polling_only(&self) -> bool {
        matches!(
            self,
            BuildSource::Definition { .. } | BuildSource::Workspace { .. }
        )
    }

    /// Whether accept-before-load has any meaning for this source.
    /// Definitions accept implicitly; snapshots have nothing to accept.
    pub fn accept_is_configurable(&self) -> bool {
        matches!(
            self,
            BuildSource::Workspace { .. } | BuildSource::Stream { .. }
        )
    }
}

impl fmt::Display for BuildSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.kind_label(), self.identity())
    }
}
