//! SCM client trait definition.
//!
//! The narrow, versioned interface to the repository server. Implementations
//! wrap a real build toolkit; tests use the in-memory fake from the `fakes`
//! module. All operations are async and may block on remote calls — callers
//! own the deadline and wrap calls in their own timeout.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::capabilities::Capabilities;
use crate::component::ComponentState;
use crate::error::ClientError;
use crate::source::BuildSource;
use crate::state::{BaselineSetRef, LoadPlan, RemoteFlowState};

/// Result type for client operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Request for an accept: synchronize the build source with its flow target
/// and record a snapshot of the result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AcceptRequest {
    pub source: BuildSource,

    /// Name for the snapshot taken after the accept; `None` skips snapshot
    /// creation (stream loads that only need a change report).
    pub snapshot_name: Option<String>,

    /// Snapshot of the previous build, for the server to compute the
    /// accepted/discarded delta against.
    pub previous_snapshot: Option<BaselineSetRef>,
}

/// Outcome of an accept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AcceptOutcome {
    /// Serialized change report in the changelog wire format. Empty string
    /// when nothing was accepted.
    pub report: String,

    /// Snapshot taken after the accept, when one was requested.
    pub snapshot: Option<BaselineSetRef>,

    /// Component states after the accept completed; becomes the next
    /// recorded baseline.
    pub components: Vec<ComponentState>,
}

/// Request to materialize content on disk per an already-resolved plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadRequest {
    pub source: BuildSource,
    pub plan: LoadPlan,

    /// Host-chosen load root. `None` lets the client use its configured
    /// default sandbox.
    pub load_directory: Option<String>,
}

/// Outcome of a load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadOutcome {
    /// Number of components the client materialized.
    pub components_loaded: u32,

    /// Whether the load directory was cleared first.
    pub directory_cleared: bool,
}

/// Client for one repository server connection.
///
/// Guarantees:
/// - Operations are independent; the client holds no per-call state.
/// - `current_state` never mutates the server; `accept` and `load` do.
/// - `ClientError::NotFound` names the object the server no longer knows;
///   callers decide whether that is fatal for their operation.
#[async_trait]
pub trait ScmClient: Send + Sync {
    /// Feature set of the connected toolkit/server pair.
    async fn capabilities(&self) -> ClientResult<Capabilities>;

    /// Reachability probe; returns an error describing the first failing hop.
    async fn test_connection(&self) -> ClientResult<()>;

    /// Fetch the current server-side state of a build source: component
    /// states plus incoming/outgoing change-set ids relative to the flow
    /// target.
    async fn current_state(&self, source: &BuildSource) -> ClientResult<RemoteFlowState>;

    /// Accept incoming change sets into the build source and report what
    /// changed.
    async fn accept(&self, request: AcceptRequest) -> ClientResult<AcceptOutcome>;

    /// Materialize content on disk according to a resolved plan.
    async fn load(&self, request: LoadRequest) -> ClientResult<LoadOutcome>;
}
