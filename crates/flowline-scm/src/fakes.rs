//! In-memory fake for the SCM client trait (testing only).
//!
//! `MemoryScmClient` satisfies the `ScmClient` contract from scripted data:
//! no server, no toolkit, no I/O. Failure injection and an optional artificial
//! delay cover the error and timeout paths.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::capabilities::{Capabilities, ToolkitVersion};
use crate::client::{
    AcceptOutcome, AcceptRequest, ClientResult, LoadOutcome, LoadRequest, ScmClient,
};
use crate::error::ClientError;
use crate::source::BuildSource;
use crate::state::{BaselineSetRef, LoadMethod, RemoteFlowState};

/// Generate an item id in the server's underscore-prefixed form.
pub fn fake_item_id() -> String {
    format!("_{}", Uuid::new_v4().simple())
}

/// Scripted failure applied to every source-addressed call.
#[derive(Debug, Clone)]
enum ScriptedFailure {
    NotFound { kind: String, name: String },
    Connection(String),
}

/// In-memory `ScmClient` backed by scripted responses.
pub struct MemoryScmClient {
    capabilities: Mutex<Capabilities>,
    state: Mutex<RemoteFlowState>,
    report: Mutex<String>,
    snapshot: Mutex<Option<BaselineSetRef>>,
    failure: Mutex<Option<ScriptedFailure>>,
    delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<String>>,
}

impl MemoryScmClient {
    /// A healthy client on a modern toolkit with an empty workspace.
    pub fn new() -> Self {
        Self {
            capabilities: Mutex::new(Capabilities::new(ToolkitVersion::new(7, 0, 2))),
            state: Mutex::new(RemoteFlowState::default()),
            report: Mutex::new(String::new()),
            snapshot: Mutex::new(None),
            failure: Mutex::new(None),
            delay: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_toolkit_version(self, version: ToolkitVersion) -> Self {
        *self.capabilities.lock().unwrap() = Capabilities::new(version);
        self
    }

    pub fn with_state(self, state: RemoteFlowState) -> Self {
        *self.state.lock().unwrap() = state;
        self
    }

    /// Script the raw change report returned by `accept`.
    pub fn with_report(self, report: impl Into<String>) -> Self {
        *self.report.lock().unwrap() = report.into();
        self
    }

    /// Script the snapshot created by `accept`.
    pub fn with_snapshot(self, snapshot: BaselineSetRef) -> Self {
        *self.snapshot.lock().unwrap() = Some(snapshot);
        self
    }

    /// Every source-addressed call fails as if the object were deleted.
    pub fn with_not_found(self, kind: impl Into<String>, name: impl Into<String>) -> Self {
        *self.failure.lock().unwrap() = Some(ScriptedFailure::NotFound {
            kind: kind.into(),
            name: name.into(),
        });
        self
    }

    /// Every call fails with a connection error.
    pub fn with_connection_failure(self, detail: impl Into<String>) -> Self {
        *self.failure.lock().unwrap() = Some(ScriptedFailure::Connection(detail.into()));
        self
    }

    /// Sleep before answering any call; pair with a short caller timeout to
    /// exercise deadline propagation.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    /// Names of the trait methods invoked so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn enter(&self, call: &str) -> ClientResult<()> {
        self.calls.lock().unwrap().push(call.to_string());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self.failure.lock().unwrap().clone();
        match failure {
            Some(ScriptedFailure::NotFound { kind, name }) => {
                Err(ClientError::NotFound { kind, name })
            }
            Some(ScriptedFailure::Connection(detail)) => Err(ClientError::Connection(detail)),
            None => Ok(()),
        }
    }
}

impl Default for MemoryScmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScmClient for MemoryScmClient {
    async fn capabilities(&self) -> ClientResult<Capabilities> {
        self.enter("capabilities").await?;
        Ok(self.capabilities.lock().unwrap().clone())
    }

    async fn test_connection(&self) -> ClientResult<()> {
        self.enter("test_connection").await
    }

    async fn current_state(&self, _source: &BuildSource) -> ClientResult<RemoteFlowState> {
        self.enter("current_state").await?;
        Ok(self.state.lock().unwrap().clone())
    }

    async fn accept(&self, _request: AcceptRequest) -> ClientResult<AcceptOutcome> {
        self.enter("accept").await?;
        let mut state = self.state.lock().unwrap();
        // Accept consumes the incoming queue.
        state.incoming_change_sets.clear();
        Ok(AcceptOutcome {
            report: self.report.lock().unwrap().clone(),
            snapshot: self.snapshot.lock().unwrap().clone(),
            components: state.components.clone(),
        })
    }

    async fn load(&self, request: LoadRequest) -> ClientResult<LoadOutcome> {
        self.enter("load").await?;
        let total = self.state.lock().unwrap().components.len();
        let loaded = match &request.plan.method {
            LoadMethod::ExcludeComponents { exclude } => total.saturating_sub(exclude.len()),
            _ => total,
        };
        Ok(LoadOutcome {
            components_loaded: loaded as u32,
            directory_cleared: request.plan.clear_load_directory,
        })
    }
}
