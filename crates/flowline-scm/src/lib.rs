//! Flowline-SCM: Repository Client Boundary for Flowline
//!
//! This crate defines the vocabulary shared between the decision engines and
//! whatever talks to the SCM repository server: build sources, component and
//! flow state, load plans, and the async [`ScmClient`] trait the engines are
//! written against.
//!
//! ## Layer 0 - Client Boundary
//!
//! Focus: typed requests/responses, explicit capabilities, no probing.
//!
//! ## Key Components
//!
//! - `ScmClient`: async contract every repository connector implements
//! - `Capabilities`: version-gated features the toolkit advertises up front
//! - `FacadeCache`: bounded reuse of connectors keyed by toolkit install
//! - `fakes::MemoryScmClient`: scripted in-memory client for tests

mod cache;
mod capabilities;
mod client;
mod component;
mod error;
pub mod fakes;
mod source;
mod state;

pub use cache::{FacadeCache, DEFAULT_FACADE_CAPACITY};
pub use capabilities::{
    Capabilities, ToolkitVersion, MIN_DYNAMIC_LOAD_RULES_TOOLKIT, MIN_LOAD_POLICY_TOOLKIT,
};
pub use client::{
    AcceptOutcome, AcceptRequest, ClientResult, LoadOutcome, LoadRequest, ScmClient,
};
pub use component::{state_fingerprint, ComponentRef, ComponentState};
pub use error::ClientError;
pub use source::{BuildSource, SnapshotSelector};
pub use state::{BaselineSetRef, LoadMethod, LoadPlan, RecordedBuildState, RemoteFlowState};

/// Result type for flowline-scm operations
pub type Result<T> = std::result::Result<T, ClientError>;
