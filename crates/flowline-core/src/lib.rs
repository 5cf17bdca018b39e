//! Flowline Core Library
//!
//! Re-exports the change-log model, the load-plan resolver, and the polling
//! and checkout engines for programmatic access.

pub mod checkout;
pub mod config;
pub mod error;
pub mod load;
pub mod model;
pub mod obs;
pub mod polling;
pub mod report;
pub mod telemetry;

pub use model::{
    ChangeAction, ChangeDesc, ChangeLogEntry, ChangeLogSet, ChangeSetEntry, ComponentEntry,
    EditKind, WorkItemDesc,
};

pub use config::{
    BuildSourceConfig, ComponentLoadConfig, LoadOptions, LoadPolicy, PollingOnlyData, RunnerKind,
};

pub use checkout::{
    run_checkout, run_poll, CheckoutOutcome, CheckoutSettings, DEFAULT_OP_TIMEOUT,
};
pub use error::{CoreError, Result};
pub use load::{resolve_load_plan, ResolveContext};
pub use polling::{classify_recorded_only, classify_remote, Change, PollOutcome};
pub use report::{parse_report, write_report};

pub use flowline_scm::{
    BaselineSetRef, BuildSource, Capabilities, ComponentRef, ComponentState, LoadMethod, LoadPlan,
    RecordedBuildState, RemoteFlowState, ScmClient, SnapshotSelector, ToolkitVersion,
};

pub use obs::{
    emit_accept_completed, emit_checkout_started, emit_load_completed, emit_poll_evaluated,
    ScmOpSpan,
};
pub use telemetry::init_tracing;

/// Flowline version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
