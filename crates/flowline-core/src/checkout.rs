//! Checkout and poll orchestration over an [`ScmClient`].
//!
//! The engines themselves are pure; this module sequences the client calls
//! around them. Every client call runs under a caller-supplied deadline, and
//! a missed deadline is a fatal [`CoreError::Timeout`], never a silent
//! "no changes".

use std::future::Future;
use std::time::Duration;

use flowline_scm::{
    AcceptRequest, BaselineSetRef, ClientResult, ComponentState, LoadOutcome, LoadPlan,
    LoadRequest, RecordedBuildState, ScmClient,
};

use crate::config::{BuildSourceConfig, LoadOptions, RunnerKind};
use crate::error::{CoreError, Result};
use crate::load::{resolve_load_plan, ResolveContext};
use crate::model::ChangeLogSet;
use crate::obs;
use crate::polling::{classify_recorded_only, classify_remote, PollOutcome};
use crate::report::parse_report;

/// Default per-call deadline for repository client operations.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(60);

/// Per-invocation knobs that are not part of job configuration.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    /// Name for the snapshot taken by the accept, when the source takes one.
    pub snapshot_name: Option<String>,
    /// Directory to load into; the client's default when absent.
    pub load_directory: Option<String>,
    /// Deadline applied to each individual client call.
    pub op_timeout: Duration,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            snapshot_name: None,
            load_directory: None,
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }
}

/// Everything one checkout produces.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    /// Parsed change report; empty when the plan skipped the accept.
    pub change_log: ChangeLogSet,
    /// The plan the load was executed with.
    pub plan: LoadPlan,
    pub load: LoadOutcome,
    /// State to persist for the next poll and the next build's linkage.
    pub recorded: RecordedBuildState,
}

async fn with_deadline<T, F>(op: &str, deadline: Duration, fut: F) -> Result<T>
where
    F: Future<Output = ClientResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result.map_err(CoreError::from),
        Err(_) => Err(CoreError::Timeout {
            op: op.to_string(),
            millis: deadline.as_millis() as u64,
        }),
    }
}

/// Run one checkout: resolve the load plan, accept (when the plan says so),
/// load, and capture the state to record for the build.
///
/// In polling-only mode the build touches nothing: the pipeline step already
/// accepted and took the snapshot, so the checkout records that snapshot
/// identity together with the components the server reports and performs no
/// accept and no load.
pub async fn run_checkout(
    client: &dyn ScmClient,
    config: &BuildSourceConfig,
    options: &LoadOptions,
    runner: RunnerKind,
    previous: Option<&RecordedBuildState>,
    settings: &CheckoutSettings,
) -> Result<CheckoutOutcome> {
    let source_label = config.source.to_string();
    let _span = obs::ScmOpSpan::enter("checkout", &source_label);
    obs::emit_checkout_started(&source_label);

    let deadline = settings.op_timeout;
    let capabilities = with_deadline("capabilities", deadline, client.capabilities()).await?;
    let state = with_deadline(
        "current_state",
        deadline,
        client.current_state(&config.source),
    )
    .await?;

    let component_refs: Vec<_> = state.components.iter().map(ComponentState::to_ref).collect();
    let plan = resolve_load_plan(&ResolveContext {
        config,
        options,
        capabilities: &capabilities,
        runner,
        components: &component_refs,
    })?;

    if config.polling_only {
        // The snapshot name does not travel in pollingOnlyData; only the
        // identity is known here.
        let snapshot = config
            .polling_only_data
            .as_ref()
            .map(|data| BaselineSetRef::new(data.snapshot_uuid.clone(), String::new()));
        return Ok(CheckoutOutcome {
            change_log: ChangeLogSet::default(),
            plan,
            load: LoadOutcome {
                components_loaded: 0,
                directory_cleared: false,
            },
            recorded: RecordedBuildState::new(snapshot, state.components),
        });
    }

    let (change_log, snapshot, recorded_components) = if plan.accept_before_load {
        let accept = with_deadline(
            "accept",
            deadline,
            client.accept(AcceptRequest {
                source: config.source.clone(),
                snapshot_name: settings.snapshot_name.clone(),
                previous_snapshot: previous.and_then(|r| r.snapshot.clone()),
            }),
        )
        .await?;
        let change_log = parse_report(&accept.report)?;
        obs::emit_accept_completed(
            &source_label,
            change_log.accepted_count(),
            change_log.discarded_count(),
            change_log.component_change_count(),
        );
        (change_log, accept.snapshot, accept.components)
    } else {
        // No accept: the load uses the workspace as found, nothing flows in,
        // and there is no report to parse.
        (ChangeLogSet::default(), None, state.components.clone())
    };

    let load = with_deadline(
        "load",
        deadline,
        client.load(LoadRequest {
            source: config.source.clone(),
            plan: plan.clone(),
            load_directory: settings.load_directory.clone(),
        }),
    )
    .await?;
    obs::emit_load_completed(&source_label, load.components_loaded, load.directory_cleared);

    let recorded = RecordedBuildState::new(snapshot, recorded_components);
    Ok(CheckoutOutcome {
        change_log,
        plan,
        load,
        recorded,
    })
}

/// Answer one poll request.
///
/// In polling-only mode the server is not consulted at all; otherwise the
/// current repository state is fetched under the deadline and compared. A
/// source missing on the server at poll time surfaces as
/// [`CoreError::NotFound`], not as a quiet "no changes".
pub async fn run_poll(
    client: &dyn ScmClient,
    config: &BuildSourceConfig,
    runner: RunnerKind,
    recorded: Option<&RecordedBuildState>,
    op_timeout: Duration,
) -> Result<PollOutcome> {
    let source_label = config.source.to_string();
    let _span = obs::ScmOpSpan::enter("poll", &source_label);

    let outcome = if config.polling_only {
        classify_recorded_only(config, runner, recorded)?
    } else {
        let current = with_deadline(
            "current_state",
            op_timeout,
            client.current_state(&config.source),
        )
        .await?;
        classify_remote(config, runner, recorded, &current)?
    };

    obs::emit_poll_evaluated(&source_label, outcome.is_significant(), outcome.reasons.len());
    Ok(outcome)
}
