//! Flowline - SCM change flow tooling for CI hosts
//!
//! The `flowline` command inspects change reports and dry-runs the load and
//! polling decisions a CI host would make, all from local files.
//!
//! ## Commands
//!
//! - `changelog`: Parse a change report and render it
//! - `plan`: Resolve the load plan for a job configuration
//! - `poll`: Classify a poll from state files
//! - `simulate`: Dry-run a full checkout against scripted server state

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use flowline_core::{
    classify_recorded_only, classify_remote, parse_report, resolve_load_plan, run_checkout,
    write_report, BuildSourceConfig, Capabilities, ChangeLogEntry, ChangeLogSet, CheckoutSettings,
    ComponentRef, LoadMethod, LoadOptions, LoadPlan, PollOutcome, RecordedBuildState,
    RemoteFlowState, ResolveContext, RunnerKind,
};
use flowline_scm::fakes::{fake_item_id, MemoryScmClient};
use flowline_scm::BaselineSetRef;

#[derive(Parser)]
#[command(name = "flowline")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Stream-based SCM integration tooling", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a change report and render it
    Changelog {
        /// Change report XML file
        file: PathBuf,

        /// Output format: summary, json, or xml
        #[arg(long, default_value = "summary")]
        format: String,
    },

    /// Resolve the load plan for a job configuration
    Plan {
        /// Build source configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Load options (JSON; defaults apply when omitted)
        #[arg(long)]
        load_options: Option<PathBuf>,

        /// Component set of the workspace/stream (JSON array), for
        /// exclusion by name
        #[arg(long)]
        components: Option<PathBuf>,

        /// Version the connected build toolkit advertises
        #[arg(long, default_value = "7.0.2")]
        toolkit_version: String,

        /// Job kind hosting the build: pipeline or freestyle
        #[arg(long, default_value = "pipeline")]
        runner: String,

        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Classify a poll from state files
    Poll {
        /// Build source configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Current repository state (JSON); required unless the
        /// configuration sets pollingOnly
        #[arg(long)]
        current: Option<PathBuf>,

        /// State recorded after the last build (JSON)
        #[arg(long)]
        recorded: Option<PathBuf>,

        /// Job kind hosting the build: pipeline or freestyle
        #[arg(long, default_value = "pipeline")]
        runner: String,

        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Dry-run a full checkout against scripted server state
    Simulate {
        /// Build source configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Load options (JSON; defaults apply when omitted)
        #[arg(long)]
        load_options: Option<PathBuf>,

        /// Scripted server state (JSON)
        #[arg(long)]
        state: PathBuf,

        /// Scripted change report the accept returns (XML)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Name for the snapshot taken by the accept
        #[arg(long)]
        snapshot_name: Option<String>,

        /// Job kind hosting the build: pipeline or freestyle
        #[arg(long, default_value = "pipeline")]
        runner: String,

        /// Write the recorded build state here for a later poll
        #[arg(long)]
        record_out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    flowline_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Changelog { file, format } => cmd_changelog(&file, &format),
        Commands::Plan {
            config,
            load_options,
            components,
            toolkit_version,
            runner,
            format,
        } => cmd_plan(
            &config,
            load_options.as_deref(),
            components.as_deref(),
            &toolkit_version,
            &runner,
            &format,
        ),
        Commands::Poll {
            config,
            current,
            recorded,
            runner,
            format,
        } => cmd_poll(
            &config,
            current.as_deref(),
            recorded.as_deref(),
            &runner,
            &format,
        ),
        Commands::Simulate {
            config,
            load_options,
            state,
            report,
            snapshot_name,
            runner,
            record_out,
        } => {
            cmd_simulate(
                &config,
                load_options.as_deref(),
                &state,
                report.as_deref(),
                snapshot_name,
                &runner,
                record_out.as_deref(),
            )
            .await
        }
    }
}

fn cmd_changelog(file: &Path, format: &str) -> Result<()> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("Failed to read change report: {:?}", file))?;
    let set = parse_report(&raw)?;

    match format {
        "summary" => print!("{}", render_changelog_text(&set)),
        "json" => println!("{}", serde_json::to_string_pretty(&set)?),
        "xml" => print!("{}", write_report(&set)),
        other => bail!("unknown format {:?} (expected summary, json, or xml)", other),
    }
    Ok(())
}

fn cmd_plan(
    config: &Path,
    load_options: Option<&Path>,
    components: Option<&Path>,
    toolkit_version: &str,
    runner: &str,
    format: &str,
) -> Result<()> {
    let config: BuildSourceConfig = read_json_file(config)?;
    let options: LoadOptions = match load_options {
        Some(path) => read_json_file(path)?,
        None => LoadOptions::default(),
    };
    let components: Vec<ComponentRef> = match components {
        Some(path) => read_json_file(path)?,
        None => Vec::new(),
    };
    let version = toolkit_version
        .parse()
        .context("Invalid toolkit version")?;

    let plan = resolve_load_plan(&ResolveContext {
        config: &config,
        options: &options,
        capabilities: &Capabilities::new(version),
        runner: parse_runner(runner)?,
        components: &components,
    })?;

    match format {
        "text" => print!("{}", render_plan_text(&plan)),
        "json" => println!("{}", serde_json::to_string_pretty(&plan)?),
        other => bail!("unknown format {:?} (expected text or json)", other),
    }
    Ok(())
}

fn cmd_poll(
    config: &Path,
    current: Option<&Path>,
    recorded: Option<&Path>,
    runner: &str,
    format: &str,
) -> Result<()> {
    let config: BuildSourceConfig = read_json_file(config)?;
    let runner = parse_runner(runner)?;
    let recorded: Option<RecordedBuildState> = match recorded {
        Some(path) => Some(read_json_file(path)?),
        None => None,
    };

    let outcome = if config.polling_only {
        classify_recorded_only(&config, runner, recorded.as_ref())?
    } else {
        let current = current
            .context("--current is required unless the configuration sets pollingOnly")?;
        let state: RemoteFlowState = read_json_file(current)?;
        classify_remote(&config, runner, recorded.as_ref(), &state)?
    };

    match format {
        "text" => print!("{}", render_poll_text(&outcome)),
        "json" => println!("{}", serde_json::to_string_pretty(&outcome)?),
        other => bail!("unknown format {:?} (expected text or json)", other),
    }
    Ok(())
}

async fn cmd_simulate(
    config: &Path,
    load_options: Option<&Path>,
    state: &Path,
    report: Option<&Path>,
    snapshot_name: Option<String>,
    runner: &str,
    record_out: Option<&Path>,
) -> Result<()> {
    let config: BuildSourceConfig = read_json_file(config)?;
    let options: LoadOptions = match load_options {
        Some(path) => read_json_file(path)?,
        None => LoadOptions::default(),
    };
    let state: RemoteFlowState = read_json_file(state)?;
    let runner = parse_runner(runner)?;

    info!("simulating checkout for {}", config.source);

    let mut client = MemoryScmClient::new().with_state(state);
    if let Some(path) = report {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read change report: {:?}", path))?;
        client = client.with_report(raw);
    }
    if let Some(name) = &snapshot_name {
        client = client.with_snapshot(BaselineSetRef::new(fake_item_id(), name.clone()));
    }

    let settings = CheckoutSettings {
        snapshot_name,
        ..CheckoutSettings::default()
    };
    let outcome = run_checkout(&client, &config, &options, runner, None, &settings).await?;

    print!("{}", render_plan_text(&outcome.plan));
    println!(
        "Loaded {} component(s){}",
        outcome.load.components_loaded,
        if outcome.load.directory_cleared {
            " into a cleared directory"
        } else {
            ""
        }
    );
    println!();
    print!("{}", render_changelog_text(&outcome.change_log));

    if let Some(path) = record_out {
        let json = serde_json::to_string_pretty(&outcome.recorded)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write recorded state: {:?}", path))?;
        println!();
        println!("Recorded build state written to {:?}", path);
    }
    Ok(())
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read JSON file: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))
}

fn parse_runner(raw: &str) -> Result<RunnerKind> {
    match raw {
        "pipeline" => Ok(RunnerKind::Pipeline),
        "freestyle" => Ok(RunnerKind::Freestyle),
        other => bail!("unknown runner kind {:?} (expected pipeline or freestyle)", other),
    }
}

fn render_changelog_text(set: &ChangeLogSet) -> String {
    let mut out = String::new();

    if let Some(name) = &set.baseline_set_name {
        out.push_str(&format!("Snapshot: {}", name));
        if let Some(id) = &set.baseline_set_item_id {
            out.push_str(&format!(" ({})", id));
        }
        out.push('\n');
    }
    out.push_str(&format!(
        "{} change set(s) accepted, {} discarded, {} component change(s)\n",
        set.accepted_count(),
        set.discarded_count(),
        set.component_change_count()
    ));
    if set.is_empty() {
        return out;
    }
    out.push('\n');

    for entry in set.entries() {
        match entry {
            ChangeLogEntry::Component(component) => {
                out.push_str(&component.message());
                out.push('\n');
            }
            ChangeLogEntry::ChangeSet(cs) => {
                let marker = if cs.is_accept() { '+' } else { '-' };
                let owner = if cs.owner.is_empty() {
                    "(unknown)"
                } else {
                    cs.owner.as_str()
                };
                let message = cs.message();
                let first_line = message.lines().next().unwrap_or_default();
                out.push_str(&format!("{} {}: {}", marker, owner, first_line));
                if !cs.is_too_many_changes() && !cs.changes.is_empty() {
                    out.push_str(&format!(" ({} file(s))", cs.changes.len()));
                }
                let work_items = cs.work_items();
                if !work_items.is_empty() {
                    let numbers: Vec<String> = work_items
                        .iter()
                        .map(|wi| wi.number.to_string())
                        .collect();
                    out.push_str(&format!(" [WI {}]", numbers.join(", ")));
                }
                out.push('\n');
            }
        }
    }
    out
}

fn render_plan_text(plan: &LoadPlan) -> String {
    let method = match &plan.method {
        LoadMethod::AllComponents => "load all components".to_string(),
        LoadMethod::ExcludeComponents { exclude } => {
            let names: Vec<&str> = exclude.iter().map(|c| c.display_name()).collect();
            format!("load all components except: {}", names.join(", "))
        }
        LoadMethod::LoadRuleFile { path } => format!("load using rule file {}", path),
        LoadMethod::DynamicLoadRules => "load using rules generated at load time".to_string(),
    };
    format!(
        "Load method: {}\nAccept before load: {}\nCreate component folders: {}\nClear load directory: {}\n",
        method, plan.accept_before_load, plan.create_component_folders, plan.clear_load_directory
    )
}

fn render_poll_text(outcome: &PollOutcome) -> String {
    let mut out = format!(
        "Change: {}\n",
        if outcome.is_significant() {
            "SIGNIFICANT"
        } else {
            "NONE"
        }
    );
    for reason in &outcome.reasons {
        out.push_str(&format!("  {}\n", reason));
    }
    out
}
