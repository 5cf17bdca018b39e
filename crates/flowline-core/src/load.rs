//! Load configuration resolver.
//!
//! Turns a [`BuildSourceConfig`] + [`LoadOptions`] pair into the
//! [`LoadPlan`] the SCM client must honor, or a configuration error. Rules
//! are evaluated in a fixed precedence order and the first match wins;
//! messages are stable and surfaced verbatim.

use std::collections::HashSet;

use tracing::debug;

use flowline_scm::{
    Capabilities, ComponentRef, LoadMethod, LoadPlan, MIN_DYNAMIC_LOAD_RULES_TOOLKIT,
    MIN_LOAD_POLICY_TOOLKIT,
};

use crate::config::{BuildSourceConfig, ComponentLoadConfig, LoadOptions, LoadPolicy, RunnerKind};
use crate::error::{CoreError, Result};

/// Everything the resolver needs for one decision.
pub struct ResolveContext<'a> {
    pub config: &'a BuildSourceConfig,
    pub options: &'a LoadOptions,
    /// What the connected toolkit advertises.
    pub capabilities: &'a Capabilities,
    /// Kind of job hosting this build.
    pub runner: RunnerKind,
    /// Component set of the resolved workspace/stream, for exclusion by name.
    pub components: &'a [ComponentRef],
}

/// Resolve the load plan for one build.
///
/// Precedence: polling-only preconditions, then the dynamic-load-rules
/// version gate, then the configured load policy. `acceptBeforeLoad` is
/// orthogonal to policy resolution and lands on the plan unchanged for
/// workspace/stream sources; definitions accept implicitly and snapshots
/// have nothing to accept.
pub fn resolve_load_plan(ctx: &ResolveContext) -> Result<LoadPlan> {
    ctx.config.validate_polling_only(ctx.runner)?;

    let method = resolve_method(ctx)?;

    let accept_before_load = if ctx.config.source.accept_is_configurable() {
        ctx.config.accept_before_load
    } else {
        matches!(ctx.config.source, flowline_scm::BuildSource::Definition { .. })
    };

    let plan = LoadPlan {
        method,
        create_component_folders: ctx.options.create_folders_for_components,
        clear_load_directory: ctx.options.clear_load_directory,
        accept_before_load,
    };

    debug!(
        event = "load.resolved",
        source = %ctx.config.source,
        method = method_label(&plan.method),
        accept_before_load = plan.accept_before_load,
    );
    Ok(plan)
}

fn resolve_method(ctx: &ResolveContext) -> Result<LoadMethod> {
    match ctx.options.load_policy {
        LoadPolicy::UseDynamicLoadRules => {
            if !ctx.capabilities.supports_dynamic_load_rules() {
                return Err(CoreError::Capability {
                    feature: "Dynamic load rules".to_string(),
                    minimum: MIN_DYNAMIC_LOAD_RULES_TOOLKIT,
                    actual: ctx.capabilities.toolkit_version,
                });
            }
            Ok(LoadMethod::DynamicLoadRules)
        }

        LoadPolicy::UseComponentLoadConfig => match ctx.options.component_load_config {
            ComponentLoadConfig::ExcludeSomeComponents => {
                resolve_exclusions(&ctx.options.components_to_exclude, ctx.components)
            }
            ComponentLoadConfig::LoadAllComponents => Ok(LoadMethod::AllComponents),
        },

        LoadPolicy::UseLoadRules => {
            match ctx.options.load_rule_file.as_deref().map(str::trim) {
                Some(path) if !path.is_empty() => {
                    if !ctx.capabilities.supports_load_policy() {
                        return Err(CoreError::Capability {
                            feature: "Load rule file driven loads".to_string(),
                            minimum: MIN_LOAD_POLICY_TOOLKIT,
                            actual: ctx.capabilities.toolkit_version,
                        });
                    }
                    Ok(LoadMethod::LoadRuleFile {
                        path: path.to_string(),
                    })
                }
                // No rule file configured: the whole workspace is loaded.
                // Documented fallback, not an error.
                _ => Ok(LoadMethod::AllComponents),
            }
        }

        // Legacy behavior, preserved exactly: no policy means load everything.
        LoadPolicy::Default => Ok(LoadMethod::AllComponents),
    }
}

/// Resolve excluded names against the component set. Exclusion is by display
/// name; an excluded name matched by two components is ambiguous and an
/// excluded name matched by none is a dead configuration entry. Both are
/// rejected rather than silently corrected.
fn resolve_exclusions(names: &[String], components: &[ComponentRef]) -> Result<LoadMethod> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut exclude = Vec::new();

    for raw in names {
        let name = raw.trim();
        if name.is_empty() || !seen.insert(name) {
            continue;
        }
        let mut matches = components
            .iter()
            .filter(|c| c.name.as_deref() == Some(name));
        match (matches.next(), matches.next()) {
            (Some(only), None) => exclude.push(only.clone()),
            (Some(_), Some(_)) => {
                return Err(CoreError::configuration(format!(
                    "More than one component with name \"{name}\" found in the workspace or \
                     stream being loaded"
                )));
            }
            (None, _) => {
                return Err(CoreError::configuration(format!(
                    "No component with name \"{name}\" found in the workspace or stream \
                     being loaded"
                )));
            }
        }
    }

    Ok(LoadMethod::ExcludeComponents { exclude })
}

fn method_label(method: &LoadMethod) -> &'static str {
    match method {
        LoadMethod::AllComponents => "all-components",
        LoadMethod::ExcludeComponents { .. } => "exclude-components",
        LoadMethod::LoadRuleFile { .. } => "load-rule-file",
        LoadMethod::DynamicLoadRules => "dynamic-load-rules",
    }
}
