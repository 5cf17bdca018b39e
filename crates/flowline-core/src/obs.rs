//! Structured observability hooks for checkout and poll lifecycle events.
//!
//! This module provides:
//! - Operation-scoped tracing spans via the `ScmOpSpan` RAII guard
//! - Emission functions for the key lifecycle events: checkout start,
//!   accept, load, poll evaluation
//!
//! Events are emitted at `info!` level; verbosity is controlled through the
//! `RUST_LOG` env var. For JSON output see [`crate::telemetry::init_tracing`].

use tracing::info;

/// RAII guard that enters an operation-scoped tracing span.
///
/// # Example
///
/// ```ignore
/// let _span = ScmOpSpan::enter("checkout", "repository workspace \"dev\"");
/// // All tracing calls now carry op and source fields.
/// ```
pub struct ScmOpSpan {
    _span: tracing::span::EnteredSpan,
}

impl ScmOpSpan {
    /// Create and enter a span tagged with the operation and build source.
    pub fn enter(op: &str, source: &str) -> Self {
        let span = tracing::info_span!("flowline.op", op = %op, source = %source);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: checkout started against a build source.
pub fn emit_checkout_started(source: &str) {
    info!(event = "checkout.started", source = %source);
}

/// Emit event: accept completed with the parsed change report counts.
pub fn emit_accept_completed(source: &str, accepted: usize, discarded: usize, components: usize) {
    info!(
        event = "checkout.accepted",
        source = %source,
        accepted = accepted,
        discarded = discarded,
        components = components,
    );
}

/// Emit event: load completed.
pub fn emit_load_completed(source: &str, components_loaded: u32, directory_cleared: bool) {
    info!(
        event = "checkout.loaded",
        source = %source,
        components_loaded = components_loaded,
        directory_cleared = directory_cleared,
    );
}

/// Emit event: poll comparison evaluated.
pub fn emit_poll_evaluated(source: &str, significant: bool, reasons: usize) {
    info!(
        event = "poll.evaluated",
        source = %source,
        significant = significant,
        reasons = reasons,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_span_create() {
        // Just ensure ScmOpSpan::enter doesn't panic
        let _span = ScmOpSpan::enter("poll", "stream \"Main\"");
    }
}
