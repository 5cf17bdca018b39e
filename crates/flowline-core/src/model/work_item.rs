//! Work items attached to change sets.

use serde::{Deserialize, Serialize};

/// Replace every C0 control character except horizontal tab and newline with
/// a single space. Work item summaries come from a foreign tracker and have
/// been observed carrying vertical tabs and NULs that break downstream
/// renderers.
pub fn sanitize_summary(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c < '\u{20}' && c != '\t' && c != '\n' {
                ' '
            } else {
                c
            }
        })
        .collect()
}

/// A work item linked to a change set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemDesc {
    /// Tracker-assigned number.
    pub number: i64,
    /// Summary line, sanitized on construction.
    pub summary: String,
}

impl WorkItemDesc {
    /// Build a work item, sanitizing the summary.
    pub fn new(number: i64, summary: &str) -> Self {
        Self {
            number,
            summary: sanitize_summary(summary),
        }
    }
}
