//! Change log model: the structured form of one build's change report.
//!
//! A [`ChangeLogSet`] is created fresh per parse from an immutable serialized
//! report and is read-only afterwards. Entries keep document order; category
//! buckets (accepted, discarded, component events) are maintained on insert
//! so count and partition queries never rescan the entry list.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use flowline_scm::ComponentRef;

use super::edit_kind::EditKind;
use super::work_item::WorkItemDesc;

// ---------------------------------------------------------------------------
// Entry types
// ---------------------------------------------------------------------------

/// Whether an entry records an accept or a discard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChangeAction {
    Added,
    Dropped,
}

impl ChangeAction {
    /// Parse the wire `action` attribute value.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "Added" => Some(ChangeAction::Added),
            "Dropped" => Some(ChangeAction::Dropped),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Added => "Added",
            ChangeAction::Dropped => "Dropped",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file-level change within a change set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDesc {
    pub kind: EditKind,
    /// Path of the versionable as reported.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
}

/// One change set accepted into or dropped from the build workspace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSetEntry {
    pub change_set_item_id: String,
    /// Identity of the owning component. Components are keyed by item id,
    /// never by name; two components may share a name.
    pub component_item_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,
    pub owner: String,
    /// Comment with newlines restored from their escaped wire form.
    pub comment: String,
    pub date: DateTime<Utc>,
    pub action: ChangeAction,
    /// File-level changes; empty on the too-many-changes path.
    pub changes: Vec<ChangeDesc>,
    /// Primary work item, when one is linked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_item: Option<WorkItemDesc>,
    /// Linked work items beyond the primary, in document order.
    pub additional_work_items: Vec<WorkItemDesc>,
    /// Raw overflow count from the report. Present (never blank) exactly when
    /// the change set had too many changes to record individually.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_changes: Option<String>,
}

impl ChangeSetEntry {
    pub fn is_accept(&self) -> bool {
        self.action == ChangeAction::Added
    }

    /// True when the report truncated this change set instead of listing
    /// its changes.
    pub fn is_too_many_changes(&self) -> bool {
        self.additional_changes.is_some()
    }

    /// Paths touched by this change set; empty on the truncation path.
    pub fn affected_paths(&self) -> Vec<&str> {
        if self.is_too_many_changes() {
            Vec::new()
        } else {
            self.changes.iter().map(|c| c.name.as_str()).collect()
        }
    }

    /// Every linked work item, primary first.
    pub fn work_items(&self) -> Vec<&WorkItemDesc> {
        self.work_item
            .iter()
            .chain(self.additional_work_items.iter())
            .collect()
    }

    /// Line shown for this change set in a rendered change log.
    pub fn message(&self) -> String {
        if let Some(count) = &self.additional_changes {
            format!("Change set has {} changes, too many to show individually", count)
        } else if self.comment.is_empty() {
            "No comment".to_string()
        } else {
            self.comment.clone()
        }
    }
}

/// A component added to or dropped from the build workspace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentEntry {
    pub item_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub action: ChangeAction,
}

impl ComponentEntry {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.item_id)
    }

    pub fn message(&self) -> String {
        format!("{} component \"{}\"", self.action, self.display_name())
    }
}

/// One entry of a change log, in document order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "entryType", rename_all = "camelCase")]
pub enum ChangeLogEntry {
    Component(ComponentEntry),
    ChangeSet(ChangeSetEntry),
}

impl ChangeLogEntry {
    pub fn as_component(&self) -> Option<&ComponentEntry> {
        match self {
            ChangeLogEntry::Component(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_change_set(&self) -> Option<&ChangeSetEntry> {
        match self {
            ChangeLogEntry::ChangeSet(cs) => Some(cs),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Root aggregate
// ---------------------------------------------------------------------------

/// Root aggregate for one build's change report.
///
/// Header fields mirror the wire envelope. The `previous_*` fields are empty
/// strings, not absent, when there was no previous comparison target.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_set_item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_set_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_name: Option<String>,
    pub previous_baseline_set_item_id: String,
    pub previous_baseline_set_name: String,
    pub previous_build_url: String,

    pub(crate) entries: Vec<ChangeLogEntry>,
    // Indices into `entries`, maintained by `push`.
    #[serde(skip)]
    pub(crate) accepted: Vec<usize>,
    #[serde(skip)]
    pub(crate) discarded: Vec<usize>,
    #[serde(skip)]
    pub(crate) component_events: Vec<usize>,
}

impl ChangeLogSet {
    /// Append an entry, keeping the category buckets consistent.
    pub fn push(&mut self, entry: ChangeLogEntry) {
        let idx = self.entries.len();
        match &entry {
            ChangeLogEntry::Component(_) => self.component_events.push(idx),
            ChangeLogEntry::ChangeSet(cs) => {
                if cs.is_accept() {
                    self.accepted.push(idx);
                } else {
                    self.discarded.push(idx);
                }
            }
        }
        self.entries.push(entry);
    }

    /// All entries in document order.
    pub fn entries(&self) -> &[ChangeLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// An empty report parses to an empty set; absence of a recorded snapshot
    /// does not imply emptiness.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_recorded_snapshot(&self) -> bool {
        self.baseline_set_item_id.is_some()
    }

    pub fn component_change_count(&self) -> usize {
        self.component_events.len()
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    pub fn discarded_count(&self) -> usize {
        self.discarded.len()
    }

    pub fn component_entries(&self) -> impl Iterator<Item = &ComponentEntry> {
        self.component_events
            .iter()
            .filter_map(|&i| self.entries[i].as_component())
    }

    pub fn accepted_entries(&self) -> impl Iterator<Item = &ChangeSetEntry> {
        self.accepted
            .iter()
            .filter_map(|&i| self.entries[i].as_change_set())
    }

    pub fn discarded_entries(&self) -> impl Iterator<Item = &ChangeSetEntry> {
        self.discarded
            .iter()
            .filter_map(|&i| self.entries[i].as_change_set())
    }

    /// Accepted change sets of one component, in document order.
    pub fn change_sets_accepted(&self, component_item_id: &str) -> Vec<&ChangeSetEntry> {
        self.accepted_entries()
            .filter(|cs| cs.component_item_id == component_item_id)
            .collect()
    }

    /// Discarded change sets of one component, in document order.
    pub fn change_sets_discarded(&self, component_item_id: &str) -> Vec<&ChangeSetEntry> {
        self.discarded_entries()
            .filter(|cs| cs.component_item_id == component_item_id)
            .collect()
    }

    /// Every component touched by this report, deduplicated by item id and
    /// ordered by name ascending (unnamed components first, item id as the
    /// tiebreak). Two components sharing a name stay distinct entries.
    pub fn affected_components(&self) -> Vec<ComponentRef> {
        let mut names: HashMap<&str, Option<&str>> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();

        for entry in &self.entries {
            let (item_id, name) = match entry {
                ChangeLogEntry::Component(c) => (c.item_id.as_str(), c.name.as_deref()),
                ChangeLogEntry::ChangeSet(cs) => {
                    (cs.component_item_id.as_str(), cs.component_name.as_deref())
                }
            };
            match names.get_mut(item_id) {
                None => {
                    names.insert(item_id, name);
                    order.push(item_id);
                }
                Some(existing) => {
                    // A later occurrence can fill in a name an earlier one lacked.
                    if existing.is_none() {
                        *existing = name;
                    }
                }
            }
        }

        let mut components: Vec<ComponentRef> = order
            .into_iter()
            .map(|id| ComponentRef::new(id, names[id].map(str::to_string)))
            .collect();
        components.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.item_id.cmp(&b.item_id)));
        components
    }
}
