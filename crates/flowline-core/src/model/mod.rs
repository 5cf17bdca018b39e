//! Change report model.
//!
//! Canonical definitions for the entities a parsed change report is made of:
//! - `ChangeLogSet`: root aggregate, one per build
//! - `ChangeSetEntry` / `ComponentEntry`: the two entry kinds
//! - `WorkItemDesc`: tracker links with sanitized summaries
//! - `EditKind`: decoded file-level edit classification

pub mod change_log;
pub mod edit_kind;
pub mod work_item;

// Re-export main types
pub use change_log::{
    ChangeAction, ChangeDesc, ChangeLogEntry, ChangeLogSet, ChangeSetEntry, ComponentEntry,
};
pub use edit_kind::EditKind;
pub use work_item::{sanitize_summary, WorkItemDesc};
