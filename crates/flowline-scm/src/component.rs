//! Component identity and state fingerprinting.
//!
//! Identity is always the item id. Display names are not unique — two
//! components in one workspace may legally share a name — so nothing in this
//! crate keys on names.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identity of a component within a workspace or stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ComponentRef {
    /// Server item id (unique).
    pub item_id: String,
    /// Display name; absent for components whose name is unreadable.
    pub name: Option<String>,
}

impl ComponentRef {
    pub fn new(item_id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            item_id: item_id.into(),
            name,
        }
    }

    /// Name for log lines; falls back to the item id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.item_id)
    }
}

/// A component plus the change-set frontier it currently sits at.
///
/// `state_id` identifies the component's history position; two states with
/// equal `(item_id, state_id)` hold identical content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentState {
    pub item_id: String,
    pub name: Option<String>,
    pub state_id: String,
}

impl ComponentState {
    pub fn new(
        item_id: impl Into<String>,
        name: Option<String>,
        state_id: impl Into<String>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            name,
            state_id: state_id.into(),
        }
    }

    pub fn to_ref(&self) -> ComponentRef {
        ComponentRef {
            item_id: self.item_id.clone(),
            name: self.name.clone(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.item_id)
    }
}

/// Deterministic SHA-256 fingerprint over a component-state set.
///
/// States are sorted by item id before hashing, so the fingerprint is
/// independent of the order the server enumerated them in. Each field is
/// NUL-terminated to keep `("ab", "c")` and `("a", "bc")` distinct.
pub fn state_fingerprint(components: &[ComponentState]) -> String {
    let mut sorted: Vec<&ComponentState> = components.iter().collect();
    sorted.sort_by(|a, b| a.item_id.cmp(&b.item_id));

    let mut hasher = Sha256::new();
    for component in sorted {
        hasher.update(component.item_id.as_bytes());
        hasher.update(b"\0");
        hasher.update(component.state_id.as_bytes());
        hasher.update(b"\0");
    }
    hex::encode(hasher.finalize())
}
