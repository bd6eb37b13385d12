//! Run-gating condition carried by a configuration.
//!
//! The condition is opaque to rapman: it is deserialized from the `when`
//! key and handed back to the host scheduler untouched. Evaluation against
//! the current branch or event belongs to the host.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Branch/event gate as written under `when`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Matrix axis constraints (`axis -> value`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub matrix: BTreeMap<String, String>,

    /// Keys rapman does not model (`all_branches`, `pull_request`, ...),
    /// carried through verbatim for the host evaluator.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Condition {
    /// True when no constraint is set at all.
    pub fn is_empty(&self) -> bool {
        self.repo.is_none()
            && self.branch.is_none()
            && self.event.is_none()
            && self.owner.is_none()
            && self.matrix.is_empty()
            && self.extra.is_empty()
    }
}
