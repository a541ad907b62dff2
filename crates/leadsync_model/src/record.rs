//! Canonical records.
//!
//! Internal representations of external records, independent of either
//! API's wire format.

use crate::status::{LeadStatus, TaskStatus};
use serde::{Deserialize, Serialize};

/// A lead as known to the source system.
///
/// Owned by the source system. The engine treats leads as read-mostly and
/// mutates only `status`, through the source adapter's update operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    /// Source-assigned identifier. Immutable.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Lifecycle status.
    pub status: LeadStatus,
    /// Acquisition channel, when the source records one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Lead {
    /// Creates a lead with no acquisition channel.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        status: LeadStatus,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            status,
            source: None,
        }
    }
}

/// A task as known to the board.
///
/// Owned by the board. `lead_id` is not a first-class field on the remote
/// record; it is recovered from a token embedded in the free-text notes,
/// and is empty when the token is absent or unparsable (the task is then
/// untracked by reconciliation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Board-assigned identifier. Immutable.
    pub id: String,
    /// Card title.
    pub title: String,
    /// Status derived from partition membership.
    pub status: TaskStatus,
    /// Back-reference to the originating lead, or empty.
    #[serde(rename = "leadId")]
    pub lead_id: String,
    /// Free-text notes, including the back-reference token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Task {
    /// Returns true when this task carries a usable back-reference.
    pub fn is_tracked(&self) -> bool {
        !self.lead_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untracked_task_has_empty_lead_id() {
        let task = Task {
            id: "T1".into(),
            title: "Stray card".into(),
            status: TaskStatus::Todo,
            lead_id: String::new(),
            notes: None,
        };
        assert!(!task.is_tracked());
    }

    #[test]
    fn lead_id_serializes_with_wire_name() {
        let task = Task {
            id: "T1".into(),
            title: "Follow up: Ann".into(),
            status: TaskStatus::Done,
            lead_id: "L1".into(),
            notes: None,
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["leadId"], "L1");
        assert_eq!(json["status"], "DONE");
    }
}
