//! Lifecycle status enums for both systems.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a lead in the source system.
///
/// A closed set: `Lost` is terminal and is excluded from forward sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    /// Lead has not been worked yet.
    New,
    /// First contact has been made.
    Contacted,
    /// Lead qualified into an opportunity.
    Qualified,
    /// Lead closed without qualifying. Terminal.
    Lost,
}

impl LeadStatus {
    /// All lead statuses, in lifecycle order.
    pub const ALL: [LeadStatus; 4] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Qualified,
        LeadStatus::Lost,
    ];

    /// Returns true for terminal statuses that never sync forward.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeadStatus::Lost)
    }

    /// Canonical wire name (`NEW`, `CONTACTED`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "NEW",
            LeadStatus::Contacted => "CONTACTED",
            LeadStatus::Qualified => "QUALIFIED",
            LeadStatus::Lost => "LOST",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a task on the board.
///
/// Each value corresponds 1:1 to one physical partition (list) on the board.
/// A task's status IS its partition membership; no stored status field on
/// the remote record is ever trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not started.
    Todo,
    /// Being worked.
    InProgress,
    /// Finished.
    Done,
}

impl TaskStatus {
    /// The three partitions in the fixed order the board is scanned.
    pub const PARTITIONS: [TaskStatus; 3] =
        [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    /// Canonical wire name (`TODO`, `IN_PROGRESS`, `DONE`).
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
