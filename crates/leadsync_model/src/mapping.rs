//! Directional status mapping tables.
//!
//! The two tables are deliberately NOT inverses of each other: `Qualified`
//! and `Lost` both collapse to `Done` going forward, while `Done` expands
//! back only to `Qualified`. Closing a task always means the lead qualified,
//! never that it was lost, and reverse sync can never move a lead to `Lost`.

use crate::status::{LeadStatus, TaskStatus};

/// Forward mapping: lead status to desired task status.
pub const LEAD_TO_TASK: &[(LeadStatus, TaskStatus)] = &[
    (LeadStatus::New, TaskStatus::Todo),
    (LeadStatus::Contacted, TaskStatus::InProgress),
    (LeadStatus::Qualified, TaskStatus::Done),
    (LeadStatus::Lost, TaskStatus::Done),
];

/// Reverse mapping: task status to desired lead status.
///
/// No entry maps to `Lost`.
pub const TASK_TO_LEAD: &[(TaskStatus, LeadStatus)] = &[
    (TaskStatus::Todo, LeadStatus::New),
    (TaskStatus::InProgress, LeadStatus::Contacted),
    (TaskStatus::Done, LeadStatus::Qualified),
];

/// Looks up the desired task status for a lead status.
pub fn lead_to_task(status: LeadStatus) -> Option<TaskStatus> {
    LEAD_TO_TASK
        .iter()
        .find(|(lead, _)| *lead == status)
        .map(|(_, task)| *task)
}

/// Looks up the desired lead status for a task status.
pub fn task_to_lead(status: TaskStatus) -> Option<LeadStatus> {
    TASK_TO_LEAD
        .iter()
        .find(|(task, _)| *task == status)
        .map(|(_, lead)| *lead)
}
