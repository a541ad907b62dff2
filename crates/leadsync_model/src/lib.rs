//! # leadsync Model
//!
//! Canonical records and shared vocabulary for leadsync.
//!
//! This crate provides:
//! - `Lead` and `Task` canonical records
//! - `LeadStatus` and `TaskStatus` lifecycle enums
//! - The two directional status mapping tables
//! - The back-reference token codec linking tasks to leads
//!
//! This is a pure data crate with no I/O operations. Canonical records are
//! constructed fresh on every fetch and live only for the duration of one
//! reconciliation pass; nothing in this crate persists state.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod mapping;
mod record;
mod status;
mod token;

pub use mapping::{lead_to_task, task_to_lead, LEAD_TO_TASK, TASK_TO_LEAD};
pub use record::{Lead, Task};
pub use status::{LeadStatus, TaskStatus};
pub use token::{embed_lead_id, extract_lead_id, LEAD_ID_MARKER};
