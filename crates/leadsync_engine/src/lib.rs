//! # leadsync Engine
//!
//! Reconciliation engine and REST adapters for leadsync.
//!
//! This crate provides:
//! - Configuration loaded once at startup and passed by reference
//! - Retry with exponential backoff for every remote call
//! - HTTP client abstraction (trait + `ureq` implementation + mock)
//! - Source adapter (paginated lead store)
//! - Sink adapter (status-partitioned task board)
//! - The three-pass reconciliation cycle
//!
//! ## Architecture
//!
//! One cycle is **create, then propagate forward, then propagate reverse**:
//! 1. Ensure every non-terminal lead has a task (idempotent upsert-and-converge)
//! 2. Move tasks whose lead status changed
//! 3. Reflect task movement back onto lead statuses
//!
//! ## Key Invariants
//!
//! - No state survives a cycle; every pass works from a fresh snapshot
//! - Correctness relies on idempotent upserts, not exclusion
//! - A record-level failure never aborts a pass, and a pass-level failure
//!   never aborts the cycle
//! - Reverse sync can never move a lead to `Lost`

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod board;
mod config;
mod error;
mod http;
mod reconcile;
mod retry;
mod source;

pub use board::{MemoryTaskBoard, RestTaskBoard, TaskBoard};
pub use config::{BoardConfig, ConfigError, SourceConfig, SyncConfig};
pub use error::{SyncError, SyncResult};
pub use http::{ApiRequest, ApiResponse, HttpClient, Method, MockHttpClient, RequestBody, UreqClient};
pub use reconcile::{CycleReport, PassOutcome, PassReport, RecordError, SyncService};
pub use retry::{call_with_retry, RetryPolicy};
pub use source::{LeadSource, MemoryLeadSource, RestLeadSource};
